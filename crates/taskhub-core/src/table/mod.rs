use std::{collections::HashMap, time::SystemTime};

use taskhub_model::{Message, TaskId, TaskSpec};

use crate::{
    error::{CoreError, QueueError},
    launcher::{Launched, TaskHandle},
    queue::{Receiver, Sender},
};

/// Hub-side view of one launched task.
pub struct TaskRecord {
    id: TaskId,
    spec: TaskSpec,
    inbound: Sender,
    outbound: Receiver,
    handle: Box<dyn TaskHandle>,
    pid: Option<u32>,
    launched_at: SystemTime,
    outbound_closed: bool,
}

impl TaskRecord {
    pub fn new(id: impl Into<TaskId>, spec: TaskSpec, launched: Launched) -> Self {
        let pid = launched.handle.pid();
        Self {
            id: id.into(),
            spec,
            inbound: launched.inbound,
            outbound: launched.outbound,
            handle: launched.handle,
            pid,
            launched_at: SystemTime::now(),
            outbound_closed: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn spec(&self) -> &TaskSpec {
        &self.spec
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn launched_at(&self) -> SystemTime {
        self.launched_at
    }

    /// Push a message to the task.
    pub fn send(&self, msg: Message) -> Result<(), QueueError> {
        self.inbound.push(msg)
    }

    pub(crate) fn outbound_mut(&mut self) -> &mut Receiver {
        &mut self.outbound
    }

    pub(crate) fn handle_mut(&mut self) -> &mut dyn TaskHandle {
        self.handle.as_mut()
    }

    /// Returns `true` the first time the outbound queue is seen closed.
    pub(crate) fn mark_outbound_closed(&mut self) -> bool {
        !std::mem::replace(&mut self.outbound_closed, true)
    }
}

/// Registered tasks of one hub, kept in registration order.
#[derive(Default)]
pub struct TaskTable {
    /// Records indexed by task id.
    tasks: HashMap<TaskId, TaskRecord>,
    /// Ids in registration order; drives round-robin draining.
    order: Vec<TaskId>,
}

impl TaskTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new record; fails if the id is already taken.
    pub fn insert(&mut self, record: TaskRecord) -> Result<(), CoreError> {
        if self.tasks.contains_key(record.id()) {
            return Err(CoreError::DuplicateTask(record.id.clone()));
        }
        self.order.push(record.id.clone());
        self.tasks.insert(record.id.clone(), record);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&TaskRecord> {
        self.tasks.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut TaskRecord> {
        self.tasks.get_mut(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<TaskRecord> {
        let record = self.tasks.remove(id)?;
        self.order.retain(|t| t != id);
        Some(record)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tasks.contains_key(id)
    }

    /// Ids in registration order.
    pub fn ids(&self) -> &[TaskId] {
        &self.order
    }

    /// Records in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &TaskRecord> {
        self.order.iter().filter_map(|id| self.tasks.get(id))
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Remove every record, in registration order.
    pub fn drain(&mut self) -> Vec<TaskRecord> {
        let order = std::mem::take(&mut self.order);
        order
            .into_iter()
            .filter_map(|id| self.tasks.remove(&id))
            .collect()
    }
}
