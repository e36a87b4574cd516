//! # Hub: owner of the task table.
//!
//! The hub launches tasks, forwards messages to them and drains their replies in its own run
//! loop. Every cycle visits the tasks in registration order and takes at most [`DRAIN_LIMIT`]
//! messages from each, so one chatty task cannot starve the others; the rest waits for the
//! next cycle.
//!
//! ## Exit sequence (`taskexit`)
//! ```text
//! push {c:"exit"} ─► discard pending outbound ─► yield
//!      └─► poll liveness ≤ 9 × 250 ms ─► still alive? terminate ─► remove record
//! ```
//! The record is removed whether or not the task cooperated.

mod handler;
pub use handler::{LogMessages, OnMessage};

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, error, info, warn};

use taskhub_model::{AutoLaunch, Command, Component, Message, REPLY_EXITING, Status, TaskId, TaskSpec};

use crate::{
    config::HubConfig,
    error::CoreError,
    launcher::Launcher,
    lifecycle::Lifecycle,
    runner::Runner,
    table::{TaskRecord, TaskTable},
    trace::{TraceAction, record},
};

/// Name the hub reports in its status and trace records.
pub const HUB_NAME: &str = "hub";
/// Maximum number of messages taken from one task per cycle.
pub const DRAIN_LIMIT: usize = 32;
/// Liveness polls after an exit request before the task is terminated.
pub const EXIT_POLLS: u32 = 9;
pub const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(250);

pub struct Hub {
    lc: Lifecycle,
    launcher: Arc<dyn Launcher>,
    autolaunch: Vec<AutoLaunch>,
    table: TaskTable,
    handler: Box<dyn OnMessage>,
}

impl Hub {
    pub fn new(cfg: HubConfig, launcher: Arc<dyn Launcher>) -> Self {
        Self {
            lc: Lifecycle::new(HUB_NAME, Component::Hub, &cfg.runner),
            launcher,
            autolaunch: cfg.tasks,
            table: TaskTable::new(),
            handler: Box::new(LogMessages),
        }
    }

    /// Replace the handler that receives task messages.
    pub fn with_handler<H: OnMessage + 'static>(mut self, handler: H) -> Self {
        self.handler = Box::new(handler);
        self
    }

    /// Registered task ids, in registration order.
    pub fn tasks(&self) -> &[TaskId] {
        self.table.ids()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.table.contains(id)
    }

    pub fn task(&self, id: &str) -> Option<&TaskRecord> {
        self.table.get(id)
    }

    pub fn is_alive(&mut self, id: &str) -> Result<bool, CoreError> {
        let rec = self
            .table
            .get_mut(id)
            .ok_or_else(|| CoreError::UnknownTask(id.to_string()))?;
        Ok(rec.handle_mut().is_alive())
    }

    /// Launch a task and register it under `id`.
    pub fn tasklaunch(&mut self, id: impl Into<TaskId>, spec: TaskSpec) -> Result<(), CoreError> {
        let id = id.into();
        if self.table.contains(&id) {
            return Err(CoreError::DuplicateTask(id));
        }

        let launched = self.launcher.launch(&id, &spec)?;
        let rec = TaskRecord::new(id.clone(), spec, launched);
        info!(task = %id, kind = %rec.spec().kind, pid = ?rec.pid(), "task launched");
        record(Component::Hub, self.lc.name(), TraceAction::TaskLaunched, &id);
        self.table.insert(rec)
    }

    /// Queue a message for one task.
    pub fn put(&self, id: &str, msg: Message) -> Result<(), CoreError> {
        let rec = self
            .table
            .get(id)
            .ok_or_else(|| CoreError::UnknownTask(id.to_string()))?;
        rec.send(msg)?;
        record(Component::Hub, self.lc.name(), TraceAction::TaskPut, id);
        Ok(())
    }

    /// Queue a copy of `msg` for every task. Returns how many tasks accepted it.
    pub fn broadcast(&self, msg: &Message) -> usize {
        self.table
            .iter()
            .filter(|rec| match rec.send(msg.clone()) {
                Ok(()) => true,
                Err(e) => {
                    debug!(task = rec.id(), error = %e, "broadcast not delivered");
                    false
                }
            })
            .count()
    }

    /// Ask a task to exit, terminate it if it does not, and forget it.
    pub async fn taskexit(&mut self, id: &str) -> Result<(), CoreError> {
        let rec = self
            .table
            .get_mut(id)
            .ok_or_else(|| CoreError::UnknownTask(id.to_string()))?;

        if let Err(e) = rec.send(Message::request(Command::Exit.as_str())) {
            debug!(task = id, error = %e, "exit request not delivered");
        }
        let dropped = rec.outbound_mut().discard_ready();
        if dropped > 0 {
            debug!(task = id, dropped, "discarded pending task messages");
        }
        tokio::task::yield_now().await;

        let pid = rec.pid();
        let launched_at = rec.launched_at();
        let handle = rec.handle_mut();
        let mut alive = handle.is_alive();
        let mut polls = 0;
        while alive && polls < EXIT_POLLS {
            tokio::time::sleep(EXIT_POLL_INTERVAL).await;
            polls += 1;
            alive = handle.is_alive();
        }

        if alive {
            warn!(task = id, ?pid, "task did not exit in time; terminating");
            if let Err(e) = handle.terminate().await {
                error!(task = id, ?pid, error = %e, "failed to terminate task");
            }
            record(Component::Hub, self.lc.name(), TraceAction::TaskKilled, id);
        }

        self.table.remove(id);
        let uptime_ms = launched_at.elapsed().unwrap_or_default().as_millis() as u64;
        debug!(task = id, ?pid, uptime_ms, killed = alive, "task removed");
        record(Component::Hub, self.lc.name(), TraceAction::TaskExited, id);
        Ok(())
    }

    /// Exit every task, then stop and close the hub.
    pub async fn exit(&mut self) {
        for id in self.table.ids().to_vec() {
            if let Err(e) = self.taskexit(&id).await {
                warn!(task = %id, error = %e, "taskexit failed");
            }
        }
        self.stop();
        self.close().await;
    }

    /// Push an exit request to every remaining task and drop the records without waiting.
    fn sweep(&mut self) {
        for rec in self.table.drain() {
            if let Err(e) = rec.send(Message::request(Command::Exit.as_str())) {
                debug!(task = rec.id(), error = %e, "exit request not delivered");
            }
        }
    }
}

#[async_trait]
impl Runner for Hub {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lc
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lc
    }

    async fn io(&mut self) -> Result<(), CoreError> {
        let mut exits = Vec::new();
        let mut status_requests = Vec::new();

        for id in self.table.ids().to_vec() {
            let Some(rec) = self.table.get_mut(&id) else {
                continue;
            };

            for _ in 0..DRAIN_LIMIT {
                let msg = match rec.outbound_mut().try_pop() {
                    Ok(Some(msg)) => msg,
                    Ok(None) => break,
                    Err(_) => {
                        if rec.mark_outbound_closed() {
                            warn!(task = %id, "task outbound queue closed");
                        }
                        break;
                    }
                };

                if msg.is_request() {
                    match msg.command() {
                        Some(Command::Exit) => {
                            if let Err(e) = rec.send(msg.into_reply(REPLY_EXITING)) {
                                debug!(task = %id, error = %e, "exit reply not delivered");
                            }
                            record(Component::Hub, self.lc.name(), TraceAction::TaskExitRequested, &id);
                            exits.push(id.clone());
                            break;
                        }
                        Some(Command::Status) => {
                            status_requests.push((id.clone(), msg));
                            continue;
                        }
                        Some(Command::Debug) => {
                            let on = self.lc.toggle_debug();
                            record(
                                Component::Hub,
                                self.lc.name(),
                                TraceAction::DebugToggled,
                                if on { "on" } else { "off" },
                            );
                            if let Err(e) = rec.send(msg.into_reply(json!({ "debug": on }))) {
                                debug!(task = %id, error = %e, "debug reply not delivered");
                            }
                            continue;
                        }
                        _ => {}
                    }
                }

                self.handler.on_message(rec, msg);
            }
        }

        if !status_requests.is_empty() {
            let status = self.status().to_value()?;
            for (id, msg) in status_requests {
                if let Some(rec) = self.table.get(&id)
                    && let Err(e) = rec.send(msg.into_reply(status.clone()))
                {
                    debug!(task = %id, error = %e, "status reply not delivered");
                }
            }
        }

        for id in exits {
            self.taskexit(&id).await?;
        }
        Ok(())
    }

    async fn on_open(&mut self) -> Result<(), CoreError> {
        for entry in self.autolaunch.clone() {
            if let Err(e) = self.tasklaunch(entry.id.clone(), entry.spec) {
                error!(task = %entry.id, error = %e, "auto-launch failed");
                self.sweep();
                return Err(e);
            }
        }
        Ok(())
    }

    async fn on_close(&mut self) {
        if !self.table.is_empty() {
            debug!(tasks = self.table.len(), "closing hub with tasks still registered");
            self.sweep();
        }
    }

    async fn on_run_exit(&mut self) {
        self.exit().await;
    }

    fn status(&self) -> Status {
        let mut status = self.lc.status();
        status.tasks = self.table.ids().to_vec();
        status
    }
}

impl Drop for Hub {
    fn drop(&mut self) {
        self.sweep();
    }
}
