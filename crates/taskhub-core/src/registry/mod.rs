use std::{collections::HashMap, fmt, sync::Arc};

use tracing::{instrument, trace};

use taskhub_model::TaskSpec;

use crate::{
    config::RunnerConfig,
    error::LaunchError,
    queue::{Receiver, Sender},
    task::{Behavior, Task},
};

/// Constructor of a task's behavior from its launch spec.
pub type TaskBuilder = Arc<dyn Fn(&TaskSpec) -> anyhow::Result<Box<dyn Behavior>> + Send + Sync>;

/// Explicit map from task kind to builder.
///
/// Owned by the application and handed to whichever side builds tasks: the in-process launcher
/// or the worker entry point of a child process.
#[derive(Default, Clone)]
pub struct TaskRegistry {
    builders: HashMap<String, TaskBuilder>,
}

impl TaskRegistry {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `builder` under `kind`, replacing any previous one.
    pub fn register<F>(&mut self, kind: impl Into<String>, builder: F)
    where
        F: Fn(&TaskSpec) -> anyhow::Result<Box<dyn Behavior>> + Send + Sync + 'static,
    {
        self.builders.insert(kind.into(), Arc::new(builder));
    }

    #[inline]
    pub fn with<F>(mut self, kind: impl Into<String>, builder: F) -> Self
    where
        F: Fn(&TaskSpec) -> anyhow::Result<Box<dyn Behavior>> + Send + Sync + 'static,
    {
        self.register(kind, builder);
        self
    }

    /// Registered kinds, sorted.
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<_> = self.builders.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    #[instrument(level = "trace", skip(self, spec), fields(kind = %spec.kind))]
    pub fn build(&self, spec: &TaskSpec) -> Result<Box<dyn Behavior>, LaunchError> {
        let builder = self
            .builders
            .get(&spec.kind)
            .ok_or_else(|| LaunchError::UnknownKind(spec.kind.clone()))?;

        let behavior = builder(spec).map_err(|e| LaunchError::Build(format!("{e:#}")))?;
        trace!("task behavior built");
        Ok(behavior)
    }

    /// Build a complete [`Task`] wired to the given queue ends.
    pub fn build_task(
        &self,
        id: &str,
        spec: &TaskSpec,
        inbound: Receiver,
        outbound: Sender,
        cfg: &RunnerConfig,
    ) -> Result<Task, LaunchError> {
        let behavior = self.build(spec)?;
        Ok(Task::new(id, behavior, inbound, outbound, cfg))
    }
}

impl fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}
