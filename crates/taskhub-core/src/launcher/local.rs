use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::debug;

use taskhub_model::TaskSpec;

use crate::{
    config::RunnerConfig,
    error::LaunchError,
    launcher::{Launched, Launcher, TaskHandle},
    queue::channel,
    registry::TaskRegistry,
    runner::spawn_threaded,
};

/// Runs every task as a tokio task of the current process over in-memory queues.
///
/// Meant for debugging and tests: tasks share the hub's address space, report `threaded` in
/// their status and are terminated by aborting their tokio task.
#[derive(Debug, Clone)]
pub struct LocalLauncher {
    registry: Arc<TaskRegistry>,
    runner: RunnerConfig,
}

impl LocalLauncher {
    pub fn new(registry: Arc<TaskRegistry>) -> Self {
        Self {
            registry,
            runner: RunnerConfig::default(),
        }
    }

    /// Loop timing of the launched tasks.
    pub fn with_runner(mut self, runner: RunnerConfig) -> Self {
        self.runner = runner;
        self
    }
}

impl Launcher for LocalLauncher {
    fn launch(&self, id: &str, spec: &TaskSpec) -> Result<Launched, LaunchError> {
        let (inbound, task_in) = channel();
        let (task_out, outbound) = channel();

        let task = self
            .registry
            .build_task(id, spec, task_in, task_out, &self.runner)?;
        let join = spawn_threaded(task);
        debug!(task = id, kind = %spec.kind, "in-process task spawned");

        Ok(Launched {
            inbound,
            outbound,
            handle: Box::new(LocalHandle { join }),
        })
    }
}

/// Handle of an in-process task.
#[derive(Debug)]
pub struct LocalHandle {
    join: JoinHandle<i32>,
}

#[async_trait]
impl TaskHandle for LocalHandle {
    fn pid(&self) -> Option<u32> {
        None
    }

    fn is_alive(&mut self) -> bool {
        !self.join.is_finished()
    }

    async fn terminate(&mut self) -> std::io::Result<()> {
        self.join.abort();
        // cancelled or finished; either way it is gone
        let _ = (&mut self.join).await;
        Ok(())
    }
}
