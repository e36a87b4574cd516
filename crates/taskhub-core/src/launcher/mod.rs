//! Where tasks run.
//!
//! A [`Launcher`] turns `(id, spec)` into a running task reachable through a queue pair, plus a
//! [`TaskHandle`] the hub uses to observe and, as a last resort, terminate it. The process
//! launcher lives in the exec crate; [`LocalLauncher`] runs tasks on the current runtime.

mod local;
pub use local::{LocalHandle, LocalLauncher};

use async_trait::async_trait;

use taskhub_model::TaskSpec;

use crate::{
    error::LaunchError,
    queue::{Receiver, Sender},
};

/// Liveness and termination of one launched task.
#[async_trait]
pub trait TaskHandle: Send {
    /// OS process id, if the task runs in its own process.
    fn pid(&self) -> Option<u32>;

    /// Non-blocking liveness probe.
    fn is_alive(&mut self) -> bool;

    /// Forcefully end the task and wait until it is gone.
    async fn terminate(&mut self) -> std::io::Result<()>;
}

/// Hub-side ends of a freshly launched task.
pub struct Launched {
    /// Hub → task.
    pub inbound: Sender,
    /// Task → hub.
    pub outbound: Receiver,
    pub handle: Box<dyn TaskHandle>,
}

pub trait Launcher: Send + Sync {
    fn launch(&self, id: &str, spec: &TaskSpec) -> Result<Launched, LaunchError>;
}
