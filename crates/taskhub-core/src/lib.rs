pub mod config;
pub use config::{HubConfig, RunnerConfig};
pub mod error;
pub use error::{CoreError, LaunchError, QueueError};

pub mod hub;
pub use hub::{Hub, OnMessage};
pub mod launcher;
pub use launcher::{Launched, Launcher, LocalLauncher, TaskHandle};
pub mod lifecycle;
pub use lifecycle::Lifecycle;
pub mod queue;
pub mod registry;
pub use registry::{TaskBuilder, TaskRegistry};
pub mod runner;
pub use runner::{EXIT_FATAL, EXIT_OK, Runner, run_to_completion, spawn_threaded};
pub mod system;
pub mod table;
pub use table::{TaskRecord, TaskTable};
pub mod task;
pub use task::{Behavior, Task};
pub mod trace;
