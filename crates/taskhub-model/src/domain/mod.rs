mod command;
pub use command::{Command, ERROR_UNHANDLED, REPLY_EXITING};

mod message;
pub use message::{FIELD_COMMAND, FIELD_ERROR, FIELD_REPLY, Message};

mod task_spec;
pub use task_spec::{AutoLaunch, TaskSpec};

mod state;
pub use state::{Component, State};

mod status;
pub use status::Status;

/// Identifier of a task registered with a hub.
///
/// Unique among the tasks currently registered; may be reused once the previous record is gone.
pub type TaskId = String;
