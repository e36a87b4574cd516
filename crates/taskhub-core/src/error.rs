use thiserror::Error;

use taskhub_model::MessageError;

/// Failures of a queue end.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// The other end is gone; nothing will ever arrive (or be read) again.
    #[error("queue closed")]
    Closed,
    #[error("queue operation timed out")]
    Timeout,
}

/// Failures while turning a [`taskhub_model::TaskSpec`] into a running task.
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("no task builder registered for kind '{0}'")]
    UnknownKind(String),
    #[error("task builder failed: {0}")]
    Build(String),
    #[error("spawn failed: {0}")]
    Spawn(String),
}

impl From<std::io::Error> for LaunchError {
    fn from(e: std::io::Error) -> Self {
        LaunchError::Spawn(e.to_string())
    }
}

/// Errors of the runner state machine, the task runtime and the hub.
///
/// Control errors (`AlreadyOpen`, `AlreadyRunning`, `NotOpen`, `DuplicateTask`, `UnknownTask`)
/// go straight back to the caller. Inside a run loop, [`CoreError::is_fatal`] decides whether an
/// error from `io()` ends the loop or is only logged.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("runner is already open")]
    AlreadyOpen,
    #[error("runner is already running")]
    AlreadyRunning,
    #[error("runner is not open")]
    NotOpen,
    #[error("task '{0}' is already registered")]
    DuplicateTask(String),
    #[error("task '{0}' is not registered")]
    UnknownTask(String),
    #[error("launch failed: {0}")]
    Launch(#[from] LaunchError),
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),
    #[error("message error: {0}")]
    Message(#[from] MessageError),
    /// Recoverable cycle failure.
    #[error("cycle failed: {reason}")]
    Fail { reason: String },
    /// The process/queue infrastructure is compromised.
    #[error("fatal error: {reason}")]
    Fatal { reason: String },
}

impl CoreError {
    pub fn fail(reason: impl Into<String>) -> Self {
        CoreError::Fail {
            reason: reason.into(),
        }
    }

    pub fn fatal(reason: impl Into<String>) -> Self {
        CoreError::Fatal {
            reason: reason.into(),
        }
    }

    /// Returns `true` if a run loop must terminate on this error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CoreError::Fatal { .. } | CoreError::Queue(QueueError::Closed))
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            CoreError::AlreadyOpen => "already_open",
            CoreError::AlreadyRunning => "already_running",
            CoreError::NotOpen => "not_open",
            CoreError::DuplicateTask(_) => "duplicate_task",
            CoreError::UnknownTask(_) => "unknown_task",
            CoreError::Launch(_) => "launch_failed",
            CoreError::Queue(_) => "queue_error",
            CoreError::Message(_) => "message_error",
            CoreError::Fail { .. } => "cycle_failed",
            CoreError::Fatal { .. } => "fatal",
        }
    }
}
