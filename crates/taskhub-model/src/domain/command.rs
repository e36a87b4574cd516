use std::fmt;

/// Reply payload sent back before a runner shuts down on `exit`.
pub const REPLY_EXITING: &str = "exiting";

/// Error tag for messages nobody knows how to handle.
pub const ERROR_UNHANDLED: &str = "unhandled-message";

/// Command carried in the `c` field of a request.
///
/// The reserved set is closed: `exit`, `status` and `debug` are answered by the runtime itself,
/// anything else is handed to the application.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Command {
    /// Ask the receiver to reply `exiting` and shut down.
    Exit,
    /// Ask the receiver for a status snapshot.
    Status,
    /// Toggle per-cycle debug tracing on the receiver.
    Debug,
    /// Application-defined command.
    App(String),
}

impl Command {
    pub fn parse(name: &str) -> Self {
        match name {
            "exit" => Command::Exit,
            "status" => Command::Status,
            "debug" => Command::Debug,
            other => Command::App(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Command::Exit => "exit",
            Command::Status => "status",
            Command::Debug => "debug",
            Command::App(name) => name,
        }
    }

    /// Returns `true` for commands answered by the runtime rather than the application.
    #[inline]
    pub fn is_reserved(&self) -> bool {
        !matches!(self, Command::App(_))
    }
}

impl From<&str> for Command {
    fn from(name: &str) -> Self {
        Command::parse(name)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
