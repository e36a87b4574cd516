use serde::{Deserialize, Serialize};

/// Lifecycle state of a runner.
///
/// `Running` always implies the runner is also active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum State {
    /// Never opened.
    Inactive,
    /// Opened, the run loop has not started yet.
    Active,
    /// Run loop in progress.
    Running,
    /// Still open, the run loop was stopped and may be started again.
    Stopped,
    /// Closed after having been open.
    Closed,
}

impl State {
    /// Returns `true` while the runner is open.
    pub fn is_active(&self) -> bool {
        matches!(self, State::Active | State::Running | State::Stopped)
    }
}

/// Which side of the hub/task pair produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Component {
    Hub,
    Task,
}

impl Component {
    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Hub => "hub",
            Component::Task => "task",
        }
    }
}
