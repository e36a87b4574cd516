//! Structured lifecycle and task-control records.
//!
//! Every record is one `tracing` event on [`TRACE_TARGET`] carrying `pid`, `process`,
//! `component`, `action` and free-form `detail`. The timestamp comes from the subscriber.
//! Sinks are configured by the observability layer; the core never reads records back.

use taskhub_model::{Component, TRACE_TARGET};
use tracing::{Level, debug, info, warn};

use crate::system::pid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceAction {
    // lifecycle
    Open,
    Run,
    Stop,
    Close,
    DebugToggled,

    // task control
    TaskLaunched,
    TaskExitRequested,
    TaskExited,
    TaskKilled,
    TaskPut,
}

impl TraceAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TraceAction::Open => "open",
            TraceAction::Run => "run",
            TraceAction::Stop => "stop",
            TraceAction::Close => "close",
            TraceAction::DebugToggled => "debug",
            TraceAction::TaskLaunched => "tasklaunch",
            TraceAction::TaskExitRequested => "taskexit-request",
            TraceAction::TaskExited => "taskexit",
            TraceAction::TaskKilled => "taskkill",
            TraceAction::TaskPut => "put",
        }
    }

    /// Log level of the record: lifecycle chatter is `debug`, task control is `info`,
    /// forced termination is `warn`.
    pub fn level(&self) -> Level {
        match self {
            TraceAction::TaskKilled => Level::WARN,
            TraceAction::TaskLaunched | TraceAction::TaskExitRequested | TraceAction::TaskExited => {
                Level::INFO
            }
            _ => Level::DEBUG,
        }
    }
}

#[inline]
pub fn message_for(action: TraceAction) -> &'static str {
    match action {
        TraceAction::Open => "runner opened",
        TraceAction::Run => "run loop started",
        TraceAction::Stop => "run loop stopped",
        TraceAction::Close => "runner closed",
        TraceAction::DebugToggled => "debug tracing toggled",

        TraceAction::TaskLaunched => "task launched",
        TraceAction::TaskExitRequested => "exit requested from task",
        TraceAction::TaskExited => "task removed after exit",
        TraceAction::TaskKilled => "task did not exit in time; terminated",
        TraceAction::TaskPut => "message queued for task",
    }
}

/// Emit one trace record.
pub fn record(component: Component, process: &str, action: TraceAction, detail: &str) {
    let component = component.as_str();
    let pid = pid();
    let msg = message_for(action);
    let level = action.level();
    if level == Level::WARN {
        warn!(target: TRACE_TARGET, pid, process, component, action = action.as_str(), detail, "{msg}");
    } else if level == Level::INFO {
        info!(target: TRACE_TARGET, pid, process, component, action = action.as_str(), detail, "{msg}");
    } else {
        debug!(target: TRACE_TARGET, pid, process, component, action = action.as_str(), detail, "{msg}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_names_are_unique() {
        let all = [
            TraceAction::Open,
            TraceAction::Run,
            TraceAction::Stop,
            TraceAction::Close,
            TraceAction::DebugToggled,
            TraceAction::TaskLaunched,
            TraceAction::TaskExitRequested,
            TraceAction::TaskExited,
            TraceAction::TaskKilled,
            TraceAction::TaskPut,
        ];
        let mut names: Vec<_> = all.iter().map(TraceAction::as_str).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), all.len());
    }

    #[test]
    fn kill_is_louder_than_lifecycle() {
        assert_eq!(TraceAction::TaskKilled.level(), Level::WARN);
        assert_eq!(TraceAction::TaskLaunched.level(), Level::INFO);
        assert_eq!(TraceAction::Open.level(), Level::DEBUG);
    }

    #[test]
    fn record_without_subscriber_is_harmless() {
        record(Component::Hub, "hub", TraceAction::Open, "");
    }
}
