//! How a worker process learns what to run.
//!
//! The launcher passes the task id and its JSON-encoded [`TaskSpec`] through the environment of
//! the child; stdin/stdout stay free for the queues.

use taskhub_model::{TaskId, TaskSpec};

use crate::error::{ExecError, ExecResult};

pub const TASK_ID_ENV: &str = "TASKHUB_TASK_ID";
pub const TASK_SPEC_ENV: &str = "TASKHUB_TASK_SPEC";

/// Read the task id and spec of the current worker process.
pub fn worker_env() -> ExecResult<(TaskId, TaskSpec)> {
    parse_worker_env(
        std::env::var(TASK_ID_ENV).ok(),
        std::env::var(TASK_SPEC_ENV).ok(),
    )
}

pub fn parse_worker_env(id: Option<String>, spec: Option<String>) -> ExecResult<(TaskId, TaskSpec)> {
    let id = id
        .filter(|s| !s.is_empty())
        .ok_or(ExecError::MissingEnv(TASK_ID_ENV))?;
    let spec = spec.ok_or(ExecError::MissingEnv(TASK_SPEC_ENV))?;
    let spec: TaskSpec =
        serde_json::from_str(&spec).map_err(|e| ExecError::InvalidSpec(e.to_string()))?;
    Ok((id, spec))
}
