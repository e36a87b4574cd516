use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Child;
use tracing::{debug, trace, warn};

use taskhub_core::{LaunchError, Launched, Launcher, TaskHandle, queue::channel};
use taskhub_model::TaskSpec;

use crate::{
    env::{TASK_ID_ENV, TASK_SPEC_ENV},
    pipe::{spawn_line_reader, spawn_line_writer},
    util::{cmd_program, kill_graceful},
};

/// Command line of the worker executable.
///
/// The child is expected to serve one task over its stdio (see [`crate::serve_stdio`]).
#[derive(Clone, Debug, Default)]
pub struct ProcConfig {
    pub program: String,
    pub args: Vec<String>,
}

impl ProcConfig {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

/// Runs every task in its own child process.
///
/// The child's stdin carries the inbound queue and its stdout the outbound queue, one JSON
/// message per line; stderr is inherited so worker logs reach the parent's terminal. The task
/// id and spec are passed in [`TASK_ID_ENV`] / [`TASK_SPEC_ENV`].
#[derive(Clone, Debug)]
pub struct ProcessLauncher {
    cfg: ProcConfig,
}

impl ProcessLauncher {
    pub fn new(cfg: ProcConfig) -> Self {
        Self { cfg }
    }
}

impl Launcher for ProcessLauncher {
    fn launch(&self, id: &str, spec: &TaskSpec) -> Result<Launched, LaunchError> {
        if self.cfg.program.is_empty() {
            return Err(LaunchError::Spawn("program is empty".into()));
        }
        let spec_json = serde_json::to_string(spec).map_err(|e| LaunchError::Build(e.to_string()))?;

        let mut cmd = cmd_program(&self.cfg.program, &self.cfg.args);
        cmd.env(TASK_ID_ENV, id)
            .env(TASK_SPEC_ENV, spec_json)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());

        trace!(task = id, program = %self.cfg.program, args = ?self.cfg.args, "spawn");
        let mut child = cmd.spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| LaunchError::Spawn("child stdin is not piped".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| LaunchError::Spawn("child stdout is not piped".into()))?;

        let (inbound, to_child) = channel();
        let (from_child, outbound) = channel();
        spawn_line_writer(stdin, to_child, id);
        spawn_line_reader(stdout, from_child, id);

        let pid = child.id();
        debug!(task = id, ?pid, "worker process started");
        Ok(Launched {
            inbound,
            outbound,
            handle: Box::new(ProcessHandle {
                task: id.to_string(),
                pid,
                child,
            }),
        })
    }
}

/// Handle of a worker process.
#[derive(Debug)]
pub struct ProcessHandle {
    task: String,
    pid: Option<u32>,
    child: Child,
}

#[async_trait]
impl TaskHandle for ProcessHandle {
    fn pid(&self) -> Option<u32> {
        self.pid
    }

    fn is_alive(&mut self) -> bool {
        match self.child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                trace!(task = %self.task, %status, "worker process exited");
                false
            }
            Err(e) => {
                warn!(task = %self.task, error = %e, "cannot probe worker process");
                false
            }
        }
    }

    async fn terminate(&mut self) -> std::io::Result<()> {
        kill_graceful(&mut self.child).await
    }
}
