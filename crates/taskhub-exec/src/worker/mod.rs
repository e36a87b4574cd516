use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

use taskhub_core::{RunnerConfig, TaskRegistry, queue::channel, run_to_completion};
use taskhub_model::{TaskId, TaskSpec};

use crate::{
    env::worker_env,
    error::ExecResult,
    pipe::{spawn_line_reader, spawn_line_writer},
};

/// Upper bound for flushing the last replies after the task has shut down.
pub const FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// Child-process entry point: serve the task described by the environment over stdin/stdout.
///
/// Returns the run loop status. The caller should exit the process with it right away; the
/// stdin reader may still be parked on a blocking read.
pub async fn serve_stdio(registry: &TaskRegistry, runner: &RunnerConfig) -> ExecResult<i32> {
    let (id, spec) = worker_env()?;
    serve(id, spec, registry, runner, tokio::io::stdin(), tokio::io::stdout()).await
}

/// Build the task for `spec` and run it to completion over the given byte streams.
pub async fn serve<R, W>(
    id: TaskId,
    spec: TaskSpec,
    registry: &TaskRegistry,
    runner: &RunnerConfig,
    reader: R,
    writer: W,
) -> ExecResult<i32>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (to_task, inbound) = channel();
    let (outbound, from_task) = channel();

    let mut task = registry.build_task(&id, &spec, inbound, outbound, runner)?;
    let reader = spawn_line_reader(reader, to_task, &id);
    let writer = spawn_line_writer(writer, from_task, &id);

    info!(task = %id, kind = %spec.kind, "worker started");
    let code = run_to_completion(&mut task).await;
    drop(task);

    match tokio::time::timeout(FLUSH_TIMEOUT, writer).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(task = %id, error = %e, "writer task failed"),
        Err(_) => warn!(task = %id, "timed out flushing replies"),
    }
    reader.abort();
    debug!(task = %id, code, "worker finished");
    Ok(code)
}
