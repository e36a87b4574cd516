//! # Lifecycle state machine shared by the hub and its tasks.
//!
//! ```text
//! inactive ──open()──► active ──run()──► running ──stop()──► stopped ──close()──► closed
//!                        ▲                                      │
//!                        └─────────────── run() ◄───────────────┘
//! ```
//!
//! Implementors supply the per-cycle [`Runner::io`] and may hook [`Runner::on_open`] /
//! [`Runner::on_close`]. Activation and running are controlled independently: `stop()` never
//! closes, `close()` never stops.
//!
//! ## Run loop
//! - calls `io()` once per cycle while the runner is both running and active;
//! - recoverable errors are logged and the loop continues;
//! - a fatal error ([`CoreError::is_fatal`]) ends the loop with [`EXIT_FATAL`];
//! - between cycles it sleeps the clamped pause, waking early when stopped.

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, trace, warn};

use taskhub_model::Status;

use crate::{
    error::CoreError,
    lifecycle::Lifecycle,
    trace::{TraceAction, record},
};

/// Status of a run loop that ended because it was stopped or closed.
pub const EXIT_OK: i32 = 0;
/// Status of a run loop that ended on a fatal error.
pub const EXIT_FATAL: i32 = 1;

#[async_trait]
pub trait Runner: Send {
    fn lifecycle(&self) -> &Lifecycle;

    fn lifecycle_mut(&mut self) -> &mut Lifecycle;

    /// One cycle of work. Must not block indefinitely.
    async fn io(&mut self) -> Result<(), CoreError>;

    async fn on_open(&mut self) -> Result<(), CoreError> {
        Ok(())
    }

    async fn on_close(&mut self) {}

    /// Called once after the run loop has ended, before `run()` returns.
    async fn on_run_exit(&mut self) {}

    fn status(&self) -> Status {
        self.lifecycle().status()
    }

    fn stop_handle(&self) -> CancellationToken {
        self.lifecycle().stop_handle()
    }

    async fn open(&mut self) -> Result<(), CoreError> {
        if self.lifecycle().is_active() {
            return Err(CoreError::AlreadyOpen);
        }
        self.on_open().await?;
        let lc = self.lifecycle_mut();
        lc.activate();
        record(lc.component(), lc.name(), TraceAction::Open, "");
        Ok(())
    }

    /// Drive `io()` until stopped, closed or a fatal error occurs.
    ///
    /// Returns the loop status ([`EXIT_OK`] or [`EXIT_FATAL`]).
    async fn run(&mut self) -> Result<i32, CoreError> {
        {
            let lc = self.lifecycle();
            if !lc.is_active() {
                return Err(CoreError::NotOpen);
            }
            if lc.is_running() {
                return Err(CoreError::AlreadyRunning);
            }
        }
        let stop = self.lifecycle_mut().begin_run();
        let name = self.lifecycle().name().to_string();
        record(self.lifecycle().component(), &name, TraceAction::Run, "");

        let code = loop {
            if stop.is_cancelled() {
                self.stop();
            }
            if !(self.lifecycle().is_running() && self.lifecycle().is_active()) {
                break EXIT_OK;
            }

            match self.io().await {
                Ok(()) => {}
                Err(e) if e.is_fatal() => {
                    error!(runner = %name, label = e.as_label(), error = %e, "fatal error; leaving run loop");
                    break EXIT_FATAL;
                }
                Err(e) => {
                    warn!(runner = %name, label = e.as_label(), error = %e, "cycle failed");
                }
            }

            let lc = self.lifecycle();
            if lc.is_debug() {
                trace!(runner = %name, state = ?lc.state(), "cycle done");
            }
            if !(lc.is_running() && lc.is_active()) {
                continue;
            }
            let pause = lc.sleep();
            tokio::select! {
                _ = tokio::time::sleep(pause) => {}
                _ = stop.cancelled() => {}
            }
        };

        self.on_run_exit().await;
        Ok(code)
    }

    /// Leave the run loop at the next cycle boundary. Idempotent; does not close.
    fn stop(&mut self) {
        let lc = self.lifecycle_mut();
        if lc.halt() {
            record(lc.component(), lc.name(), TraceAction::Stop, "");
        }
    }

    /// Run `on_close` and deactivate. Idempotent; does not stop.
    async fn close(&mut self) {
        if !self.lifecycle().is_active() {
            return;
        }
        self.on_close().await;
        let lc = self.lifecycle_mut();
        lc.deactivate();
        record(lc.component(), lc.name(), TraceAction::Close, "");
    }

    /// `stop()` followed by `close()`.
    async fn shutdown(&mut self) {
        self.stop();
        self.close().await;
    }
}

/// Entry point of a runner that owns its process (or its runtime task):
/// `open()`, `run()`, then `shutdown()` no matter how the first two ended.
pub async fn run_to_completion<R: Runner + ?Sized>(runner: &mut R) -> i32 {
    let code = match runner.open().await {
        Ok(()) => match runner.run().await {
            Ok(code) => code,
            Err(e) => {
                error!(runner = runner.lifecycle().name(), error = %e, "run failed");
                EXIT_FATAL
            }
        },
        Err(e) => {
            error!(runner = runner.lifecycle().name(), error = %e, "open failed");
            EXIT_FATAL
        }
    };
    runner.shutdown().await;
    code
}

/// Detach a runner onto a runtime worker of the current process (debug / in-process use).
pub fn spawn_threaded<R: Runner + 'static>(mut runner: R) -> JoinHandle<i32> {
    runner.lifecycle_mut().set_threaded(true);
    tokio::spawn(async move { run_to_completion(&mut runner).await })
}
