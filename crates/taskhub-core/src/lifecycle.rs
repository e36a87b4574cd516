use std::time::{Duration, SystemTime};

use tokio_util::sync::CancellationToken;

use taskhub_model::{Component, State, Status};

use crate::{config::RunnerConfig, system};

/// Lifecycle bookkeeping shared by every runner.
///
/// Holds the `active`/`running` flags, the run timestamps and the clamped inter-cycle pause.
/// Transitions are driven by the provided methods of [`crate::Runner`]; this type only records
/// them.
#[derive(Debug)]
pub struct Lifecycle {
    name: String,
    component: Component,
    state: State,
    active: bool,
    running: bool,
    threaded: bool,
    debug: bool,
    started_at: Option<SystemTime>,
    stopped_at: Option<SystemTime>,
    sleep: Duration,
    min_sleep: Duration,
    max_sleep: Duration,
    stop: CancellationToken,
}

impl Lifecycle {
    pub fn new(name: impl Into<String>, component: Component, cfg: &RunnerConfig) -> Self {
        let (min_sleep, max_sleep) = cfg.sleep_bounds();
        let mut lc = Self {
            name: name.into(),
            component,
            state: State::Inactive,
            active: false,
            running: false,
            threaded: false,
            debug: false,
            started_at: None,
            stopped_at: None,
            sleep: Duration::ZERO,
            min_sleep,
            max_sleep,
            stop: CancellationToken::new(),
        };
        lc.set_sleep(cfg.sleep());
        lc
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn component(&self) -> Component {
        self.component
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_threaded(&self) -> bool {
        self.threaded
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn started_at(&self) -> Option<SystemTime> {
        self.started_at
    }

    pub fn stopped_at(&self) -> Option<SystemTime> {
        self.stopped_at
    }

    /// Current pause between two `io()` cycles.
    pub fn sleep(&self) -> Duration {
        self.sleep
    }

    pub fn sleep_bounds(&self) -> (Duration, Duration) {
        (self.min_sleep, self.max_sleep)
    }

    /// Set the pause, silently clamped into `[min_sleep, max_sleep]`. Returns the stored value.
    pub fn set_sleep(&mut self, sleep: Duration) -> Duration {
        self.sleep = sleep.clamp(self.min_sleep, self.max_sleep);
        self.sleep
    }

    /// Flip the debug flag and return the new value.
    pub fn toggle_debug(&mut self) -> bool {
        self.debug = !self.debug;
        self.debug
    }

    /// Token that stops the current run loop, or the next one if none is running.
    ///
    /// Cancelling it from outside stops the loop at its next cycle boundary; a cancel issued
    /// before `run()` makes that run return after its first check. Once a loop has been
    /// stopped, later calls hand out a fresh token.
    pub fn stop_handle(&self) -> CancellationToken {
        self.stop.clone()
    }

    pub fn status(&self) -> Status {
        Status {
            name: self.name.clone(),
            component: self.component,
            state: self.state,
            active: self.active,
            running: self.running,
            threaded: self.threaded,
            debug: self.debug,
            started_at: self.started_at,
            stopped_at: self.stopped_at,
            pid: system::pid(),
            host: system::host().to_string(),
            tasks: Vec::new(),
        }
    }

    pub(crate) fn set_threaded(&mut self, threaded: bool) {
        self.threaded = threaded;
    }

    pub(crate) fn activate(&mut self) {
        self.active = true;
        self.state = State::Active;
    }

    pub(crate) fn deactivate(&mut self) {
        self.active = false;
        self.state = State::Closed;
    }

    /// Mark the loop as running; returns the token the loop watches for external stops.
    ///
    /// A token cancelled before the run started is kept, so that run stops right away.
    pub(crate) fn begin_run(&mut self) -> CancellationToken {
        self.running = true;
        self.state = State::Running;
        self.started_at = Some(SystemTime::now());
        self.stop.clone()
    }

    /// Clear the running flag. Returns `false` if the loop was not running.
    pub(crate) fn halt(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.running = false;
        self.stopped_at = Some(SystemTime::now());
        if self.active {
            self.state = State::Stopped;
        }
        let stopped = std::mem::take(&mut self.stop);
        stopped.cancel();
        true
    }
}
