use std::time::Duration;

use serde::{Deserialize, Serialize};

use taskhub_model::AutoLaunch;

/// Timing of a runner's `io()` loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Pause between two `io()` cycles.
    pub sleep_ms: u64,
    /// Lower bound for the pause; smaller values are clamped up.
    pub min_sleep_ms: u64,
    /// Upper bound for the pause; larger values are clamped down.
    pub max_sleep_ms: u64,
}

impl RunnerConfig {
    /// Bounds of the sleep range. An inverted range collapses onto `min`.
    pub fn sleep_bounds(&self) -> (Duration, Duration) {
        let min = Duration::from_millis(self.min_sleep_ms);
        let max = Duration::from_millis(self.max_sleep_ms.max(self.min_sleep_ms));
        (min, max)
    }

    pub fn sleep(&self) -> Duration {
        Duration::from_millis(self.sleep_ms)
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            sleep_ms: 100,
            min_sleep_ms: 0,
            max_sleep_ms: 10_000,
        }
    }
}

/// Hub configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    pub runner: RunnerConfig,
    /// Tasks launched by `Hub::open()`, in this order.
    pub tasks: Vec<AutoLaunch>,
}
