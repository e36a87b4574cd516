use std::{fs::OpenOptions, path::Path, sync::Mutex};

use taskhub_model::TRACE_TARGET;
use time::{UtcOffset, format_description::well_known::Rfc3339};
use tracing::{Level, Subscriber};
use tracing_subscriber::{
    EnvFilter, Layer, Registry, filter::Targets, fmt, fmt::time::OffsetTime,
    layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::logger::{config::LoggerConfig, error::LoggerError};

type TraceLayer = Box<dyn Layer<Registry> + Send + Sync>;

pub struct Logger;

impl Logger {
    pub fn text(cfg: &LoggerConfig) -> Result<(), LoggerError> {
        let filter = mk_filter(&cfg.level)?;
        let trace = mk_trace_layer(cfg.trace_file.as_deref())?;
        let fmt_layer = fmt::layer()
            .with_ansi(cfg.use_color)
            .with_target(cfg.with_targets)
            .with_timer(mk_timer())
            .with_writer(cfg.writer.make())
            .with_filter(filter);

        let subscriber = tracing_subscriber::registry().with(trace).with(fmt_layer);
        init_with(subscriber)
    }

    pub fn json(cfg: &LoggerConfig) -> Result<(), LoggerError> {
        let filter = mk_filter(&cfg.level)?;
        let trace = mk_trace_layer(cfg.trace_file.as_deref())?;
        let fmt_layer = fmt::layer()
            .json()
            .with_ansi(false)
            .with_target(cfg.with_targets)
            .with_timer(mk_timer())
            .with_writer(cfg.writer.make())
            .with_filter(filter);

        let subscriber = tracing_subscriber::registry().with(trace).with(fmt_layer);
        init_with(subscriber)
    }

    pub fn journald(cfg: &LoggerConfig) -> Result<(), LoggerError> {
        let filter = mk_filter(&cfg.level)?;
        let trace = mk_trace_layer(cfg.trace_file.as_deref())?;
        mk_journald(filter, trace)
    }
}

fn mk_filter(level: &str) -> Result<EnvFilter, LoggerError> {
    EnvFilter::try_new(level).map_err(|_| LoggerError::InvalidLogLevel(level.to_string()))
}

fn mk_timer() -> OffsetTime<Rfc3339> {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetTime::new(offset, Rfc3339)
}

/// JSON layer that accepts only trace records and appends them to `path`.
fn mk_trace_layer(path: Option<&Path>) -> Result<Option<TraceLayer>, LoggerError> {
    let Some(path) = path else {
        return Ok(None);
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| LoggerError::TraceSink {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

    let layer = fmt::layer()
        .json()
        .with_ansi(false)
        .with_target(true)
        .with_timer(mk_timer())
        .with_writer(Mutex::new(file))
        .with_filter(Targets::new().with_target(TRACE_TARGET, Level::TRACE));
    Ok(Some(Box::new(layer)))
}

fn init_with<S>(subscriber: S) -> Result<(), LoggerError>
where
    S: Subscriber + Send + Sync + 'static,
{
    if tracing::dispatcher::has_been_set() {
        return Err(LoggerError::AlreadyInitialized);
    }
    subscriber
        .try_init()
        .map_err(|e| LoggerError::InitializationFailed(e.to_string()))
}

#[cfg(all(target_os = "linux", feature = "journald"))]
fn mk_journald(filter: EnvFilter, trace: Option<TraceLayer>) -> Result<(), LoggerError> {
    let journald = tracing_journald::layer()
        .map_err(|e| LoggerError::InitializationFailed(format!("journald: {e}")))?;
    let subscriber = tracing_subscriber::registry()
        .with(trace)
        .with(journald.with_filter(filter));
    init_with(subscriber)
}

#[cfg(not(all(target_os = "linux", feature = "journald")))]
fn mk_journald(_filter: EnvFilter, _trace: Option<TraceLayer>) -> Result<(), LoggerError> {
    Err(LoggerError::JournaldNotSupported)
}
