//! Wire-level and data types shared by the hub, its tasks and the observability layer.
//!
//! Nothing in this crate performs IO; it only describes what travels over a task queue
//! (`Message`), how a task is described at launch (`TaskSpec`) and what a runner reports
//! about itself (`Status`).

mod domain;
pub use domain::*;

mod error;
pub use error::MessageError;

/// `tracing` target used for structured lifecycle and task-control records.
///
/// Log sinks that want only the trace records filter on this target.
pub const TRACE_TARGET: &str = "taskhub::trace";
