use std::io::IsTerminal;
use std::path::PathBuf;

use crate::logger::{format::LoggerFormat, writer::LoggerWriter};

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    pub level: String,
    pub with_targets: bool,
    pub use_color: bool,
    pub writer: LoggerWriter,
    /// Append-only JSON-lines file receiving only the lifecycle/task-control trace records.
    pub trace_file: Option<PathBuf>,
}

impl LoggerConfig {
    /// Configuration for a task worker process: same as the default, but on stderr without color.
    pub fn worker() -> Self {
        Self {
            writer: LoggerWriter::Stderr,
            use_color: false,
            ..Self::default()
        }
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        let use_color = cfg!(test) || std::io::stdout().is_terminal();
        Self {
            format: LoggerFormat::Text,
            level: "info".to_string(),
            with_targets: true,
            use_color,
            writer: LoggerWriter::Stdout,
            trace_file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_logs_to_stderr() {
        let cfg = LoggerConfig::worker();
        assert_eq!(cfg.writer, LoggerWriter::Stderr);
        assert!(!cfg.use_color);
        assert_eq!(cfg.level, "info");
        assert!(cfg.trace_file.is_none());
    }
}
