use std::str::FromStr;

use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::logger::error::LoggerError;

/// Stream the human/JSON log layer writes to.
///
/// Task worker processes must log to `Stderr`: their stdout carries the outbound message queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggerWriter {
    Stdout,
    Stderr,
}

impl LoggerWriter {
    pub(crate) fn make(&self) -> BoxMakeWriter {
        match self {
            LoggerWriter::Stdout => BoxMakeWriter::new(std::io::stdout),
            LoggerWriter::Stderr => BoxMakeWriter::new(std::io::stderr),
        }
    }
}

impl FromStr for LoggerWriter {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stdout" => Ok(LoggerWriter::Stdout),
            "stderr" => Ok(LoggerWriter::Stderr),
            _ => Err(LoggerError::InvalidWriter(s.to_string())),
        }
    }
}
