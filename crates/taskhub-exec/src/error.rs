use thiserror::Error;

use taskhub_core::LaunchError;

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),
    #[error("invalid task spec: {0}")]
    InvalidSpec(String),
    #[error(transparent)]
    Launch(#[from] LaunchError),
    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ExecError {
    fn from(e: std::io::Error) -> Self {
        ExecError::Io(e.to_string())
    }
}

pub type ExecResult<T> = Result<T, ExecError>;
