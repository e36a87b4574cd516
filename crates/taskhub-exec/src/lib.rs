mod error;
pub use error::{ExecError, ExecResult};

pub mod env;
pub use env::{TASK_ID_ENV, TASK_SPEC_ENV, worker_env};

pub mod pipe;

#[cfg(feature = "proc")]
pub mod proc;
#[cfg(feature = "proc")]
pub use proc::{ProcConfig, ProcessHandle, ProcessLauncher};

#[cfg(feature = "proc")]
mod util;

pub mod worker;
pub use worker::{serve, serve_stdio};

pub mod prelude {
    #[cfg(feature = "proc")]
    pub use crate::{ProcConfig, ProcessLauncher};
    pub use crate::error::{ExecError, ExecResult};
    pub use crate::serve_stdio;
}
