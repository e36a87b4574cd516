use std::time::Duration;

use tokio::process::{Child, Command};

/// How long a child gets to act on SIGTERM before it is killed.
pub const TERM_GRACE: Duration = Duration::from_millis(500);

pub fn cmd_program(program: &str, args: &[String]) -> Command {
    let mut cmd = Command::new(program);
    cmd.args(args.iter().map(|s| s.as_str()));
    cmd
}

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        /// SIGTERM, wait up to [`TERM_GRACE`], then kill and reap.
        pub async fn kill_graceful(child: &mut Child) -> std::io::Result<()> {
            if let Some(id) = child.id() {
                // SAFETY: plain syscall on a pid we spawned and have not reaped yet.
                unsafe {
                    libc::kill(id as libc::pid_t, libc::SIGTERM);
                }
                if let Ok(Ok(_)) = tokio::time::timeout(TERM_GRACE, child.wait()).await {
                    return Ok(());
                }
            }
            match child.kill().await {
                Ok(()) => Ok(()),
                // already exited between the probe and the kill
                Err(e) if e.kind() == std::io::ErrorKind::InvalidInput => Ok(()),
                Err(e) => Err(e),
            }
        }
    } else {
        pub async fn kill_graceful(child: &mut Child) -> std::io::Result<()> {
            child.kill().await
        }
    }
}
