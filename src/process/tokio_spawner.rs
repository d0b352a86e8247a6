//! # Spawner backed by `tokio::process`.
//!
//! [`TokioSpawner`] launches real OS processes and supervises each one with a small
//! watcher task that owns the [`tokio::process::Child`]:
//!
//! ```text
//! spawn(id, cfg)
//!   ├─► Command::new(cfg.command).args(..).envs(..).current_dir(..)
//!   ├─► stdout/stderr ──► ReaderStream (byte chunks)   (Stdio::Pipe only)
//!   └─► tokio::spawn(watch(child, control))
//!
//! watch:
//!   loop select {
//!     child.wait()        ─► send ExitInfo, exit
//!     Terminate           ─► SIGTERM (unix) / start_kill (other)
//!     Kill                ─► start_kill
//!     handle dropped      ─► start_kill, keep waiting for the exit
//!   }
//! ```

use async_trait::async_trait;
use tokio::process::{Child, Command};
use tokio_util::io::ReaderStream;

use super::config::{ProcessConfig, Stdio};
use super::spawner::{ChildControl, ChildHandle, Spawner, StopSignal};
use super::state::ExitInfo;
use crate::error::SpawnError;

/// Default spawner: real child processes via [`tokio::process::Command`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSpawner;

impl TokioSpawner {
    /// Construct a new [`TokioSpawner`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Spawner for TokioSpawner {
    async fn spawn(&self, id: &str, config: &ProcessConfig) -> Result<ChildHandle, SpawnError> {
        let mut cmd = Command::new(&config.command);
        cmd.args(&config.args).envs(&config.env).kill_on_drop(true);
        if let Some(cwd) = &config.cwd {
            cmd.current_dir(cwd);
        }
        match config.stdio {
            Stdio::Pipe => {
                cmd.stdin(std::process::Stdio::null())
                    .stdout(std::process::Stdio::piped())
                    .stderr(std::process::Stdio::piped());
            }
            Stdio::Inherit => {
                cmd.stdin(std::process::Stdio::inherit())
                    .stdout(std::process::Stdio::inherit())
                    .stderr(std::process::Stdio::inherit());
            }
            Stdio::Ignore => {
                cmd.stdin(std::process::Stdio::null())
                    .stdout(std::process::Stdio::null())
                    .stderr(std::process::Stdio::null());
            }
        }

        let mut child = cmd.spawn().map_err(|source| SpawnError::Io {
            command: config.command.clone(),
            source,
        })?;

        let pid = child.id();
        tracing::debug!(process = id, ?pid, command = %config.command, "spawned child");

        let (mut handle, control) = ChildHandle::pair(pid);
        if let Some(out) = child.stdout.take() {
            handle = handle.with_stdout(ReaderStream::new(out));
        }
        if let Some(err) = child.stderr.take() {
            handle = handle.with_stderr(ReaderStream::new(err));
        }

        tokio::spawn(watch(child, control));
        Ok(handle)
    }
}

/// Owns the child until it exits, forwarding stop signals to it.
async fn watch(mut child: Child, control: ChildControl) {
    let ChildControl {
        mut signals,
        exit: exit_tx,
    } = control;
    let mut orphaned = false;

    let status = loop {
        tokio::select! {
            status = child.wait() => break status,
            sig = signals.recv(), if !orphaned => match sig {
                Some(sig) => deliver(&mut child, sig),
                None => {
                    orphaned = true;
                    let _ = child.start_kill();
                }
            },
        }
    };

    let info = match status {
        Ok(status) => ExitInfo::from(status),
        Err(e) => {
            tracing::warn!(error = %e, "failed to wait for child");
            ExitInfo::unknown()
        }
    };
    let _ = exit_tx.send(info);
}

fn deliver(child: &mut Child, sig: StopSignal) {
    match sig {
        StopSignal::Terminate => terminate(child),
        StopSignal::Kill => {
            if let Err(e) = child.start_kill() {
                tracing::debug!(error = %e, "kill request failed");
            }
        }
    }
}

#[cfg(unix)]
fn terminate(child: &mut Child) {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    // `id()` is `None` once the child has been reaped.
    let Some(pid) = child.id() else { return };
    if let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
        tracing::debug!(pid, error = %e, "SIGTERM failed; killing");
        let _ = child.start_kill();
    }
}

#[cfg(not(unix))]
fn terminate(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        tracing::debug!(error = %e, "kill request failed");
    }
}
