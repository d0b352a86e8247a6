//! # Spawner abstraction.
//!
//! The host never creates OS processes itself. It drives a [`Spawner`], which turns a
//! [`ProcessConfig`] into a [`ChildHandle`]:
//!
//! ```text
//! Spawner::spawn(id, &config) ──► ChildHandle
//!                                   ├─ pid
//!                                   ├─ stdout / stderr   (byte streams, when piped)
//!                                   ├─ control ──► StopSignal::{Terminate, Kill}
//!                                   └─ exit    ◄── one-shot ExitInfo
//!
//! implementation side (ChildControl):
//!   signals.recv()  ─► forward to the OS process
//!   exit.send(info) ─► exactly once, when the process is gone
//! ```
//!
//! ## Rules
//! - The exit notification must fire **after** the process is gone; the host publishes
//!   `stopped` only once it arrives.
//! - Dropping the [`ChildControl`] without sending an exit is reported as an unknown exit.
//! - Output streams end (return `None`) when the child closes them.

use std::fmt;
use std::io;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream::{BoxStream, Stream};
use tokio::sync::{mpsc, oneshot};

use super::config::ProcessConfig;
use super::state::ExitInfo;
use crate::error::SpawnError;

/// Output stream of a child: chunks of bytes as they are read.
pub type ByteStream = BoxStream<'static, io::Result<Bytes>>;

/// Termination request sent to a live child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopSignal {
    /// Ask the process to exit (SIGTERM on unix).
    Terminate,
    /// Force the process to exit (SIGKILL on unix).
    Kill,
}

/// Host side of a spawned process.
pub struct ChildHandle {
    pub(crate) pid: Option<u32>,
    pub(crate) stdout: Option<ByteStream>,
    pub(crate) stderr: Option<ByteStream>,
    pub(crate) control: mpsc::UnboundedSender<StopSignal>,
    pub(crate) exit: oneshot::Receiver<ExitInfo>,
}

/// Spawner side of a spawned process, returned by [`ChildHandle::pair`].
#[derive(Debug)]
pub struct ChildControl {
    /// Termination requests from the host.
    pub signals: mpsc::UnboundedReceiver<StopSignal>,
    /// Exit notification; send exactly once, after the process is gone.
    pub exit: oneshot::Sender<ExitInfo>,
}

impl ChildHandle {
    /// Creates a connected handle/control pair for a process with the given pid.
    pub fn pair(pid: Option<u32>) -> (ChildHandle, ChildControl) {
        let (control, signals) = mpsc::unbounded_channel();
        let (exit_tx, exit) = oneshot::channel();
        (
            ChildHandle {
                pid,
                stdout: None,
                stderr: None,
                control,
                exit,
            },
            ChildControl {
                signals,
                exit: exit_tx,
            },
        )
    }

    /// Attaches the stdout stream.
    pub fn with_stdout<S>(mut self, stream: S) -> Self
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        self.stdout = Some(stream.boxed());
        self
    }

    /// Attaches the stderr stream.
    pub fn with_stderr<S>(mut self, stream: S) -> Self
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        self.stderr = Some(stream.boxed());
        self
    }

    /// OS process id, if the spawner knows it.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Sends a termination request. Returns `false` if the spawner side is gone.
    pub fn signal(&self, sig: StopSignal) -> bool {
        self.control.send(sig).is_ok()
    }
}

impl fmt::Debug for ChildHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildHandle")
            .field("pid", &self.pid)
            .field("stdout", &self.stdout.is_some())
            .field("stderr", &self.stderr.is_some())
            .finish()
    }
}

/// # Creates OS processes on behalf of the host.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use procvisor::{ChildHandle, ExitInfo, ProcessConfig, SpawnError, Spawner, StopSignal};
///
/// /// Pretends to start a process that exits as soon as it is asked to.
/// struct Instant;
///
/// #[async_trait]
/// impl Spawner for Instant {
///     async fn spawn(&self, _id: &str, _cfg: &ProcessConfig) -> Result<ChildHandle, SpawnError> {
///         let (handle, mut ctl) = ChildHandle::pair(None);
///         tokio::spawn(async move {
///             if let Some(StopSignal::Terminate | StopSignal::Kill) = ctl.signals.recv().await {
///                 let _ = ctl.exit.send(ExitInfo::signal(15));
///             }
///         });
///         Ok(handle)
///     }
/// }
/// ```
#[async_trait]
pub trait Spawner: Send + Sync + 'static {
    /// Starts the process described by `config` on behalf of entry `id`.
    async fn spawn(&self, id: &str, config: &ProcessConfig) -> Result<ChildHandle, SpawnError>;
}
