//! # Process lifecycle state and the read-only process view.
//!
//! ```text
//! Idle | Stopped ──start──► Starting ──spawned──► Started ──stop──► Stopping ──exit──► Stopped
//!                              │                    │
//!                              └─ spawn failure ─►  └─ exits on its own ─► Stopped
//!
//! any ──restart / redefine──► Restarting ──(old handle torn down)──► Starting ──► Started
//! ```

use std::fmt;
use std::process::ExitStatus;
use std::sync::Arc;
use std::time::SystemTime;

use super::config::ProcessConfig;

/// Lifecycle state of one managed process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessState {
    /// Registered, never started.
    Idle,
    /// Spawner invoked, handle not yet returned.
    Starting,
    /// A live handle exists.
    Started,
    /// Termination requested, exit not yet confirmed.
    Stopping,
    /// No live handle (stopped, crashed or failed to spawn).
    Stopped,
    /// Restart cycle in progress (old handle being torn down).
    Restarting,
}

impl ProcessState {
    /// Returns the stable lowercase name of the state.
    pub fn as_str(self) -> &'static str {
        match self {
            ProcessState::Idle => "idle",
            ProcessState::Starting => "starting",
            ProcessState::Started => "started",
            ProcessState::Stopping => "stopping",
            ProcessState::Stopped => "stopped",
            ProcessState::Restarting => "restarting",
        }
    }

    /// True for states in which no live handle exists and none is being created.
    #[inline]
    pub fn is_down(self) -> bool {
        matches!(self, ProcessState::Idle | ProcessState::Stopped)
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExitInfo {
    /// Exit code, if the process exited normally.
    pub code: Option<i32>,
    /// Terminating signal number, if the process was killed by a signal (unix).
    pub signal: Option<i32>,
}

impl ExitInfo {
    /// Exit with a code.
    pub fn code(code: i32) -> Self {
        Self {
            code: Some(code),
            signal: None,
        }
    }

    /// Termination by a signal.
    pub fn signal(signal: i32) -> Self {
        Self {
            code: None,
            signal: Some(signal),
        }
    }

    /// Exit of unknown cause (the exit notification was lost).
    pub fn unknown() -> Self {
        Self::default()
    }

    /// True only for exit code 0.
    #[inline]
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<ExitStatus> for ExitInfo {
    fn from(status: ExitStatus) -> Self {
        #[cfg(unix)]
        let signal = {
            use std::os::unix::process::ExitStatusExt;
            status.signal()
        };
        #[cfg(not(unix))]
        let signal = None;

        Self {
            code: status.code(),
            signal,
        }
    }
}

impl fmt::Display for ExitInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code, self.signal) {
            (Some(code), _) => write!(f, "code={code}"),
            (None, Some(sig)) => write!(f, "signal={sig}"),
            (None, None) => f.write_str("unknown"),
        }
    }
}

/// Read-only snapshot of one registry entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    /// Process identifier (unique within a host).
    pub id: Arc<str>,
    /// Current lifecycle state.
    pub state: ProcessState,
    /// Config the process was (or will be) started with.
    pub config: ProcessConfig,
    /// OS pid of the live handle.
    pub pid: Option<u32>,
    /// When the live handle was spawned.
    pub started_at: Option<SystemTime>,
    /// How the previous handle ended.
    pub last_exit: Option<ExitInfo>,
    /// Number of restart cycles begun (explicit restarts and redefinitions).
    pub restarts: u32,
}

impl ProcessInfo {
    /// Snapshot of a freshly registered entry.
    pub fn idle(id: Arc<str>, config: ProcessConfig) -> Self {
        Self {
            id,
            state: ProcessState::Idle,
            config,
            pid: None,
            started_at: None,
            last_exit: None,
            restarts: 0,
        }
    }
}
