//! Error types used by the procvisor host and spawners.
//!
//! This module defines the error enums of the crate:
//!
//! - [`HostError`]: misuse of the host API, returned synchronously and never routed through the bus.
//! - [`ProcessError`]: operational failures of one process; the pending future rejects with it
//!   and an `error` event is published on the process topic.
//! - [`SpawnError`]: failures reported by a [`Spawner`](crate::Spawner) implementation.
//! - [`RunError`]: failures of [`Host::run_until_signal`](crate::Host::run_until_signal).
//! - [`TopicParseError`]: malformed `"<id>.<kind>"` topic strings.
//!
//! [`HostError`] and [`ProcessError`] provide `as_label` for logs/metrics.

use std::sync::Arc;

use thiserror::Error;

use crate::process::ExitInfo;

/// # Programming mistakes in calls to the host.
///
/// The messages are stable and part of the public contract.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// An operation that requires an identifier received an empty one.
    #[error("Cannot call {op} without an identifier.")]
    MissingIdentifier {
        /// Name of the offending operation (`start`, `stop`, `restart`, `setup`).
        op: &'static str,
    },

    /// An unknown identifier was used without a configuration to create it.
    #[error("Cannot call {op} on non-existent '{id}' without configuration.")]
    NotConfigured {
        /// Name of the offending operation (`start`, `restart`).
        op: &'static str,
        /// The unknown identifier.
        id: String,
    },

    /// `stop` was called with an identifier the host has never seen.
    #[error("Cannot call stop on non-existent '{id}'.")]
    NotFound {
        /// The unknown identifier.
        id: String,
    },
}

impl HostError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use procvisor::HostError;
    ///
    /// let err = HostError::MissingIdentifier { op: "start" };
    /// assert_eq!(err.as_label(), "host_missing_identifier");
    /// assert_eq!(err.to_string(), "Cannot call start without an identifier.");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            HostError::MissingIdentifier { .. } => "host_missing_identifier",
            HostError::NotConfigured { .. } => "host_not_configured",
            HostError::NotFound { .. } => "host_not_found",
        }
    }
}

/// # Operational failures of a managed process.
///
/// Cloneable so the same cause can reject a pending future and be described
/// in the `error` event.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessError {
    /// The spawner could not start the process; the entry settled to `Stopped`.
    #[error("process '{id}' failed to spawn: {reason}")]
    Spawn {
        /// Process identifier.
        id: Arc<str>,
        /// Cause reported by the spawner.
        reason: Arc<str>,
    },

    /// The entry actor is gone (host dropped or runtime shutting down).
    #[error("process '{id}' is no longer supervised")]
    Closed {
        /// Process identifier.
        id: Arc<str>,
    },
}

impl ProcessError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ProcessError::Spawn { .. } => "process_spawn_failed",
            ProcessError::Closed { .. } => "process_closed",
        }
    }

    /// Identifier of the process the failure belongs to.
    pub fn id(&self) -> &str {
        match self {
            ProcessError::Spawn { id, .. } | ProcessError::Closed { id } => id,
        }
    }
}

/// # Errors reported by spawners.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SpawnError {
    /// The OS refused to start the command.
    #[error("failed to spawn '{command}': {source}")]
    Io {
        /// Command that was attempted.
        command: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Spawner-specific failure.
    #[error("{0}")]
    Other(String),
}

/// # Errors returned by [`Host::run_until_signal`](crate::Host::run_until_signal).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RunError {
    /// OS signal listeners could not be installed.
    #[error("failed to listen for shutdown signals: {0}")]
    Signal(#[from] std::io::Error),

    /// Stopping the managed processes failed.
    #[error(transparent)]
    Shutdown(#[from] ProcessError),
}

impl RunError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RunError::Signal(_) => "run_signal_failed",
            RunError::Shutdown(e) => e.as_label(),
        }
    }
}

/// # Malformed topic strings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TopicParseError {
    /// No `.` between identifier and kind.
    #[error("topic '{0}' must have the form '<id>.<kind>'")]
    MissingSeparator(String),

    /// Identifier part is empty.
    #[error("topic '{0}' has an empty process identifier")]
    EmptyProcess(String),

    /// Kind part is not one of the known event kinds.
    #[error("unknown event kind '{0}'")]
    UnknownKind(String),
}

/// Reason text used for an unexpected, unsuccessful exit.
pub(crate) fn unexpected_exit(exit: &ExitInfo) -> String {
    format!("process exited unexpectedly ({exit})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn misuse_messages_are_stable() {
        assert_eq!(
            HostError::MissingIdentifier { op: "start" }.to_string(),
            "Cannot call start without an identifier."
        );
        assert_eq!(
            HostError::NotConfigured {
                op: "start",
                id: "testd".into()
            }
            .to_string(),
            "Cannot call start on non-existent 'testd' without configuration."
        );
        assert_eq!(
            HostError::NotFound { id: "ghost".into() }.to_string(),
            "Cannot call stop on non-existent 'ghost'."
        );
    }

    #[test]
    fn process_error_exposes_its_id() {
        let err = ProcessError::Spawn {
            id: "web".into(),
            reason: "no such file".into(),
        };
        assert_eq!(err.id(), "web");
        assert_eq!(err.as_label(), "process_spawn_failed");
        assert_eq!(
            err.to_string(),
            "process 'web' failed to spawn: no such file"
        );
    }
}
