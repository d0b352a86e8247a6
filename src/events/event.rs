//! # Events published by process entries.
//!
//! An [`Event`] is always emitted by one concrete process identifier and carries
//! one [`EventKind`]. Optional fields are set depending on the kind:
//!
//! | Kind         | `pid` | `data` | `reason` | `exit` |
//! |--------------|-------|--------|----------|--------|
//! | `Started`    | yes   |        |          |        |
//! | `Stopped`    |       |        |          | yes    |
//! | `Restarting` | old   |        |          |        |
//! | `Stdout`     | yes   | yes    |          |        |
//! | `Stderr`     | yes   | yes    |          |        |
//! | `Error`      | maybe |        | yes      | maybe  |
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore publication order when events are observed out of order
//! (for example through independent subscriber queues).
//!
//! ## Example
//! ```rust
//! use procvisor::{Event, EventKind, Topic};
//!
//! let ev = Event::new("web", EventKind::Error).with_reason("spawn failed");
//!
//! assert_eq!(ev.kind, EventKind::Error);
//! assert_eq!(ev.process.as_ref(), "web");
//! assert_eq!(ev.reason.as_deref(), Some("spawn failed"));
//! assert!(Topic::any(EventKind::Error).matches(&ev.process, ev.kind));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use bytes::Bytes;

use super::topic::{EventKind, Topic};
use crate::process::ExitInfo;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// One publication on the bus.
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Identifier of the process that emitted the event.
    pub process: Arc<str>,
    /// Event classification.
    pub kind: EventKind,
    /// OS process id, when one is known.
    pub pid: Option<u32>,
    /// Raw output chunk (`Stdout`/`Stderr`).
    pub data: Option<Bytes>,
    /// Human-readable failure cause (`Error`).
    pub reason: Option<Arc<str>>,
    /// Exit status of the child (`Stopped`, and `Error` after an unexpected exit).
    pub exit: Option<ExitInfo>,
}

impl Event {
    /// Creates a new event with the current timestamp and the next sequence number.
    pub fn new(process: impl Into<Arc<str>>, kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            process: process.into(),
            kind,
            pid: None,
            data: None,
            reason: None,
            exit: None,
        }
    }

    /// Attaches the OS process id (no-op for `None`).
    #[inline]
    pub fn with_pid(mut self, pid: Option<u32>) -> Self {
        self.pid = pid;
        self
    }

    /// Attaches an output chunk.
    #[inline]
    pub fn with_data(mut self, data: Bytes) -> Self {
        self.data = Some(data);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches exit information.
    #[inline]
    pub fn with_exit(mut self, exit: ExitInfo) -> Self {
        self.exit = Some(exit);
        self
    }

    /// The exact topic this event is published on.
    pub fn topic(&self) -> Topic {
        Topic::new(Arc::clone(&self.process), self.kind)
    }

    /// Output chunk decoded lossily as UTF-8.
    pub fn text(&self) -> Option<String> {
        self.data
            .as_ref()
            .map(|d| String::from_utf8_lossy(d).into_owned())
    }
}
