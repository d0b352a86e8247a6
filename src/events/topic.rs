//! # Topics: structured addressing keys for bus publications.
//!
//! A [`Topic`] is the pair `(process, kind)`:
//! - `process` is either a concrete identifier or [`ProcessMatch::Any`] (the wildcard),
//! - `kind` is one of the fixed [`EventKind`] values.
//!
//! Publications always carry a concrete identifier. Subscriptions may use the
//! wildcard to observe one event kind across every managed process.
//!
//! ## Text form
//! ```text
//! "web.started"      → Topic { process: Id("web"), kind: Started }
//! "*.restarting"     → Topic { process: Any,       kind: Restarting }
//! "#.restarting"     → same as above
//! "api.v2.stdout"    → Topic { process: Id("api.v2"), kind: Stdout }   (split at the last '.')
//! ```
//!
//! ## Example
//! ```rust
//! use procvisor::{EventKind, Topic};
//!
//! let exact: Topic = "web.started".parse().unwrap();
//! assert_eq!(exact, Topic::new("web", EventKind::Started));
//!
//! let any = Topic::any(EventKind::Restarting);
//! assert!(any.matches("web", EventKind::Restarting));
//! assert!(!any.matches("web", EventKind::Started));
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::TopicParseError;

/// Lifecycle and output events published per process identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// The process reached `Started` (delivered on the next scheduling step).
    Started,
    /// The process reached `Stopped` after a confirmed exit (delivered on the next scheduling step).
    Stopped,
    /// A restart cycle began; published immediately.
    Restarting,
    /// A chunk of bytes read from the child's stdout.
    Stdout,
    /// A chunk of bytes read from the child's stderr.
    Stderr,
    /// Operational failure: spawn failure or unexpected exit.
    Error,
}

impl EventKind {
    /// Every kind, in declaration order.
    pub const ALL: [EventKind; 6] = [
        EventKind::Started,
        EventKind::Stopped,
        EventKind::Restarting,
        EventKind::Stdout,
        EventKind::Stderr,
        EventKind::Error,
    ];

    /// Returns the stable lowercase name used in the text form of topics.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Started => "started",
            EventKind::Stopped => "stopped",
            EventKind::Restarting => "restarting",
            EventKind::Stdout => "stdout",
            EventKind::Stderr => "stderr",
            EventKind::Error => "error",
        }
    }

    /// Terminal lifecycle kinds that the bus delivers one scheduling step late.
    #[inline]
    pub fn is_deferred(self) -> bool {
        matches!(self, EventKind::Started | EventKind::Stopped)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = TopicParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| TopicParseError::UnknownKind(s.to_string()))
    }
}

/// Process side of a topic.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProcessMatch {
    /// Matches publications from any process identifier.
    Any,
    /// Matches publications from exactly this identifier.
    Id(Arc<str>),
}

impl ProcessMatch {
    #[inline]
    fn accepts(&self, id: &str) -> bool {
        match self {
            ProcessMatch::Any => true,
            ProcessMatch::Id(own) => own.as_ref() == id,
        }
    }
}

/// Addressing key for subscriptions: `(process-or-wildcard, kind)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Topic {
    /// Concrete identifier or wildcard.
    pub process: ProcessMatch,
    /// Event kind.
    pub kind: EventKind,
}

impl Topic {
    /// Topic for one concrete process identifier.
    pub fn new(id: impl Into<Arc<str>>, kind: EventKind) -> Self {
        Self {
            process: ProcessMatch::Id(id.into()),
            kind,
        }
    }

    /// Wildcard topic: `kind` published by any process.
    pub fn any(kind: EventKind) -> Self {
        Self {
            process: ProcessMatch::Any,
            kind,
        }
    }

    /// True if a publication from `id` of `kind` is addressed by this topic.
    #[inline]
    pub fn matches(&self, id: &str, kind: EventKind) -> bool {
        self.kind == kind && self.process.accepts(id)
    }

    #[inline]
    pub fn is_wildcard(&self) -> bool {
        matches!(self.process, ProcessMatch::Any)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.process {
            ProcessMatch::Any => write!(f, "*.{}", self.kind),
            ProcessMatch::Id(id) => write!(f, "{id}.{}", self.kind),
        }
    }
}

impl FromStr for Topic {
    type Err = TopicParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (process, kind) = s
            .rsplit_once('.')
            .ok_or_else(|| TopicParseError::MissingSeparator(s.to_string()))?;
        let kind = kind.parse::<EventKind>()?;
        match process {
            "" => Err(TopicParseError::EmptyProcess(s.to_string())),
            "*" | "#" => Ok(Topic::any(kind)),
            id => Ok(Topic::new(id, kind)),
        }
    }
}

impl From<(&str, EventKind)> for Topic {
    /// `("*", kind)` and `("#", kind)` are wildcards, as in the text form.
    fn from((id, kind): (&str, EventKind)) -> Self {
        match id {
            "*" | "#" => Topic::any(kind),
            id => Topic::new(id, kind),
        }
    }
}

impl From<EventKind> for Topic {
    /// A bare kind addresses every process.
    fn from(kind: EventKind) -> Self {
        Topic::any(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_topic_matches_only_its_id_and_kind() {
        let t = Topic::new("timer1", EventKind::Started);
        assert!(t.matches("timer1", EventKind::Started));
        assert!(!t.matches("timer2", EventKind::Started));
        assert!(!t.matches("timer1", EventKind::Stopped));
    }

    #[test]
    fn wildcard_matches_every_id() {
        let t = Topic::any(EventKind::Restarting);
        assert!(t.is_wildcard());
        for id in ["a", "b", "timer3c"] {
            assert!(t.matches(id, EventKind::Restarting));
        }
        assert!(!t.matches("a", EventKind::Stdout));
        assert_eq!(Topic::from(("*", EventKind::Restarting)), t);
        assert_eq!(Topic::from(EventKind::Restarting), t);
    }

    #[test]
    fn parses_text_form() {
        assert_eq!(
            "timer1.stdout".parse::<Topic>().unwrap(),
            Topic::new("timer1", EventKind::Stdout)
        );
        assert_eq!(
            "#.restarting".parse::<Topic>().unwrap(),
            Topic::any(EventKind::Restarting)
        );
        assert_eq!(
            "*.error".parse::<Topic>().unwrap(),
            Topic::any(EventKind::Error)
        );
        assert_eq!(
            "api.v2.started".parse::<Topic>().unwrap(),
            Topic::new("api.v2", EventKind::Started)
        );
    }

    #[test]
    fn rejects_malformed_text() {
        assert!(matches!(
            "nodot".parse::<Topic>(),
            Err(TopicParseError::MissingSeparator(_))
        ));
        assert!(matches!(
            "web.exploded".parse::<Topic>(),
            Err(TopicParseError::UnknownKind(k)) if k == "exploded"
        ));
        assert!(matches!(
            ".started".parse::<Topic>(),
            Err(TopicParseError::EmptyProcess(_))
        ));
    }

    #[test]
    fn display_round_trips_through_parse() {
        for t in [
            Topic::new("web", EventKind::Stderr),
            Topic::any(EventKind::Stopped),
        ] {
            assert_eq!(t.to_string().parse::<Topic>().unwrap(), t);
        }
    }

    #[test]
    fn only_started_and_stopped_are_deferred() {
        let deferred: Vec<_> = EventKind::ALL
            .into_iter()
            .filter(|k| k.is_deferred())
            .collect();
        assert_eq!(deferred, vec![EventKind::Started, EventKind::Stopped]);
    }
}
