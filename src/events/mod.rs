//! Runtime events: topics, payloads and the bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to lifecycle and output events emitted by process entries.
//!
//! ## Contents
//! - [`EventKind`], [`Topic`], [`ProcessMatch`] addressing keys (exact or wildcard)
//! - [`Event`] payload with sequence number, timestamp and kind-specific fields
//! - [`Bus`] listener table with synchronous and deferred delivery
//!
//! ## Quick reference
//! - **Publishers**: `ProcessEntry` actors (lifecycle), their stdout/stderr pumps (output).
//! - **Consumers**: handlers registered through `Host::on`/`Host::once`, and the
//!   subscriber listener that fans events out to a [`SubscriberSet`](crate::SubscriberSet).

mod bus;
mod event;
mod topic;

pub use bus::{Bus, Handler, ListenerId};
pub use event::Event;
pub use topic::{EventKind, ProcessMatch, Topic};
