//! # Async event subscribers.
//!
//! This module provides the [`Subscribe`] trait and the [`SubscriberSet`] fan-out
//! that feeds it from the bus broadcast stream.
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   ProcessEntry ── publish(Event) ──► Bus ──► broadcast ──► subscriber listener (Host)
//!                                                                 │
//!                                                        SubscriberSet::emit(&Event)
//!                                                                 │
//!                                                 ┌───────────────┼───────────────┐
//!                                                 ▼               ▼               ▼
//!                                             LogWriter        Metrics          Custom
//! ```
//!
//! Bus handlers registered with `Host::on` run inline and see every event at the
//! moment it is delivered. Subscribers run on their own workers and may lag behind.

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
