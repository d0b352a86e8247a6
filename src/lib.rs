//! # procvisor
//!
//! **Procvisor** is a small process-supervision core for Tokio applications.
//!
//! It manages a named set of child OS processes, tracks each one's lifecycle
//! state, and exposes that lifecycle as a topic-addressed event stream. Callers
//! subscribe to one process (`web.started`) or to every process at once
//! (`*.stdout`).
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   start / stop / restart / setup            on / once / off
//!            │                                      │
//!            ▼                                      ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Host (orchestrator)                                              │
//! │  - validates calls (HostError, synchronous)                       │
//! │  - Registry (ordered id → entry)                                  │
//! │  - Bus (topic listeners, deferred started/stopped)                │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!  │ ProcessEntry │   │ ProcessEntry │   │ ProcessEntry │   one actor per id
//!  │  (actor)     │   │  (actor)     │   │  (actor)     │
//!  └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!         │ Spawner::spawn   │                  │
//!         ▼                  ▼                  ▼
//!    ChildHandle        ChildHandle        ChildHandle      pid, stdout/stderr, stop, exit
//!         │                  │                  │
//!         └──── publish(Event) ─────────────────┘
//!                            ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                    Bus (listener table + broadcast)               │
//! └───────────────┬────────────────────────────────────┬──────────────┘
//!                 ▼                                    ▼
//!       on/once handlers (inline)          subscriber listener ─► SubscriberSet
//!                                                               (per-subscriber queues)
//! ```
//!
//! ### Lifecycle
//! ```text
//! Idle ──start──► Starting ──spawn ok──► Started ──stop──► Stopping ──exit──► Stopped
//!                    │                     │  │                                 ▲
//!                    └──spawn err──────────┼──┼──(error)────────────────────────┤
//!                                          │  └──exits on its own──────────────┘
//!                                          │
//!               any ──restart / start(new config)──► Restarting ──► Starting ──► ...
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                        |
//! |-------------------|--------------------------------------------------------------|-------------------------------------------|
//! | **Orchestration** | Start, stop, restart and batch-define named processes.       | [`Host`], [`HostBuilder`], [`Pending`]    |
//! | **Events**        | Topic-addressed listeners with wildcards.                    | [`Bus`], [`Topic`], [`Event`]             |
//! | **Subscribers**   | Async consumers with bounded per-subscriber queues.          | [`Subscribe`], [`SubscriberSet`]          |
//! | **Spawning**      | Pluggable process creation; Tokio implementation included.   | [`Spawner`], [`ChildHandle`], [`TokioSpawner`] |
//! | **Errors**        | Misuse vs operational failures.                              | [`HostError`], [`ProcessError`]           |
//! | **Configuration** | Host settings and serde-loadable process definitions.        | [`HostConfig`], [`ProcessConfig`], [`ProcessMap`] |
//!
//! ## Optional features
//! - `logging`: exports [`LogWriter`], a subscriber that writes every event through `tracing`.
//!
//! ## Example
//! ```rust,no_run
//! use procvisor::{EventKind, Host, HostConfig, ProcessConfig, Topic};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let host = Host::builder(HostConfig::default()).build();
//!
//!     host.on(Topic::any(EventKind::Started), |ev| {
//!         println!("{} started (pid {:?})", ev.process, ev.pid);
//!     });
//!     host.on(Topic::any(EventKind::Error), |ev| {
//!         eprintln!("{} failed: {:?}", ev.process, ev.reason);
//!     });
//!
//!     let procs = [
//!         ("api", ProcessConfig::new("sleep").with_args(["30"]).with_autostart(true)),
//!         ("worker", ProcessConfig::new("sleep").with_args(["30"])),
//!     ];
//!     host.setup(procs)?.await?;
//!     host.start("worker", None)?.await?;
//!
//!     host.shutdown().await?;
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod process;
mod subscribers;

// ---- Public re-exports ----

pub use core::{Host, HostBuilder, HostConfig, Pending};
pub use error::{HostError, ProcessError, RunError, SpawnError, TopicParseError};
pub use events::{Bus, Event, EventKind, Handler, ListenerId, ProcessMatch, Topic};
pub use process::{
    ByteStream, ChildControl, ChildHandle, ExitInfo, ProcessConfig, ProcessInfo, ProcessMap,
    ProcessState, Spawner, Stdio, StopSignal, TokioSpawner,
};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a built-in event logger subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
