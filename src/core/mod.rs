//! Runtime core: orchestration and per-process lifecycle.
//!
//! The public API from this module is [`Host`] (built through [`HostBuilder`]),
//! its configuration [`HostConfig`], and the [`Pending`] future every host
//! operation returns.
//!
//! Internal modules:
//! - [`host`]: validates calls, owns the registry, wires entries to the bus;
//! - [`entry`]: runs one process through its state machine as an actor;
//! - [`registry`]: ordered identifier → entry mapping;
//! - [`pending`]: eagerly-dispatched operation results;
//! - [`shutdown`]: cross-platform termination signal handling.

mod builder;
mod config;
mod entry;
mod host;
mod pending;
mod registry;
mod shutdown;

pub use builder::HostBuilder;
pub use config::HostConfig;
pub use host::Host;
pub use pending::Pending;
