//! # Host: orchestrates process entries, event delivery, and shutdown.
//!
//! The [`Host`] is the public face of the crate. It validates calls, owns the
//! ordered [`Registry`] of process entries, and exposes the [`Bus`] through
//! `on`/`once`/`off`/`remove_listeners`.
//!
//! ## High-level architecture
//! ```text
//! Caller:
//!   start / stop / restart / setup
//!        │
//!        ├─► validate (HostError, synchronous; nothing published)
//!        ├─► Registry.get_or_create(id) ──► spawn ProcessEntry::run(rx)   (new ids only)
//!        └─► EntryHandle.request(Command) ──► Pending<T>   (already queued on return)
//!
//! Entry actors:
//!   ProcessEntry ── publish(Event) ──► Bus ──┬──► on/once handlers (topic match)
//!                                            └──► broadcast ──► subscriber listener
//!                                                                └─► SubscriberSet::emit(&Event)
//!
//! Shutdown path:
//!   run_until_signal()
//!     └─► shutdown::wait_for_shutdown_signal()
//!     └─► shutdown() ─► Stop every entry ─► await all stops
//! ```
//!
//! ## Rules
//! - Misuse (empty identifier, unknown identifier without config) is reported synchronously
//!   and never reaches the bus.
//! - `(id, started)` and `(id, stopped)` are never delivered inside the call that caused them.
//! - Dropping the host ends every entry actor, which tears down its live process.
//!
//! ## Example
//! ```no_run
//! use procvisor::{EventKind, Host, ProcessConfig, Topic};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let host = Host::new();
//!
//!     host.on(Topic::any(EventKind::Stdout), |ev| {
//!         if let Some(line) = ev.text() {
//!             print!("[{}] {line}", ev.process);
//!         }
//!     });
//!
//!     let ticker = ProcessConfig::new("sh").with_args(["-c", "while true; do date; sleep 1; done"]);
//!     let info = host.start("ticker", Some(ticker))?.await?;
//!     println!("ticker running as pid {:?}", info.pid);
//!
//!     host.run_until_signal().await?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::builder::HostBuilder;
use super::config::HostConfig;
use super::entry::{Command, ProcessEntry};
use super::pending::Pending;
use super::registry::{EntryHandle, Registry};
use super::shutdown;
use crate::error::{HostError, ProcessError, RunError};
use crate::events::{Bus, Event, ListenerId, Topic};
use crate::process::{ProcessConfig, ProcessInfo, Spawner};

/// Supervises a named set of child processes.
pub struct Host {
    cfg: HostConfig,
    bus: Bus,
    spawner: Arc<dyn Spawner>,
    registry: Mutex<Registry>,
}

impl Host {
    /// Creates a host with the default configuration and the [`TokioSpawner`](crate::TokioSpawner).
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Runtime flavor
    /// `started`/`stopped` are delivered by a dispatcher task, never inside the call that
    /// caused them. On a current-thread runtime (`#[tokio::main(flavor = "current_thread")]`,
    /// `#[tokio::test]`) a listener attached right after `start(..)` is therefore guaranteed to
    /// see that `started`. On a multi-thread runtime (the default `#[tokio::main]`) the
    /// dispatcher may run in parallel with the caller and deliver it first; attach listeners
    /// before issuing the call there.
    pub fn new() -> Self {
        Self::builder(HostConfig::default()).build()
    }

    /// Returns a builder for custom configuration, spawner or subscribers.
    ///
    /// The runtime-flavor notes of [`Host::new`] apply to built hosts too.
    pub fn builder(cfg: HostConfig) -> HostBuilder {
        HostBuilder::new(cfg)
    }

    pub(crate) fn new_internal(cfg: HostConfig, bus: Bus, spawner: Arc<dyn Spawner>) -> Self {
        Self {
            cfg,
            bus,
            spawner,
            registry: Mutex::new(Registry::new()),
        }
    }

    /// Starts a process, creating it on first use.
    ///
    /// - unknown `id` + `config` → registered `Idle`, then driven to `Started`
    /// - known `id` → restart cycle; a supplied `config` replaces the stored one
    ///
    /// The returned [`Pending`] resolves once the entry is `Started` and rejects if the
    /// spawner fails.
    ///
    /// # Errors
    /// - [`HostError::MissingIdentifier`] for an empty `id`
    /// - [`HostError::NotConfigured`] for an unknown `id` without `config`
    pub fn start(
        &self,
        id: &str,
        config: Option<ProcessConfig>,
    ) -> Result<Pending<ProcessInfo>, HostError> {
        let id = require_id(id, "start")?;
        let mut reg = self.registry.lock();

        if let Some(entry) = reg.get(id) {
            return Ok(entry.request(|reply| Command::Restart { config, reply }));
        }
        let Some(config) = config else {
            return Err(HostError::NotConfigured {
                op: "start",
                id: id.to_string(),
            });
        };

        let (entry, _) = reg.get_or_create(id, |key| self.spawn_entry(key, config));
        Ok(entry.request(|reply| Command::Start { reply }))
    }

    /// Stops one process (`Some(id)`) or every known process (`None`).
    ///
    /// Entries that are already down are left alone and publish nothing.
    ///
    /// # Errors
    /// - [`HostError::MissingIdentifier`] for an empty `id`
    /// - [`HostError::NotFound`] for an unknown `id`
    pub fn stop(&self, id: Option<&str>) -> Result<Pending<()>, HostError> {
        let Some(id) = id else {
            return Ok(self.stop_all());
        };
        let id = require_id(id, "stop")?;
        let reg = self.registry.lock();
        let entry = reg.get(id).ok_or_else(|| HostError::NotFound { id: id.to_string() })?;
        Ok(entry.request(|reply| Command::Stop { reply }))
    }

    /// Restarts one process (`Some(id)`) or every known process (`None`).
    ///
    /// Each entry publishes its own `restarting` followed by `started`. The all-form
    /// resolves once every entry completed its cycle.
    ///
    /// # Errors
    /// - [`HostError::MissingIdentifier`] for an empty `id`
    /// - [`HostError::NotConfigured`] for an unknown `id`
    pub fn restart(&self, id: Option<&str>) -> Result<Pending<()>, HostError> {
        let reg = self.registry.lock();
        let Some(id) = id else {
            let parts = reg.all().map(restart_entry).collect();
            return Ok(Pending::all(parts).map(|_| ()));
        };

        let id = require_id(id, "restart")?;
        let entry = reg.get(id).ok_or_else(|| HostError::NotConfigured {
            op: "restart",
            id: id.to_string(),
        })?;
        Ok(restart_entry(entry))
    }

    /// Registers (or redefines) a batch of processes, in order.
    ///
    /// All identifiers are validated before anything is registered. New identifiers are
    /// registered `Idle` in input order; entries with `autostart` are started. Known
    /// identifiers are redefined: with `autostart` through the restart cycle, otherwise
    /// only their stored config is replaced.
    ///
    /// The returned [`Pending`] yields one [`ProcessInfo`] per input pair, in input order,
    /// once every auto-started entry settled.
    ///
    /// # Errors
    /// - [`HostError::MissingIdentifier`] if any identifier is empty
    pub fn setup<I, K>(&self, configs: I) -> Result<Pending<Vec<ProcessInfo>>, HostError>
    where
        I: IntoIterator<Item = (K, ProcessConfig)>,
        K: AsRef<str>,
    {
        let configs: Vec<(K, ProcessConfig)> = configs.into_iter().collect();
        for (id, _) in &configs {
            require_id(id.as_ref(), "setup")?;
        }

        let mut reg = self.registry.lock();
        let mut parts = Vec::with_capacity(configs.len());
        for (id, config) in configs {
            let id = id.as_ref();
            let autostart = config.autostart;

            let part = if let Some(entry) = reg.get(id) {
                if autostart {
                    entry.request(|reply| Command::Restart {
                        config: Some(config),
                        reply,
                    })
                } else {
                    entry.request(|reply| Command::Configure { config, reply })
                }
            } else {
                let (entry, _) = reg.get_or_create(id, |key| self.spawn_entry(key, config));
                if autostart {
                    entry.request(|reply| Command::Start { reply })
                } else {
                    Pending::ready(entry.info())
                }
            };
            parts.push(part);
        }
        tracing::debug!(count = parts.len(), "setup dispatched");
        Ok(Pending::all(parts))
    }

    /// Registers a persistent listener for `topic` (exact or wildcard).
    pub fn on<F>(&self, topic: impl Into<Topic>, handler: F) -> ListenerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.bus.on(topic, handler)
    }

    /// Registers a listener that fires for the first matching event only.
    pub fn once<F>(&self, topic: impl Into<Topic>, handler: F) -> ListenerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.bus.once(topic, handler)
    }

    /// Removes one listener. Returns `false` if it was already gone.
    pub fn off(&self, id: ListenerId) -> bool {
        self.bus.off(id)
    }

    /// Removes every listener registered through this host.
    pub fn remove_listeners(&self) {
        self.bus.remove_listeners();
    }

    /// Snapshot of every entry, in registration order.
    pub fn processes(&self) -> Vec<ProcessInfo> {
        self.registry.lock().all().map(EntryHandle::info).collect()
    }

    /// Snapshot of one entry.
    pub fn process(&self, id: &str) -> Option<ProcessInfo> {
        self.registry.lock().get(id).map(EntryHandle::info)
    }

    /// Identifiers in registration order.
    pub fn ids(&self) -> Vec<Arc<str>> {
        self.registry.lock().ids()
    }

    /// The event bus shared with every entry.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Host configuration.
    pub fn config(&self) -> &HostConfig {
        &self.cfg
    }

    /// Stops every entry and waits until all of them are down.
    pub async fn shutdown(&self) -> Result<(), ProcessError> {
        tracing::debug!(processes = self.registry.lock().len(), "shutting down");
        self.stop_all().await
    }

    /// Runs until a termination signal (SIGINT/SIGTERM/SIGQUIT, Ctrl-C elsewhere) arrives,
    /// then shuts down.
    pub async fn run_until_signal(&self) -> Result<(), RunError> {
        shutdown::wait_for_shutdown_signal().await?;
        tracing::info!("shutdown signal received");
        self.shutdown().await?;
        Ok(())
    }

    fn stop_all(&self) -> Pending<()> {
        let reg = self.registry.lock();
        if reg.is_empty() {
            return Pending::ready(());
        }
        let parts = reg
            .all()
            .map(|entry| entry.request(|reply| Command::Stop { reply }))
            .collect();
        Pending::all(parts).map(|_| ())
    }

    /// Spawns the actor of a new entry and returns its handle.
    fn spawn_entry(&self, id: Arc<str>, config: ProcessConfig) -> EntryHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let (entry, view) = ProcessEntry::new(
            Arc::clone(&id),
            config,
            self.bus.clone(),
            Arc::clone(&self.spawner),
            self.cfg.stop_timeout(),
        );
        tokio::spawn(entry.run(rx));
        tracing::debug!(process = %id, "entry registered");
        EntryHandle::new(id, tx, view)
    }
}

impl Default for Host {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host")
            .field("cfg", &self.cfg)
            .field("processes", &self.ids())
            .finish_non_exhaustive()
    }
}

fn restart_entry(entry: &EntryHandle) -> Pending<()> {
    tracing::debug!(process = %entry.id(), "restart requested");
    entry
        .request(|reply| Command::Restart {
            config: None,
            reply,
        })
        .map(|_| ())
}

fn require_id<'a>(id: &'a str, op: &'static str) -> Result<&'a str, HostError> {
    if id.trim().is_empty() {
        Err(HostError::MissingIdentifier { op })
    } else {
        Ok(id)
    }
}
