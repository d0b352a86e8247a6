use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;

use super::config::HostConfig;
use super::host::Host;
use crate::events::Bus;
use crate::process::{Spawner, TokioSpawner};
use crate::subscribers::{Subscribe, SubscriberSet};

/// Builder for constructing a [`Host`] with a custom spawner or subscribers.
pub struct HostBuilder {
    cfg: HostConfig,
    spawner: Option<Arc<dyn Spawner>>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl HostBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: HostConfig) -> Self {
        Self {
            cfg,
            spawner: None,
            subscribers: Vec::new(),
        }
    }

    /// Replaces the default [`TokioSpawner`].
    pub fn with_spawner(mut self, spawner: Arc<dyn Spawner>) -> Self {
        self.spawner = Some(spawner);
        self
    }

    /// Sets async event subscribers.
    ///
    /// Subscribers receive every delivered event through dedicated workers with
    /// bounded queues; they never block the entries that publish.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the host.
    ///
    /// This consumes the builder and initializes:
    /// - the event bus and its deferred dispatcher
    /// - subscriber workers, fed from the bus broadcast stream
    ///
    /// Must be called from within a Tokio runtime.
    pub fn build(self) -> Host {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let spawner = self
            .spawner
            .unwrap_or_else(|| Arc::new(TokioSpawner::new()));

        if !self.subscribers.is_empty() {
            let subs = Arc::new(SubscriberSet::new(self.subscribers));
            subscriber_listener(&bus, subs);
        }
        Host::new_internal(self.cfg, bus, spawner)
    }
}

/// Forwards bus events to the subscriber set until the bus is gone (fire-and-forget).
fn subscriber_listener(bus: &Bus, set: Arc<SubscriberSet>) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(ev) => set.emit(&ev),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "subscriber listener lagged behind the bus");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}
