//! # Topic-addressed event bus.
//!
//! [`Bus`] delivers [`Event`]s to listeners registered for a [`Topic`]. It is owned
//! by one [`Host`](crate::Host); cloning the bus shares the same listener table.
//!
//! ## Architecture
//! ```text
//! Publishers (many):                         Listeners (ordered table):
//!   ProcessEntry ──┐                           on(Topic, handler)     persistent
//!   stdout pump  ──┼──► publish(Event) ──┬──►  once(Topic, handler)   removed on first match
//!   stderr pump  ──┘                     │
//!                                        │ kind ∈ {Started, Stopped}
//!                                        └──► [deferred queue] ──► dispatcher task ──► deliver()
//!
//! deliver(Event):
//!   ├─► every matching listener, in subscription order (exact and wildcard alike)
//!   └─► broadcast::Sender<Event>  (async observers, see `subscribe()`)
//! ```
//!
//! ## Rules
//! - **Synchronous delivery**: `publish()` invokes matching handlers before it returns,
//!   except for deferred kinds.
//! - **Deferred delivery**: `Started` and `Stopped` are queued to the dispatcher task and
//!   delivered on the next scheduling step, in publication order. A caller that triggers a
//!   start and registers a `once` listener on the very next line observes the event.
//! - **Causal order**: [`Bus::flush`] resolves once everything deferred before it was
//!   delivered. Publishers await it before emitting anything that must follow.
//! - **Exactly-once**: a `once` listener is removed from the table *before* its handler runs.
//! - **Isolation**: a panicking handler is logged and skipped; other handlers still run.
//! - **Re-entrancy**: handlers may publish or (un)subscribe; the table is not locked while
//!   handlers run.
//!
//! ## Runtime
//! [`Bus::new`] spawns the dispatcher and must be called from within a Tokio runtime.
//! The dispatcher exits once the last clone of the bus is dropped.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc, oneshot};

use super::event::Event;
use super::topic::Topic;

/// Callback invoked for every matching publication.
pub type Handler = Arc<dyn Fn(&Event) + Send + Sync + 'static>;

/// Identifies one registered listener (see [`Bus::off`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Listener {
    id: ListenerId,
    topic: Topic,
    once: bool,
    handler: Handler,
}

/// Items of the dispatcher queue.
enum Deferred {
    Event(Event),
    /// Completed once every item queued before it was handled.
    Flush(oneshot::Sender<()>),
}

struct Inner {
    listeners: Mutex<Vec<Listener>>,
    next_id: AtomicU64,
    deferred: mpsc::UnboundedSender<Deferred>,
    tx: broadcast::Sender<Event>,
}

/// Topic-based publish/subscribe with wildcard matching and deferred lifecycle delivery.
#[derive(Clone)]
pub struct Bus {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Bus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl Bus {
    /// Creates a new bus and spawns its deferred-delivery dispatcher.
    ///
    /// `capacity` sizes the broadcast ring buffer used by [`Bus::subscribe`]
    /// (minimum 1, clamped). Listener delivery is unbounded.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        let (deferred, rx) = mpsc::unbounded_channel::<Deferred>();

        let inner = Arc::new(Inner {
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
            deferred,
            tx,
        });
        tokio::spawn(dispatch(Arc::downgrade(&inner), rx));
        Self { inner }
    }

    /// Registers a persistent listener; it stays until [`off`](Self::off) or
    /// [`remove_listeners`](Self::remove_listeners).
    pub fn on<F>(&self, topic: impl Into<Topic>, handler: F) -> ListenerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.register(topic.into(), false, Arc::new(handler))
    }

    /// Registers a single-fire listener, removed after its first matching delivery.
    pub fn once<F>(&self, topic: impl Into<Topic>, handler: F) -> ListenerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.register(topic.into(), true, Arc::new(handler))
    }

    /// Removes one listener. Returns `false` if it was already gone.
    pub fn off(&self, id: ListenerId) -> bool {
        let mut listeners = self.inner.listeners.lock();
        let before = listeners.len();
        listeners.retain(|l| l.id != id);
        listeners.len() != before
    }

    /// Clears the listener table wholesale.
    pub fn remove_listeners(&self) {
        self.inner.listeners.lock().clear();
    }

    /// Number of currently registered listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.lock().len()
    }

    /// Publishes an event.
    ///
    /// Deferred kinds (see [`EventKind::is_deferred`](crate::EventKind::is_deferred)) are
    /// queued to the dispatcher; all others are delivered before this call returns.
    pub fn publish(&self, ev: Event) {
        if ev.kind.is_deferred() {
            if let Err(mpsc::error::SendError(Deferred::Event(ev))) =
                self.inner.deferred.send(Deferred::Event(ev))
            {
                // Dispatcher is gone (runtime shutting down): deliver inline rather than lose it.
                deliver(&self.inner, ev);
            }
        } else {
            deliver(&self.inner, ev);
        }
    }

    /// Waits until every deferred event published before this call has been delivered.
    ///
    /// Returns immediately if the dispatcher is gone.
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        if self.inner.deferred.send(Deferred::Flush(tx)).is_ok() {
            let _ = rx.await;
        }
    }

    /// Creates a receiver observing every event delivered after this call.
    ///
    /// Slow receivers get `RecvError::Lagged(n)` and skip the `n` oldest events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.inner.tx.subscribe()
    }

    fn register(&self, topic: Topic, once: bool, handler: Handler) -> ListenerId {
        let id = ListenerId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner.listeners.lock().push(Listener {
            id,
            topic,
            once,
            handler,
        });
        id
    }
}

/// Delivers deferred events in publication order.
async fn dispatch(inner: Weak<Inner>, mut rx: mpsc::UnboundedReceiver<Deferred>) {
    while let Some(item) = rx.recv().await {
        match item {
            Deferred::Event(ev) => {
                let Some(inner) = inner.upgrade() else { break };
                deliver(&inner, ev);
            }
            Deferred::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
}

fn deliver(inner: &Inner, ev: Event) {
    let handlers: Vec<Handler> = {
        let mut listeners = inner.listeners.lock();
        let mut matched = Vec::new();
        listeners.retain(|l| {
            if !l.topic.matches(&ev.process, ev.kind) {
                return true;
            }
            matched.push(Arc::clone(&l.handler));
            !l.once
        });
        matched
    };

    for handler in handlers {
        if catch_unwind(AssertUnwindSafe(|| handler(&ev))).is_err() {
            tracing::warn!(
                process = %ev.process,
                kind = %ev.kind,
                seq = ev.seq,
                "event handler panicked"
            );
        }
    }

    let _ = inner.tx.send(ev);
}
