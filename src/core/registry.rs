//! # Process registry - ordered identifier → entry mapping.
//!
//! The registry owns one [`EntryHandle`] per identifier. It never spawns anything
//! itself: creation goes through a caller-supplied factory so the host decides how
//! the entry actor is wired.
//!
//! ## Rules
//! - Identifiers are unique: `get_or_create` on a known identifier returns the existing entry.
//! - Iteration yields entries in the order their identifiers were first registered.
//! - Entries are never removed or reordered by normal operation (stop only changes state).

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{mpsc, oneshot};

use crate::core::entry::Command;
use crate::core::pending::Pending;
use crate::error::ProcessError;
use crate::process::ProcessInfo;

/// Host-side handle to one entry actor.
pub(crate) struct EntryHandle {
    id: Arc<str>,
    tx: mpsc::UnboundedSender<Command>,
    view: Arc<RwLock<ProcessInfo>>,
}

impl EntryHandle {
    pub(crate) fn new(
        id: Arc<str>,
        tx: mpsc::UnboundedSender<Command>,
        view: Arc<RwLock<ProcessInfo>>,
    ) -> Self {
        Self { id, tx, view }
    }

    pub(crate) fn id(&self) -> &Arc<str> {
        &self.id
    }

    /// Current snapshot of the entry.
    pub(crate) fn info(&self) -> ProcessInfo {
        self.view.read().clone()
    }

    /// Queues a command and returns the pending reply.
    pub(crate) fn request<T, F>(&self, make: F) -> Pending<T>
    where
        T: Send + 'static,
        F: FnOnce(oneshot::Sender<Result<T, ProcessError>>) -> Command,
    {
        let (reply, rx) = oneshot::channel();
        // A failed send drops `reply`, which resolves the pending as `Closed`.
        let _ = self.tx.send(make(reply));
        Pending::from_reply(Arc::clone(&self.id), rx)
    }
}

/// Ordered mapping of identifier → entry.
#[derive(Default)]
pub(crate) struct Registry {
    order: Vec<Arc<str>>,
    entries: HashMap<Arc<str>, EntryHandle>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get(&self, id: &str) -> Option<&EntryHandle> {
        self.entries.get(id)
    }

    /// Returns the entry for `id`, creating it with `create` if absent.
    ///
    /// The boolean is `true` when the entry was created by this call.
    pub(crate) fn get_or_create<F>(&mut self, id: &str, create: F) -> (&EntryHandle, bool)
    where
        F: FnOnce(Arc<str>) -> EntryHandle,
    {
        let created = if self.entries.contains_key(id) {
            false
        } else {
            let key: Arc<str> = Arc::from(id);
            let handle = create(Arc::clone(&key));
            self.order.push(Arc::clone(&key));
            self.entries.insert(key, handle);
            true
        };
        (&self.entries[id], created)
    }

    /// Entries in insertion order.
    pub(crate) fn all(&self) -> impl Iterator<Item = &EntryHandle> {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }

    /// Identifiers in insertion order.
    pub(crate) fn ids(&self) -> Vec<Arc<str>> {
        self.order.clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ProcessConfig;

    fn handle(id: Arc<str>) -> EntryHandle {
        let (tx, _rx) = mpsc::unbounded_channel();
        let view = Arc::new(RwLock::new(ProcessInfo::idle(
            Arc::clone(&id),
            ProcessConfig::new("true"),
        )));
        EntryHandle::new(id, tx, view)
    }

    #[test]
    fn iterates_in_insertion_order() {
        let mut reg = Registry::new();
        for id in ["timer3a", "timer3b", "timer3c"] {
            reg.get_or_create(id, handle);
        }
        let ids: Vec<&str> = reg.all().map(|h| h.id().as_ref()).collect();
        assert_eq!(ids, vec!["timer3a", "timer3b", "timer3c"]);
        assert_eq!(reg.len(), 3);
    }

    #[test]
    fn duplicate_get_or_create_returns_existing_entry() {
        let mut reg = Registry::new();
        let (_, created) = reg.get_or_create("web", handle);
        assert!(created);

        let mut factory_called = false;
        let (entry, created) = reg.get_or_create("web", |id| {
            factory_called = true;
            handle(id)
        });
        assert!(!created);
        assert_eq!(entry.id().as_ref(), "web");
        assert!(!factory_called);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn order_is_stable_across_lookups() {
        let mut reg = Registry::new();
        reg.get_or_create("b", handle);
        reg.get_or_create("a", handle);
        reg.get_or_create("b", handle);
        assert!(reg.get("a").is_some());
        assert!(reg.get("c").is_none());

        let ids: Vec<String> = reg.ids().iter().map(|id| id.to_string()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert!(!reg.is_empty());
    }

    #[tokio::test]
    async fn request_to_a_dead_actor_resolves_closed() {
        let reg = {
            let mut reg = Registry::new();
            reg.get_or_create("web", handle);
            reg
        };
        let entry = reg.get("web").unwrap();
        let res = entry.request(|reply| Command::Stop { reply }).await;
        assert!(matches!(res, Err(ProcessError::Closed { .. })));
    }
}
