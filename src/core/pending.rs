//! # Eagerly-dispatched operation results.
//!
//! Every host operation queues its commands *before* returning a [`Pending`]. The
//! future only observes the outcome:
//! - awaiting it yields the terminal result of the transition,
//! - dropping it does **not** cancel the transition.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use tokio::sync::oneshot;

use crate::error::ProcessError;

/// Outcome of a host operation, resolved on the terminal event of the affected entries.
#[must_use = "the operation runs regardless; await the Pending to observe its outcome"]
pub struct Pending<T> {
    inner: BoxFuture<'static, Result<T, ProcessError>>,
}

impl<T: Send + 'static> Pending<T> {
    /// Already resolved.
    pub(crate) fn ready(value: T) -> Self {
        Self {
            inner: futures::future::ready(Ok(value)).boxed(),
        }
    }

    /// Resolves with whatever the entry actor replies; a dropped reply means the actor is gone.
    pub(crate) fn from_reply(
        id: Arc<str>,
        rx: oneshot::Receiver<Result<T, ProcessError>>,
    ) -> Self {
        Self {
            inner: async move { rx.await.unwrap_or(Err(ProcessError::Closed { id })) }.boxed(),
        }
    }

    /// Waits for every part, then resolves with all values (in order) or the first error.
    pub(crate) fn all(parts: Vec<Pending<T>>) -> Pending<Vec<T>> {
        Pending {
            inner: async move { join_all(parts).await.into_iter().collect() }.boxed(),
        }
    }

    /// Transforms the resolved value.
    pub(crate) fn map<U, F>(self, f: F) -> Pending<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        Pending {
            inner: self.inner.map(|res| res.map(f)).boxed(),
        }
    }
}

impl<T> Future for Pending<T> {
    type Output = Result<T, ProcessError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

impl<T> std::fmt::Debug for Pending<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pending").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dropped_reply_resolves_as_closed() {
        let (tx, rx) = oneshot::channel::<Result<u8, ProcessError>>();
        drop(tx);
        let err = Pending::from_reply("web".into(), rx).await.unwrap_err();
        assert_eq!(err, ProcessError::Closed { id: "web".into() });
    }

    #[tokio::test]
    async fn all_waits_for_every_part_and_keeps_order() {
        let (tx1, rx1) = oneshot::channel();
        let (tx2, rx2) = oneshot::channel();
        let joined = Pending::all(vec![
            Pending::from_reply("a".into(), rx1),
            Pending::from_reply("b".into(), rx2),
        ]);
        tx2.send(Ok(2)).unwrap();
        tx1.send(Ok(1)).unwrap();
        assert_eq!(joined.await.unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn all_reports_the_first_error() {
        let failed = ProcessError::Spawn {
            id: "b".into(),
            reason: "nope".into(),
        };
        let (tx, rx) = oneshot::channel();
        tx.send(Err(failed.clone())).unwrap();
        let joined = Pending::all(vec![Pending::ready(1), Pending::from_reply("b".into(), rx)]);
        assert_eq!(joined.await.unwrap_err(), failed);
    }
}
