//! Snapshot subscription abstraction (mechanics only).
//!
//! A contract stream publishes the **full live set** of one contract type every time the
//! ledger changes it. Consumers only ever care about the newest emission:
//!
//! - **Latest wins**: intermediate snapshots a slow consumer never looked at are dropped
//! - **No deltas**: every emission is complete, so there is nothing to replay or reorder
//! - **Restartable**: a new subscriber immediately sees the current snapshot
//!
//! The in-process transport is a `tokio::sync::watch` channel, which has exactly these
//! semantics (one slot, overwritten on send).

use std::sync::Arc;

use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::{Stream, StreamExt};

use crate::snapshot::Snapshot;

/// Optional server-side style filter applied to every emission of a subscription.
pub type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// A subscription to a contract stream.
///
/// ## Usage Pattern
///
/// ```ignore
/// let mut invoices = stream.subscribe(None);
/// render(invoices.latest());
/// while invoices.changed().await {
///     render(invoices.latest());
/// }
/// ```
///
/// Subscriptions are designed for a single consumer; clone the stream's subscription
/// instead of sharing one across tasks.
pub struct Subscription<T> {
    receiver: watch::Receiver<Snapshot<T>>,
    predicate: Option<Predicate<T>>,
}

impl<T> Subscription<T> {
    pub fn new(receiver: watch::Receiver<Snapshot<T>>, predicate: Option<Predicate<T>>) -> Self {
        Self {
            receiver,
            predicate,
        }
    }

    /// The newest snapshot, marked as seen.
    pub fn latest(&mut self) -> Snapshot<T> {
        let snapshot = self.receiver.borrow_and_update().clone();
        self.narrow(snapshot)
    }

    /// The newest snapshot without marking it as seen.
    pub fn peek(&self) -> Snapshot<T> {
        let snapshot = self.receiver.borrow().clone();
        self.narrow(snapshot)
    }

    /// Wait until a snapshot newer than the last one seen arrives.
    ///
    /// Returns `false` once the stream is closed (its source was dropped); the last
    /// snapshot stays readable through [`Subscription::latest`].
    pub async fn changed(&mut self) -> bool {
        self.receiver.changed().await.is_ok()
    }

    /// Whether a snapshot newer than the last one seen is waiting.
    pub fn has_changed(&self) -> bool {
        self.receiver.has_changed().unwrap_or(false)
    }

    fn narrow(&self, snapshot: Snapshot<T>) -> Snapshot<T> {
        match &self.predicate {
            Some(keep) => snapshot.retain(|payload| keep(payload)),
            None => snapshot,
        }
    }
}

impl<T> Subscription<T>
where
    T: Send + Sync + 'static,
{
    /// Lazy stream of snapshots, starting with the current one.
    pub fn into_stream(self) -> impl Stream<Item = Snapshot<T>> {
        let predicate = self.predicate;
        WatchStream::new(self.receiver).map(move |snapshot| match &predicate {
            Some(keep) => snapshot.retain(|payload| keep(payload)),
            None => snapshot,
        })
    }
}

impl<T> Clone for Subscription<T> {
    fn clone(&self) -> Self {
        Self {
            receiver: self.receiver.clone(),
            predicate: self.predicate.clone(),
        }
    }
}

impl<T> core::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Subscription")
            .field("revision", &self.receiver.borrow().revision())
            .field("filtered", &self.predicate.is_some())
            .finish()
    }
}

/// Source of full live-set snapshots for one contract type.
///
/// Implementations must deliver complete snapshots (never deltas) and keep only the
/// newest one for late subscribers. Deduplication and ordering of the underlying ledger
/// transactions are the ledger's responsibility.
pub trait ContractStream<T>: Send + Sync {
    fn subscribe(&self, predicate: Option<Predicate<T>>) -> Subscription<T>;
}

impl<T, S> ContractStream<T> for Arc<S>
where
    S: ContractStream<T> + ?Sized,
{
    fn subscribe(&self, predicate: Option<Predicate<T>>) -> Subscription<T> {
        (**self).subscribe(predicate)
    }
}
