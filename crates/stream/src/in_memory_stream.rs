//! In-memory contract stream for tests/dev.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use tracing::debug;

use factoring_core::ContractId;

use crate::contract_stream::{ContractStream, Predicate, Subscription};
use crate::snapshot::{Contract, Snapshot};

/// In-memory live-set publisher.
///
/// - No IO
/// - One slot: publishing overwrites whatever subscribers have not read yet
/// - Dropping the stream closes every subscription
#[derive(Debug)]
pub struct InMemoryContractStream<T> {
    sender: watch::Sender<Snapshot<T>>,
    revision: AtomicU64,
}

impl<T> InMemoryContractStream<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the live set. Returns the revision assigned to the new snapshot.
    pub fn publish(&self, contracts: Vec<Contract<T>>) -> u64 {
        let revision = self.revision.fetch_add(1, Ordering::SeqCst) + 1;
        let count = contracts.len();
        // send_replace stores the value even when nobody is subscribed yet.
        self.sender.send_replace(Snapshot::new(revision, contracts));
        debug!(revision, contracts = count, "published snapshot");
        revision
    }

    /// Convenience over [`InMemoryContractStream::publish`] for `(contract id, payload)` pairs.
    pub fn publish_records<I, C>(&self, records: I) -> u64
    where
        I: IntoIterator<Item = (C, T)>,
        C: Into<ContractId>,
    {
        let contracts = records
            .into_iter()
            .map(|(cid, payload)| Contract::new(cid.into(), payload))
            .collect();
        self.publish(contracts)
    }

    pub fn current(&self) -> Snapshot<T> {
        self.sender.borrow().clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<T> Default for InMemoryContractStream<T> {
    fn default() -> Self {
        let (sender, _receiver) = watch::channel(Snapshot::empty());
        Self {
            sender,
            revision: AtomicU64::new(0),
        }
    }
}

impl<T> ContractStream<T> for InMemoryContractStream<T>
where
    T: Send + Sync + 'static,
{
    fn subscribe(&self, predicate: Option<Predicate<T>>) -> Subscription<T> {
        Subscription::new(self.sender.subscribe(), predicate)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use tokio_stream::StreamExt;

    #[tokio::test]
    async fn late_subscriber_sees_current_snapshot() {
        let stream = InMemoryContractStream::new();
        stream.publish_records([("#1", 1u32), ("#2", 2u32)]);

        let mut sub = stream.subscribe(None);
        let snapshot = sub.latest();

        assert_eq!(snapshot.revision(), 1);
        assert_eq!(snapshot.len(), 2);
    }

    #[tokio::test]
    async fn newest_snapshot_wins() {
        let stream = InMemoryContractStream::new();
        let mut sub = stream.subscribe(None);

        stream.publish_records([("#1", 1u32)]);
        stream.publish_records([("#1", 1u32), ("#2", 2u32)]);
        stream.publish_records([("#3", 3u32)]);

        assert!(sub.changed().await);
        let snapshot = sub.latest();
        assert_eq!(snapshot.revision(), 3);
        assert_eq!(snapshot.contracts()[0].payload(), &3);
        assert!(!sub.has_changed());
    }

    #[tokio::test]
    async fn predicate_narrows_every_emission() {
        let stream = InMemoryContractStream::new();
        let mut sub = stream.subscribe(Some(Arc::new(|v: &u32| v % 2 == 0)));

        stream.publish_records([("#1", 1u32), ("#2", 2u32), ("#4", 4u32)]);

        let snapshot = sub.latest();
        let values: Vec<u32> = snapshot.iter().map(|c| *c.payload()).collect();
        assert_eq!(values, vec![2, 4]);
    }

    #[tokio::test]
    async fn dropping_the_source_closes_subscriptions() {
        let stream = InMemoryContractStream::<u32>::new();
        let mut sub = stream.subscribe(None);
        drop(stream);

        assert!(!sub.changed().await);
    }

    #[tokio::test]
    async fn into_stream_starts_with_current_snapshot() {
        let stream = InMemoryContractStream::new();
        stream.publish_records([("#1", 7u32)]);

        let mut snapshots = Box::pin(stream.subscribe(None).into_stream());
        let first = snapshots.next().await.unwrap();

        assert_eq!(first.revision(), 1);
    }
}
