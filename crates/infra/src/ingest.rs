//! Snapshot ingestion: the three latest snapshots a recompute works from.
//!
//! Each input is a watch-backed [`Subscription`], so only the newest snapshot of each stream
//! is ever observed. A recompute triggered while one stream lags simply uses that stream's
//! previous complete snapshot; nothing is half-applied.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use factoring_core::PartyId;
use factoring_invoicing::{Auction, BrokerCustomerSeller, Invoice};
use factoring_stream::{ContractStream, Predicate, Snapshot, Subscription};

use crate::projections::auction_join::auction_tokens;

/// Per-stream revision of the snapshots behind a projection.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Revisions {
    pub invoices: u64,
    pub auctions: u64,
    pub broker_sellers: u64,
}

/// The latest complete snapshot of each input.
#[derive(Debug, Clone, Default)]
pub struct SnapshotTriple {
    pub invoices: Snapshot<Invoice>,
    pub auctions: Snapshot<Auction>,
    pub broker_sellers: Snapshot<BrokerCustomerSeller>,
}

impl SnapshotTriple {
    pub fn new(
        invoices: Snapshot<Invoice>,
        auctions: Snapshot<Auction>,
        broker_sellers: Snapshot<BrokerCustomerSeller>,
    ) -> Self {
        Self {
            invoices,
            auctions,
            broker_sellers,
        }
    }

    pub fn revisions(&self) -> Revisions {
        Revisions {
            invoices: self.invoices.revision(),
            auctions: self.auctions.revision(),
            broker_sellers: self.broker_sellers.revision(),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Closed {
    invoices: bool,
    auctions: bool,
    broker_sellers: bool,
}

impl Closed {
    fn all(&self) -> bool {
        self.invoices && self.auctions && self.broker_sellers
    }
}

/// Owns the three subscriptions of one projection.
#[derive(Debug)]
pub struct SnapshotIngestor {
    invoices: Subscription<Invoice>,
    auctions: Subscription<Auction>,
    broker_sellers: Subscription<BrokerCustomerSeller>,
    closed: Closed,
}

impl SnapshotIngestor {
    pub fn new(
        invoices: Subscription<Invoice>,
        auctions: Subscription<Auction>,
        broker_sellers: Subscription<BrokerCustomerSeller>,
    ) -> Self {
        Self {
            invoices,
            auctions,
            broker_sellers,
            closed: Closed::default(),
        }
    }

    /// Subscribe to all three streams; broker relationships are narrowed to `party`'s own.
    pub fn subscribe<I, A, B>(invoices: &I, auctions: &A, broker_sellers: &B, party: &PartyId) -> Self
    where
        I: ContractStream<Invoice> + ?Sized,
        A: ContractStream<Auction> + ?Sized,
        B: ContractStream<BrokerCustomerSeller> + ?Sized,
    {
        let party = party.clone();
        let own: Predicate<BrokerCustomerSeller> =
            Arc::new(move |rel: &BrokerCustomerSeller| rel.broker_customer == party);

        Self::new(
            invoices.subscribe(None),
            auctions.subscribe(None),
            broker_sellers.subscribe(Some(own)),
        )
    }

    /// The latest snapshot of each stream, marking all three as seen.
    ///
    /// Auctions are narrowed to the tokens of invoices past `Open`.
    pub fn current(&mut self) -> SnapshotTriple {
        let invoices = self.invoices.latest();
        let tokens: HashSet<String> = auction_tokens(&invoices);
        let auctions = self
            .auctions
            .latest()
            .retain(|auction| tokens.contains(auction.key()));

        SnapshotTriple::new(invoices, auctions, self.broker_sellers.latest())
    }

    /// Wait for any stream to move, then return the new triple.
    ///
    /// Returns `None` once every stream is closed. A closed stream keeps contributing its
    /// last snapshot while the others are still live.
    pub async fn next(&mut self) -> Option<SnapshotTriple> {
        loop {
            if self.closed.all() {
                return None;
            }

            let Self {
                invoices,
                auctions,
                broker_sellers,
                closed,
            } = &mut *self;

            let woke = tokio::select! {
                open = invoices.changed(), if !closed.invoices => {
                    closed.invoices = !open;
                    open
                }
                open = auctions.changed(), if !closed.auctions => {
                    closed.auctions = !open;
                    open
                }
                open = broker_sellers.changed(), if !closed.broker_sellers => {
                    closed.broker_sellers = !open;
                    open
                }
                else => false,
            };

            if woke {
                return Some(self.current());
            }
            debug!(closed = ?self.closed, "snapshot stream closed");
        }
    }
}
