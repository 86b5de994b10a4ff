//! Invoice ⋈ auction join on the token label.
//!
//! Only invoices whose status is past `Open` take part; an open invoice has never been
//! offered, so it never carries an auction even if one with a matching label exists.

use std::collections::{HashMap, HashSet};

use tracing::{debug, error, warn};

use factoring_core::{ContractId, DomainError};
use factoring_invoicing::{Auction, Invoice, InvoiceKey, InvoiceStatus};
use factoring_stream::{Contract, Snapshot};

/// An invoice record dropped from the projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRecord {
    pub contract_id: ContractId,
    pub key: InvoiceKey,
    pub error: DomainError,
}

/// One invoice with its decoded status and, when offered, its auction.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedInvoice {
    pub invoice: Contract<Invoice>,
    pub status: InvoiceStatus,
    pub auction: Option<Contract<Auction>>,
}

#[derive(Debug, Clone, Default)]
pub struct JoinOutcome {
    /// Joined rows in invoice snapshot order.
    pub joined: Vec<JoinedInvoice>,
    pub rejected: Vec<RejectedRecord>,
}

/// Auctions indexed by token label.
///
/// When two live auctions share a label the first one in snapshot order wins.
#[derive(Debug, Default)]
pub struct AuctionIndex {
    by_token: HashMap<String, Contract<Auction>>,
}

impl AuctionIndex {
    pub fn build(auctions: &Snapshot<Auction>) -> Self {
        let mut by_token: HashMap<String, Contract<Auction>> = HashMap::with_capacity(auctions.len());

        for contract in auctions.iter() {
            let token = contract.payload().key();
            if let Some(kept) = by_token.get(token) {
                warn!(
                    token = %token,
                    kept = %kept.contract_id(),
                    ignored = %contract.contract_id(),
                    "duplicate auction for token"
                );
                continue;
            }
            by_token.insert(token.to_string(), contract.clone());
        }

        Self { by_token }
    }

    pub fn get(&self, token: &str) -> Option<&Contract<Auction>> {
        self.by_token.get(token)
    }

    pub fn len(&self) -> usize {
        self.by_token.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_token.is_empty()
    }
}

/// Token labels whose auctions are worth fetching: those of invoices past `Open`.
///
/// Invoices with an unrecognized status contribute nothing.
pub fn auction_tokens(invoices: &Snapshot<Invoice>) -> HashSet<String> {
    invoices
        .iter()
        .map(Contract::payload)
        .filter(|invoice| matches!(invoice.decoded_status(), Ok(status) if status != InvoiceStatus::Open))
        .map(|invoice| invoice.token.label.clone())
        .collect()
}

/// Join every invoice with the auction sharing its token label.
///
/// Pure: the same snapshot pair always yields the same rows, sharing the snapshots'
/// payload allocations. Invoices with an unrecognized status are returned in
/// `rejected` and logged; the rest of the snapshot is unaffected.
pub fn join_auctions(invoices: &Snapshot<Invoice>, auctions: &Snapshot<Auction>) -> JoinOutcome {
    let index = AuctionIndex::build(auctions);
    let mut outcome = JoinOutcome {
        joined: Vec::with_capacity(invoices.len()),
        rejected: Vec::new(),
    };

    for contract in invoices.iter() {
        let invoice = contract.payload();
        let status = match invoice.decoded_status() {
            Ok(status) => status,
            Err(err) => {
                error!(
                    contract_id = %contract.contract_id(),
                    invoice = %invoice.key(),
                    error = %err,
                    "invoice rejected"
                );
                outcome.rejected.push(RejectedRecord {
                    contract_id: contract.contract_id().clone(),
                    key: invoice.key(),
                    error: err,
                });
                continue;
            }
        };

        let auction = if status == InvoiceStatus::Open {
            None
        } else {
            let found = index.get(&invoice.token.label).cloned();
            if found.is_none() {
                debug!(
                    invoice = %invoice.key(),
                    token = %invoice.token.label,
                    "no auction for offered invoice yet"
                );
            }
            found
        };

        outcome.joined.push(JoinedInvoice {
            invoice: contract.clone(),
            status,
            auction,
        });
    }

    outcome
}
