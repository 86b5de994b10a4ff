//! Invoices read model: joined, aggregated and decorated rows for one viewer.
//!
//! The projection is recomputed wholesale from the latest [`SnapshotTriple`]; nothing is
//! patched incrementally. Queries (filter + sort + summary) run against a computed
//! [`ProjectionState`] and never touch the snapshots again.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use factoring_core::{CalendarDate, ContractId, DomainError, PartyId};
use factoring_invoicing::{
    Auction, BrokerCustomerSeller, CanonicalStatus, FactoringRole, Invoice, InvoiceStatus,
};
use factoring_stream::{Contract, Snapshot};

use crate::config::ProjectionConfig;
use crate::ingest::{Revisions, SnapshotTriple};
use crate::projections::auction_join::{JoinedInvoice, RejectedRecord, join_auctions};
use crate::projections::bid_aggregator::{BidAggregate, BidAggregator};
use crate::projections::filter_sort::{FilterRow, InvoiceFilter, SortMode, filter_and_sort};

/// The party looking at the projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub party: PartyId,
    pub operator: PartyId,
    pub role: FactoringRole,
}

impl Viewer {
    pub fn new(party: PartyId, operator: PartyId, role: FactoringRole) -> Self {
        Self {
            party,
            operator,
            role,
        }
    }
}

/// Which row actions the viewer may trigger.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct ViewerActions {
    pub show_send_to_broker: bool,
    pub show_seller_actions: bool,
}

/// One invoice row with its auction economics.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedInvoiceView {
    pub invoice: Contract<Invoice>,
    pub status: InvoiceStatus,
    /// Absent both when the invoice was never offered and when the auction has not arrived.
    pub auction: Option<Contract<Auction>>,
    pub aggregate: BidAggregate,
    /// Parsed amount; `None` when the ledger text is not an exact decimal.
    pub amount: Option<Decimal>,
    pub due_date: Option<NaiveDate>,
    /// `amount × auction minimum price`, or `amount` when there is no auction.
    pub minimum_proceeds: Option<Decimal>,
    pub actions: ViewerActions,
}

impl JoinedInvoiceView {
    pub fn contract_id(&self) -> &ContractId {
        self.invoice.contract_id()
    }

    pub fn record(&self) -> &Invoice {
        self.invoice.payload()
    }

    pub fn auction_record(&self) -> Option<&Auction> {
        self.auction.as_ref().map(Contract::payload)
    }

    pub fn auction_end_date(&self) -> Option<&CalendarDate> {
        self.auction_record().map(|auction| &auction.end_date)
    }

    pub fn bid_count(&self) -> usize {
        self.aggregate.bid_count
    }

    pub fn sold_at(&self) -> Option<DateTime<Utc>> {
        self.status.sold_at()
    }

    pub fn paid_at(&self) -> Option<DateTime<Utc>> {
        self.status.paid_at()
    }
}

impl FilterRow for JoinedInvoiceView {
    fn payer(&self) -> &PartyId {
        &self.record().payer
    }

    fn initial_owner(&self) -> &PartyId {
        &self.record().initial_owner
    }

    fn canonical_status(&self) -> CanonicalStatus {
        self.status.canonical()
    }

    fn amount(&self) -> Option<Decimal> {
        self.amount
    }

    fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }
}

/// Count and exact total of a set of rows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InvoiceSummary {
    pub count: usize,
    pub total_amount: Decimal,
    /// Rows counted but left out of `total_amount`.
    pub malformed_amounts: usize,
}

impl InvoiceSummary {
    pub fn of<R: FilterRow>(rows: &[R]) -> Self {
        rows.iter().fold(Self::default(), |mut summary, row| {
            summary.count += 1;
            match row.amount().map(|amount| (amount, summary.total_amount.checked_add(amount))) {
                Some((_, Some(total))) => summary.total_amount = total,
                Some((amount, None)) => {
                    let err = DomainError::malformed_numeric("invoice.amount", amount.to_string());
                    warn!(error = %err, "invoice amount overflows summary total");
                    summary.malformed_amounts += 1;
                }
                None => summary.malformed_amounts += 1,
            }
            summary
        })
    }
}

/// Filter and sort requested by the viewer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InvoiceQuery {
    pub filter: InvoiceFilter,
    pub sort: Option<SortMode>,
}

impl InvoiceQuery {
    pub fn new(filter: InvoiceFilter, sort: Option<SortMode>) -> Self {
        Self { filter, sort }
    }
}

/// Everything needed to render the invoice list.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoicesPage {
    pub revisions: Revisions,
    pub rows: Vec<Arc<JoinedInvoiceView>>,
    pub summary: InvoiceSummary,
    pub payers: Vec<PartyId>,
    pub sellers: Vec<PartyId>,
    pub rejected: Vec<RejectedRecord>,
}

/// Result of one recompute.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProjectionState {
    pub revisions: Revisions,
    /// All accepted rows, in invoice snapshot order.
    pub rows: Vec<Arc<JoinedInvoiceView>>,
    pub rejected: Vec<RejectedRecord>,
    /// Distinct payers over every invoice, first-seen order.
    pub payers: Vec<PartyId>,
    /// Distinct initial owners and sellers over every invoice, first-seen order.
    pub sellers: Vec<PartyId>,
}

impl ProjectionState {
    pub fn query(&self, query: &InvoiceQuery) -> InvoicesPage {
        let rows = filter_and_sort(&self.rows, &query.filter, query.sort);
        InvoicesPage {
            revisions: self.revisions,
            summary: InvoiceSummary::of(&rows),
            rows,
            payers: self.payers.clone(),
            sellers: self.sellers.clone(),
            rejected: self.rejected.clone(),
        }
    }
}

/// Builds [`ProjectionState`]s for one viewer.
#[derive(Debug, Clone)]
pub struct InvoicesProjection {
    viewer: Viewer,
    aggregator: BidAggregator,
}

impl InvoicesProjection {
    pub fn new(viewer: Viewer, aggregator: BidAggregator) -> Self {
        Self { viewer, aggregator }
    }

    pub fn from_config(config: &ProjectionConfig) -> Self {
        Self::new(
            config.viewer(),
            BidAggregator::with_ranking(config.bid_ranking),
        )
    }

    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    /// Join, aggregate and decorate the latest snapshots.
    pub fn recompute(&self, snapshots: &SnapshotTriple) -> ProjectionState {
        let outcome = join_auctions(&snapshots.invoices, &snapshots.auctions);
        let has_broker = has_broker_relationship(&snapshots.broker_sellers, &self.viewer.party);

        let rows: Vec<Arc<JoinedInvoiceView>> = outcome
            .joined
            .into_iter()
            .map(|joined| Arc::new(self.decorate(joined, has_broker)))
            .collect();

        let (payers, sellers) = filter_options(&snapshots.invoices);
        let revisions = snapshots.revisions();

        debug!(
            invoices = revisions.invoices,
            auctions = revisions.auctions,
            broker_sellers = revisions.broker_sellers,
            rows = rows.len(),
            rejected = outcome.rejected.len(),
            "invoices projection recomputed"
        );

        ProjectionState {
            revisions,
            rows,
            rejected: outcome.rejected,
            payers,
            sellers,
        }
    }

    fn decorate(&self, joined: JoinedInvoice, has_broker: bool) -> JoinedInvoiceView {
        let JoinedInvoice {
            invoice,
            status,
            auction,
        } = joined;
        let record = invoice.payload();

        let aggregate = self.aggregator.aggregate(auction.as_ref().map(Contract::payload));

        let amount = record
            .amount
            .parse("invoice.amount")
            .inspect_err(|err| warn!(invoice = %record.key(), error = %err, "invoice amount unusable"))
            .ok();
        let due_date = record
            .due_date
            .parse("invoice.dueDate")
            .inspect_err(|err| warn!(invoice = %record.key(), error = %err, "invoice due date unusable"))
            .ok();

        let minimum_price = match auction.as_ref() {
            None => Some(Decimal::ONE),
            Some(contract) => contract
                .payload()
                .minimum_price
                .parse("auction.minimumPrice")
                .inspect_err(|err| {
                    warn!(auction = %contract.contract_id(), error = %err, "auction minimum price unusable")
                })
                .ok(),
        };
        let minimum_proceeds = amount.zip(minimum_price).and_then(|(a, p)| {
            let product = a.checked_mul(p);
            if product.is_none() {
                let err = DomainError::malformed_numeric("invoice.amount", record.amount.as_str());
                warn!(invoice = %record.key(), error = %err, "minimum proceeds overflow");
            }
            product
        });

        let actions = ViewerActions {
            show_send_to_broker: self.viewer.role != FactoringRole::Broker
                && record.seller == self.viewer.party
                && has_broker,
            show_seller_actions: record.seller == self.viewer.party
                || status == InvoiceStatus::Live,
        };

        JoinedInvoiceView {
            invoice,
            status,
            auction,
            aggregate,
            amount,
            due_date,
            minimum_proceeds,
            actions,
        }
    }
}

fn has_broker_relationship(relationships: &Snapshot<BrokerCustomerSeller>, party: &PartyId) -> bool {
    relationships
        .iter()
        .any(|contract| &contract.payload().broker_customer == party)
}

fn filter_options(invoices: &Snapshot<Invoice>) -> (Vec<PartyId>, Vec<PartyId>) {
    let mut payers: Vec<PartyId> = Vec::new();
    let mut sellers: Vec<PartyId> = Vec::new();

    for invoice in invoices.iter().map(Contract::payload) {
        push_distinct(&mut payers, &invoice.payer);
        push_distinct(&mut sellers, &invoice.initial_owner);
    }
    for invoice in invoices.iter().map(Contract::payload) {
        push_distinct(&mut sellers, &invoice.seller);
    }

    (payers, sellers)
}

fn push_distinct(values: &mut Vec<PartyId>, value: &PartyId) {
    if !values.contains(value) {
        values.push(value.clone());
    }
}
