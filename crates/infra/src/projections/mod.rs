//! Projection implementations (read model builders).
//!
//! Every projection here is a pure function of the latest snapshots:
//! - **Rebuildable**: recomputed wholesale, never patched
//! - **Idempotent**: the same snapshots always yield the same rows
//! - **Tolerant**: one bad record is reported, not fatal to the batch

pub mod auction_join;
pub mod bid_aggregator;
pub mod broker_users;
pub mod filter_sort;
pub mod invoices_view;

pub use auction_join::{AuctionIndex, JoinOutcome, JoinedInvoice, RejectedRecord, auction_tokens, join_auctions};
pub use bid_aggregator::{AccountingRegime, BidAggregate, BidAggregator, BidRanking, PriceRanking, RankedBid};
pub use broker_users::broker_users;
pub use filter_sort::{Criterion, FilterRow, InvoiceFilter, SortMode, filter_and_sort};
pub use invoices_view::{
    InvoiceQuery, InvoiceSummary, InvoicesPage, InvoicesProjection, JoinedInvoiceView, ProjectionState, Viewer,
    ViewerActions,
};
