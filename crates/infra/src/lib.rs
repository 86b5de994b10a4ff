//! Read-model runtime: snapshot ingestion, projections, command dispatch, configuration.

pub mod command_dispatcher;
pub mod config;
pub mod ingest;
pub mod ledger;
pub mod projections;
pub mod workers;

pub use command_dispatcher::{
    AuctionTerms, CommandDispatcher, CommandIntent, DispatchError, DispatchOutcome, NewInvoice, SkipReason,
};
pub use config::{ConfigError, ProjectionConfig};
pub use ingest::{Revisions, SnapshotIngestor, SnapshotTriple};
pub use ledger::InMemoryLedger;
pub use projections::{
    InvoiceFilter, InvoiceQuery, InvoiceSummary, InvoicesPage, InvoicesProjection, JoinedInvoiceView, SortMode,
    Viewer,
};
pub use workers::{ProjectionWorker, WorkerHandle};
