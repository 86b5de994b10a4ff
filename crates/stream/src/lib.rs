//! Ledger boundary: contract snapshot streams and the command channel.
//!
//! Everything the read-model knows about the ledger arrives through a [`ContractStream`]
//! (full live-set snapshots, newest wins) and everything it asks of the ledger leaves
//! through a [`Ledger`] command submission.

pub mod command;
pub mod contract_stream;
pub mod in_memory_stream;
pub mod snapshot;

pub use command::{CommandError, Ledger, LedgerCommand, TemplateId};
pub use contract_stream::{ContractStream, Predicate, Subscription};
pub use in_memory_stream::InMemoryContractStream;
pub use snapshot::{Contract, Snapshot};
