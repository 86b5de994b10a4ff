//! Ledger-side adapters.
//!
//! The submission boundary itself ([`factoring_stream::Ledger`]) lives next to the contract
//! streams; this module holds implementations usable without a running ledger.

pub mod in_memory;

pub use in_memory::InMemoryLedger;
