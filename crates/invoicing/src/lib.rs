//! Factoring ledger records (read side).
//!
//! Plain data as delivered by the ledger JSON API, plus the exhaustive decoding of the
//! invoice status union. No IO, no derived state.

pub mod auction;
pub mod broker;
pub mod invoice;
pub mod registry;
pub mod status;

pub use auction::{Auction, AuctionStatus, Bid};
pub use broker::{BrokerCustomerBuyer, BrokerCustomerSeller};
pub use invoice::{Invoice, InvoiceKey, Token};
pub use registry::{FactoringRole, InMemoryRegistry, Profile, RegistryLookup, WithRole};
pub use status::{CanonicalStatus, InvoiceStatus, RawStatus, classify};
