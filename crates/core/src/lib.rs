//! `factoring-core` — foundation types shared by the factoring read-model.
//!
//! This crate contains **pure** primitives (no IO, no async): identifiers, the error
//! model, and the parse boundary for ledger decimal and date text.

pub mod entity;
pub mod error;
pub mod id;
pub mod numeric;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{ContractId, PartyId};
pub use numeric::{CalendarDate, Numeric};
