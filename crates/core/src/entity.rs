//! Entity trait: identity that survives across snapshots.

/// Entity marker + minimal interface.
///
/// Ledger records are re-delivered in every snapshot under a fresh contract id when they
/// change; `id()` is the business identity that stays stable across those archives.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}
