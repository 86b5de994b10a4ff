//! Filter and sort over joined invoice rows.
//!
//! Pure function of `(rows, filter, sort)`: the input is never reordered in place and the
//! output is a fresh `Vec`. Sorting is stable; rows whose sort key is missing (malformed
//! amount or due date) always come after every row with a key, in both directions.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use factoring_core::{DomainError, PartyId};
use factoring_invoicing::CanonicalStatus;

/// Fields the pipeline filters and sorts on.
pub trait FilterRow {
    fn payer(&self) -> &PartyId;
    fn initial_owner(&self) -> &PartyId;
    fn canonical_status(&self) -> CanonicalStatus;
    fn amount(&self) -> Option<Decimal>;
    fn due_date(&self) -> Option<NaiveDate>;
}

impl<R: FilterRow + ?Sized> FilterRow for std::sync::Arc<R> {
    fn payer(&self) -> &PartyId {
        (**self).payer()
    }

    fn initial_owner(&self) -> &PartyId {
        (**self).initial_owner()
    }

    fn canonical_status(&self) -> CanonicalStatus {
        (**self).canonical_status()
    }

    fn amount(&self) -> Option<Decimal> {
        (**self).amount()
    }

    fn due_date(&self) -> Option<NaiveDate> {
        (**self).due_date()
    }
}

/// Either a wildcard or an exact value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Criterion<T> {
    Any,
    Exactly(T),
}

impl<T: PartialEq> Criterion<T> {
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Criterion::Any => true,
            Criterion::Exactly(expected) => expected == value,
        }
    }
}

/// Conjunction of payer, seller (initial owner) and status-set criteria.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceFilter {
    pub payer: Criterion<PartyId>,
    pub seller: Criterion<PartyId>,
    pub statuses: BTreeSet<CanonicalStatus>,
}

impl Default for InvoiceFilter {
    /// Wildcards and every status selected.
    fn default() -> Self {
        Self {
            payer: Criterion::Any,
            seller: Criterion::Any,
            statuses: CanonicalStatus::ALL.into_iter().collect(),
        }
    }
}

impl InvoiceFilter {
    pub fn with_payer(mut self, payer: PartyId) -> Self {
        self.payer = Criterion::Exactly(payer);
        self
    }

    pub fn with_seller(mut self, seller: PartyId) -> Self {
        self.seller = Criterion::Exactly(seller);
        self
    }

    pub fn with_statuses(mut self, statuses: impl IntoIterator<Item = CanonicalStatus>) -> Self {
        self.statuses = statuses.into_iter().collect();
        self
    }

    pub fn matches<R: FilterRow + ?Sized>(&self, row: &R) -> bool {
        self.payer.matches(row.payer())
            && self.seller.matches(row.initial_owner())
            && self.statuses.contains(&row.canonical_status())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SortMode {
    AmountAscending,
    AmountDescending,
    DueDateAscending,
    DueDateDescending,
    PayerAscending,
    PayerDescending,
}

impl SortMode {
    pub const ALL: [SortMode; 6] = [
        SortMode::AmountAscending,
        SortMode::AmountDescending,
        SortMode::DueDateAscending,
        SortMode::DueDateDescending,
        SortMode::PayerAscending,
        SortMode::PayerDescending,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::AmountAscending => "amount_ascending",
            SortMode::AmountDescending => "amount_descending",
            SortMode::DueDateAscending => "due_date_ascending",
            SortMode::DueDateDescending => "due_date_descending",
            SortMode::PayerAscending => "payer_ascending",
            SortMode::PayerDescending => "payer_descending",
        }
    }

    /// Compare two rows under this mode.
    ///
    /// Payer names compare byte-wise (no locale collation).
    pub fn compare<R: FilterRow + ?Sized>(&self, a: &R, b: &R) -> Ordering {
        match self {
            SortMode::AmountAscending => keyed(a.amount(), b.amount(), false),
            SortMode::AmountDescending => keyed(a.amount(), b.amount(), true),
            SortMode::DueDateAscending => keyed(a.due_date(), b.due_date(), false),
            SortMode::DueDateDescending => keyed(a.due_date(), b.due_date(), true),
            SortMode::PayerAscending => a.payer().as_str().cmp(b.payer().as_str()),
            SortMode::PayerDescending => b.payer().as_str().cmp(a.payer().as_str()),
        }
    }
}

impl core::str::FromStr for SortMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortMode::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::validation(format!("unknown sort mode: {s}")))
    }
}

// Missing keys sort last regardless of direction.
fn keyed<K: Ord>(a: Option<K>, b: Option<K>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) if descending => b.cmp(&a),
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Apply `filter` then an optional stable `sort`; `None` keeps arrival order.
pub fn filter_and_sort<R>(rows: &[R], filter: &InvoiceFilter, sort: Option<SortMode>) -> Vec<R>
where
    R: FilterRow + Clone,
{
    let mut out: Vec<R> = rows.iter().filter(|row| filter.matches(*row)).cloned().collect();
    if let Some(mode) = sort {
        out.sort_by(|a, b| mode.compare(a, b));
    }
    out
}
