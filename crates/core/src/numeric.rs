//! Parse boundary for ledger decimal and calendar-date text.
//!
//! The ledger JSON API delivers `Decimal` and `Date` fields as strings. They are carried
//! verbatim inside records and only turned into `rust_decimal::Decimal` / `NaiveDate` at the
//! point of use, so a malformed field degrades a single computation instead of failing the
//! whole snapshot decode.

use core::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Ledger date format (`Date` fields).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Decimal quantity as delivered by the ledger (e.g. `"1000.50"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Numeric(String);

impl Numeric {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn zero() -> Self {
        Self("0".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse exactly. Values that would need rounding are rejected, not truncated.
    pub fn parse(&self, field: &'static str) -> DomainResult<Decimal> {
        Decimal::from_str_exact(self.0.trim())
            .map_err(|_| DomainError::malformed_numeric(field, self.0.clone()))
    }

    /// Parse and require a strictly positive value.
    pub fn parse_positive(&self, field: &'static str) -> DomainResult<Decimal> {
        let value = self.parse(field)?;
        if value <= Decimal::ZERO {
            return Err(DomainError::validation(format!("{field} must be positive")));
        }
        Ok(value)
    }
}

impl From<Decimal> for Numeric {
    fn from(value: Decimal) -> Self {
        Self(value.normalize().to_string())
    }
}

impl From<&str> for Numeric {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl core::fmt::Display for Numeric {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Calendar date as delivered by the ledger (`YYYY-MM-DD`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalendarDate(String);

impl CalendarDate {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn parse(&self, field: &'static str) -> DomainResult<NaiveDate> {
        NaiveDate::parse_from_str(self.0.trim(), DATE_FORMAT)
            .map_err(|_| DomainError::malformed_date(field, self.0.clone()))
    }
}

impl From<NaiveDate> for CalendarDate {
    fn from(value: NaiveDate) -> Self {
        Self(value.format(DATE_FORMAT).to_string())
    }
}

impl From<&str> for CalendarDate {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl FromStr for CalendarDate {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let date = CalendarDate::new(s);
        date.parse("date")?;
        Ok(date)
    }
}

impl core::fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
