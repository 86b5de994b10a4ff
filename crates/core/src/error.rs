//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic failures found while reading ledger records or
/// validating user input. Ledger transport failures belong to the command boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. an empty form field).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A decimal field could not be parsed exactly.
    #[error("malformed numeric in `{field}`: {value:?}")]
    MalformedNumeric { field: &'static str, value: String },

    /// A calendar date field was not `YYYY-MM-DD`.
    #[error("malformed date in `{field}`: {value:?}")]
    MalformedDate { field: &'static str, value: String },

    /// A status tag outside the known lifecycle variants (or a known tag with a bad payload).
    #[error("unrecognized status: {0}")]
    UnrecognizedStatus(String),

    /// An identifier was invalid (e.g. empty party).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A referenced record is not in the latest snapshot.
    #[error("not found")]
    NotFound,
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn malformed_numeric(field: &'static str, value: impl Into<String>) -> Self {
        Self::MalformedNumeric {
            field,
            value: value.into(),
        }
    }

    pub fn malformed_date(field: &'static str, value: impl Into<String>) -> Self {
        Self::MalformedDate {
            field,
            value: value.into(),
        }
    }

    pub fn unrecognized_status(msg: impl Into<String>) -> Self {
        Self::UnrecognizedStatus(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}
