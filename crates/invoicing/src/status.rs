//! Invoice status lifecycle.
//!
//! The ledger encodes the status variant as a `{ "tag": ..., "value": ... }` pair. Decoding
//! is exhaustive: every known tag maps to exactly one [`InvoiceStatus`] variant carrying only
//! its own payload, and anything else is an [`DomainError::UnrecognizedStatus`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use factoring_core::{DomainError, DomainResult};

/// Status exactly as delivered by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawStatus {
    pub tag: String,
    #[serde(default)]
    pub value: JsonValue,
}

impl RawStatus {
    pub fn new(tag: impl Into<String>, value: JsonValue) -> Self {
        Self {
            tag: tag.into(),
            value,
        }
    }

    /// Decode into the typed lifecycle variant.
    pub fn decode(&self) -> DomainResult<InvoiceStatus> {
        InvoiceStatus::try_from(self)
    }
}

/// Typed invoice status; transitions are `Open → Live → {Sold | Paid | Pooled}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceStatus {
    Open,
    Live,
    Sold { sold_at: DateTime<Utc> },
    Paid { paid_at: DateTime<Utc> },
    Pooled,
}

impl InvoiceStatus {
    pub fn canonical(&self) -> CanonicalStatus {
        match self {
            InvoiceStatus::Open => CanonicalStatus::Open,
            InvoiceStatus::Live => CanonicalStatus::Live,
            InvoiceStatus::Sold { .. } => CanonicalStatus::Sold,
            InvoiceStatus::Paid { .. } => CanonicalStatus::Paid,
            InvoiceStatus::Pooled => CanonicalStatus::Pooled,
        }
    }

    pub fn sold_at(&self) -> Option<DateTime<Utc>> {
        match self {
            InvoiceStatus::Sold { sold_at } => Some(*sold_at),
            _ => None,
        }
    }

    pub fn paid_at(&self) -> Option<DateTime<Utc>> {
        match self {
            InvoiceStatus::Paid { paid_at } => Some(*paid_at),
            _ => None,
        }
    }

    pub fn to_raw(&self) -> RawStatus {
        match self {
            InvoiceStatus::Open => RawStatus::new(TAG_OPEN, JsonValue::Object(Default::default())),
            InvoiceStatus::Live => RawStatus::new(TAG_LIVE, JsonValue::Object(Default::default())),
            InvoiceStatus::Sold { sold_at } => {
                RawStatus::new(TAG_SOLD, serde_json::json!({ "soldAt": sold_at }))
            }
            InvoiceStatus::Paid { paid_at } => {
                RawStatus::new(TAG_PAID, serde_json::json!({ "paidAt": paid_at }))
            }
            InvoiceStatus::Pooled => {
                RawStatus::new(TAG_POOLED, JsonValue::Object(Default::default()))
            }
        }
    }
}

const TAG_OPEN: &str = "InvoiceOpen";
const TAG_LIVE: &str = "InvoiceLive";
const TAG_SOLD: &str = "InvoiceSold";
const TAG_PAID: &str = "InvoicePaid";
const TAG_POOLED: &str = "InvoicePooled";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SoldPayload {
    sold_at: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaidPayload {
    paid_at: DateTime<Utc>,
}

impl TryFrom<&RawStatus> for InvoiceStatus {
    type Error = DomainError;

    fn try_from(raw: &RawStatus) -> Result<Self, Self::Error> {
        match raw.tag.as_str() {
            TAG_OPEN => Ok(InvoiceStatus::Open),
            TAG_LIVE => Ok(InvoiceStatus::Live),
            TAG_POOLED => Ok(InvoiceStatus::Pooled),
            TAG_SOLD => {
                let payload: SoldPayload = serde_json::from_value(raw.value.clone())
                    .map_err(|e| DomainError::unrecognized_status(format!("{TAG_SOLD}: {e}")))?;
                Ok(InvoiceStatus::Sold {
                    sold_at: payload.sold_at,
                })
            }
            TAG_PAID => {
                let payload: PaidPayload = serde_json::from_value(raw.value.clone())
                    .map_err(|e| DomainError::unrecognized_status(format!("{TAG_PAID}: {e}")))?;
                Ok(InvoiceStatus::Paid {
                    paid_at: payload.paid_at,
                })
            }
            other => Err(DomainError::unrecognized_status(other.to_string())),
        }
    }
}

/// Canonical lifecycle state used for filtering and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CanonicalStatus {
    Open,
    Live,
    Paid,
    Pooled,
    Sold,
}

impl CanonicalStatus {
    pub const ALL: [CanonicalStatus; 5] = [
        CanonicalStatus::Open,
        CanonicalStatus::Live,
        CanonicalStatus::Paid,
        CanonicalStatus::Pooled,
        CanonicalStatus::Sold,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalStatus::Open => "Open",
            CanonicalStatus::Live => "Live",
            CanonicalStatus::Paid => "Paid",
            CanonicalStatus::Pooled => "Pooled",
            CanonicalStatus::Sold => "Sold",
        }
    }
}

impl core::fmt::Display for CanonicalStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for CanonicalStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CanonicalStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::unrecognized_status(s.to_string()))
    }
}

/// Classify a raw ledger status into its canonical lifecycle state.
pub fn classify(raw: &RawStatus) -> DomainResult<CanonicalStatus> {
    raw.decode().map(|status| status.canonical())
}
