use serde::{Deserialize, Serialize};

use factoring_core::{CalendarDate, DomainResult, Entity, Numeric, PartyId};

use crate::status::{CanonicalStatus, InvoiceStatus, RawStatus};

/// Token identifying the asset an invoice is sold as; its label is the auction key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub label: String,
}

impl Token {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

/// Business identity of an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InvoiceKey {
    pub payer: PartyId,
    pub seller: PartyId,
    pub invoice_number: String,
}

impl core::fmt::Display for InvoiceKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}/{}", self.seller, self.payer, self.invoice_number)
    }
}

/// Invoice contract payload.
///
/// Amount and dates are kept as ledger text; see [`factoring_core::numeric`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub operator: PartyId,
    pub payer: PartyId,
    pub seller: PartyId,
    pub initial_owner: PartyId,
    pub invoice_number: String,
    pub amount: Numeric,
    pub issue_date: CalendarDate,
    pub due_date: CalendarDate,
    pub token: Token,
    pub status: RawStatus,
}

impl Invoice {
    pub fn key(&self) -> InvoiceKey {
        InvoiceKey {
            payer: self.payer.clone(),
            seller: self.seller.clone(),
            invoice_number: self.invoice_number.clone(),
        }
    }

    pub fn decoded_status(&self) -> DomainResult<InvoiceStatus> {
        self.status.decode()
    }

    pub fn canonical_status(&self) -> DomainResult<CanonicalStatus> {
        crate::status::classify(&self.status)
    }
}

impl Entity for Invoice {
    type Id = InvoiceKey;

    fn id(&self) -> Self::Id {
        self.key()
    }
}
