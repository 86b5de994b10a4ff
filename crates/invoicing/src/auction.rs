use serde::{Deserialize, Serialize};

use factoring_core::{CalendarDate, Numeric, PartyId};

use crate::invoice::Token;

/// Auction lifecycle as delivered by the ledger.
///
/// Only `AuctionOpen` changes the accounting regime; every other state is treated as
/// settled. Unknown states are kept verbatim rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AuctionStatus {
    Open,
    Closed,
    Other(String),
}

impl AuctionStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, AuctionStatus::Open)
    }
}

impl From<String> for AuctionStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "AuctionOpen" => AuctionStatus::Open,
            "AuctionClosed" => AuctionStatus::Closed,
            _ => AuctionStatus::Other(value),
        }
    }
}

impl From<AuctionStatus> for String {
    fn from(value: AuctionStatus) -> Self {
        match value {
            AuctionStatus::Open => "AuctionOpen".to_string(),
            AuctionStatus::Closed => "AuctionClosed".to_string(),
            AuctionStatus::Other(raw) => raw,
        }
    }
}

/// An offer against an auction.
///
/// `quantity_filled` is only meaningful once the auction has settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bid {
    pub bidder: PartyId,
    pub amount: Numeric,
    pub price: Numeric,
    #[serde(default = "Numeric::zero")]
    pub quantity_filled: Numeric,
}

impl Bid {
    pub fn new(bidder: impl Into<String>, amount: &str, price: &str, quantity_filled: &str) -> Self {
        Self {
            bidder: PartyId::new(bidder),
            amount: Numeric::from(amount),
            price: Numeric::from(price),
            quantity_filled: Numeric::from(quantity_filled),
        }
    }
}

/// Auction contract payload, keyed by the sold token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Auction {
    pub token: Token,
    pub status: AuctionStatus,
    pub minimum_price: Numeric,
    pub minimum_quantity: Numeric,
    pub bid_increment: Numeric,
    pub end_date: CalendarDate,
    #[serde(default)]
    pub bids: Vec<Bid>,
}

impl Auction {
    pub fn key(&self) -> &str {
        &self.token.label
    }
}
