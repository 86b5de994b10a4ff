//! Bid aggregation over a single auction.
//!
//! The accounting regime depends on the auction state:
//! - no auction: nothing to aggregate
//! - open: `quantity_filled = Σ amount`, `total_proceeds = 0`
//! - anything else (settled): `quantity_filled = Σ quantityFilled`,
//!   `total_proceeds = Σ quantityFilled × price`
//!
//! A bid only needs the fields its regime reads: `price` always (ranking), `amount` while
//! open, `quantityFilled` once settled. A bid whose contribution would overflow a running
//! total is excluded like a malformed one.
//!
//! Which bid is "best" is a policy decision supplied through [`BidRanking`]; there is
//! no built-in default.

use std::cmp::Ordering;
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::warn;

use factoring_core::{DomainError, DomainResult, Numeric};
use factoring_invoicing::{Auction, Bid};

/// Parsed view of one bid, handed to the ranking policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankedBid {
    /// Position in the auction's bid list (earlier = lower).
    pub position: usize,
    pub price: Decimal,
    /// `None` when the ledger text is not an exact decimal.
    pub amount: Option<Decimal>,
    pub quantity_filled: Option<Decimal>,
}

/// Bid ranking policy.
///
/// `compare(a, b) == Ordering::Greater` means `a` ranks above `b`. Ties are resolved by the
/// aggregator in favour of the earlier bid.
pub trait BidRanking: Send + Sync {
    fn compare(&self, a: &RankedBid, b: &RankedBid) -> Ordering;
}

impl<F> BidRanking for F
where
    F: Fn(&RankedBid, &RankedBid) -> Ordering + Send + Sync,
{
    fn compare(&self, a: &RankedBid, b: &RankedBid) -> Ordering {
        self(a, b)
    }
}

/// Price-based rankings selectable from configuration.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PriceRanking {
    /// The bid asking the lowest price wins.
    LowestPrice,
    /// The bid offering the highest price wins.
    HighestPrice,
}

impl PriceRanking {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceRanking::LowestPrice => "lowest_price",
            PriceRanking::HighestPrice => "highest_price",
        }
    }
}

impl BidRanking for PriceRanking {
    fn compare(&self, a: &RankedBid, b: &RankedBid) -> Ordering {
        match self {
            PriceRanking::LowestPrice => b.price.cmp(&a.price),
            PriceRanking::HighestPrice => a.price.cmp(&b.price),
        }
    }
}

impl core::str::FromStr for PriceRanking {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lowest_price" => Ok(PriceRanking::LowestPrice),
            "highest_price" => Ok(PriceRanking::HighestPrice),
            other => Err(DomainError::validation(format!(
                "unknown bid ranking: {other} (expected lowest_price or highest_price)"
            ))),
        }
    }
}

impl core::fmt::Display for PriceRanking {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which accounting rule produced an aggregate.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AccountingRegime {
    NoAuction,
    Open,
    Settled,
}

/// Aggregated bid figures for one invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BidAggregate {
    pub regime: AccountingRegime,
    pub best_bid: Option<Bid>,
    pub quantity_filled: Decimal,
    pub total_proceeds: Decimal,
    /// All bids on the auction, including excluded ones.
    pub bid_count: usize,
    /// Bids left out because a field they needed was not an exact decimal.
    pub excluded_bids: usize,
}

impl BidAggregate {
    pub fn no_auction() -> Self {
        Self {
            regime: AccountingRegime::NoAuction,
            best_bid: None,
            quantity_filled: Decimal::ZERO,
            total_proceeds: Decimal::ZERO,
            bid_count: 0,
            excluded_bids: 0,
        }
    }
}

/// Computes [`BidAggregate`]s with an injected ranking policy.
#[derive(Clone)]
pub struct BidAggregator {
    ranking: Arc<dyn BidRanking>,
}

impl core::fmt::Debug for BidAggregator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BidAggregator").finish_non_exhaustive()
    }
}

impl BidAggregator {
    pub fn new(ranking: Arc<dyn BidRanking>) -> Self {
        Self { ranking }
    }

    pub fn with_ranking<R: BidRanking + 'static>(ranking: R) -> Self {
        Self::new(Arc::new(ranking))
    }

    pub fn aggregate(&self, auction: Option<&Auction>) -> BidAggregate {
        let Some(auction) = auction else {
            return BidAggregate::no_auction();
        };

        let regime = if auction.status.is_open() {
            AccountingRegime::Open
        } else {
            AccountingRegime::Settled
        };

        let mut quantity_filled = Decimal::ZERO;
        let mut total_proceeds = Decimal::ZERO;
        let mut excluded_bids = 0;
        let mut best: Option<RankedBid> = None;

        for (position, bid) in auction.bids.iter().enumerate() {
            let accrued = parse_bid(position, bid).and_then(|ranked| {
                accrue(regime, &ranked, bid, quantity_filled, total_proceeds)
                    .map(|totals| (ranked, totals))
            });
            let (ranked, (filled, proceeds)) = match accrued {
                Ok(accrued) => accrued,
                Err(err) => {
                    warn!(
                        auction = %auction.key(),
                        bidder = %bid.bidder,
                        error = %err,
                        "bid excluded from aggregate"
                    );
                    excluded_bids += 1;
                    continue;
                }
            };
            quantity_filled = filled;
            total_proceeds = proceeds;

            // Strictly greater only: the earliest bid keeps a tie.
            best = match best {
                Some(current)
                    if self.ranking.compare(&ranked, &current) != Ordering::Greater =>
                {
                    Some(current)
                }
                _ => Some(ranked),
            };
        }

        BidAggregate {
            regime,
            best_bid: best.map(|ranked| auction.bids[ranked.position].clone()),
            quantity_filled,
            total_proceeds,
            bid_count: auction.bids.len(),
            excluded_bids,
        }
    }
}

fn parse_bid(position: usize, bid: &Bid) -> DomainResult<RankedBid> {
    Ok(RankedBid {
        position,
        price: bid.price.parse("bid.price")?,
        amount: bid.amount.parse("bid.amount").ok(),
        quantity_filled: bid.quantity_filled.parse("bid.quantityFilled").ok(),
    })
}

/// Running totals after adding one bid under `regime`.
fn accrue(
    regime: AccountingRegime,
    ranked: &RankedBid,
    bid: &Bid,
    quantity_filled: Decimal,
    total_proceeds: Decimal,
) -> DomainResult<(Decimal, Decimal)> {
    match regime {
        AccountingRegime::NoAuction => Ok((quantity_filled, total_proceeds)),
        AccountingRegime::Open => {
            let amount = required(ranked.amount, "bid.amount", &bid.amount)?;
            let filled = quantity_filled
                .checked_add(amount)
                .ok_or_else(|| malformed("bid.amount", &bid.amount))?;
            Ok((filled, total_proceeds))
        }
        AccountingRegime::Settled => {
            let filled_by_bid =
                required(ranked.quantity_filled, "bid.quantityFilled", &bid.quantity_filled)?;
            let filled = quantity_filled
                .checked_add(filled_by_bid)
                .ok_or_else(|| malformed("bid.quantityFilled", &bid.quantity_filled))?;
            let proceeds = filled_by_bid
                .checked_mul(ranked.price)
                .and_then(|proceeds| total_proceeds.checked_add(proceeds))
                .ok_or_else(|| malformed("bid.price", &bid.price))?;
            Ok((filled, proceeds))
        }
    }
}

fn required(value: Option<Decimal>, field: &'static str, raw: &Numeric) -> DomainResult<Decimal> {
    value.ok_or_else(|| malformed(field, raw))
}

fn malformed(field: &'static str, raw: &Numeric) -> DomainError {
    DomainError::malformed_numeric(field, raw.as_str())
}
