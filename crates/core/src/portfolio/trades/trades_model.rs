use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::PositionKey;

/// One purchase lot with its remaining unconsumed quantity.
///
/// Remainders are shared across the whole sale sequence of a position:
/// what an earlier sale consumed is gone for every later sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseLot {
    pub operation_id: String,
    pub acquired_at: DateTime<Utc>,
    /// Original lot size.
    pub shares: Decimal,
    /// Full EUR cost of the lot, commission included.
    pub total_cost_eur: Decimal,
    /// Quantity not yet consumed by any sale.
    pub remaining: Decimal,
}

impl PurchaseLot {
    /// EUR cost of a single share of this lot.
    pub fn unit_cost_eur(&self) -> Decimal {
        if self.shares.is_zero() {
            Decimal::ZERO
        } else {
            self.total_cost_eur / self.shares
        }
    }

    /// EUR cost still sitting in the unconsumed remainder.
    pub fn remaining_cost_eur(&self) -> Decimal {
        self.unit_cost_eur() * self.remaining
    }
}

/// A sale operation enriched with its FIFO-matched purchase side.
/// Derived on demand; never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosedTrade {
    pub operation_id: String,
    pub owner_id: String,
    pub portfolio_id: String,
    pub key: PositionKey,
    pub sold_at: DateTime<Utc>,
    pub shares: Decimal,
    pub unit_price: Decimal,
    pub currency: String,
    /// Sale proceeds in EUR, commission deducted, at the sale's captured rate.
    pub net_proceeds_eur: Decimal,
    /// EUR cost of the consumed purchase lots.
    pub matched_cost_eur: Decimal,
    pub realized_pnl_eur: Decimal,
    /// Realized PnL as a percentage of matched cost; zero when the matched
    /// cost is zero.
    pub realized_pnl_pct: Decimal,
    /// Mean purchase date of the consumed lots, weighted by shares taken
    /// from each.
    pub avg_purchase_date: NaiveDate,
}
