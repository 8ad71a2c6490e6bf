use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::QUANTITY_THRESHOLD;
use crate::ledger::PositionKey;

/// Share counts below this threshold are treated as fully closed; they keep
/// decimal dust from keeping a position alive.
pub fn is_quantity_significant(quantity: &Decimal) -> bool {
    let threshold =
        Decimal::from_str_radix(QUANTITY_THRESHOLD, 10).unwrap_or_else(|_| Decimal::new(1, 8));
    quantity.abs() >= threshold
}

/// A holding derived from ledger replay. Never persisted with its own
/// identity; recomputed on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub key: PositionKey,
    pub shares: Decimal,
    /// Average-cost basis of the held shares, in EUR at entry-captured rates.
    pub cost_basis_eur: Decimal,
    /// Cost basis per share; zero once the position is closed.
    pub average_cost_eur: Decimal,
    /// Trading currency, set by the first purchase.
    pub currency: String,
    pub first_purchase_at: DateTime<Utc>,
}

impl Position {
    pub fn is_active(&self) -> bool {
        self.shares > Decimal::ZERO && is_quantity_significant(&self.shares)
    }
}
