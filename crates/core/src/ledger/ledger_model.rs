//! Ledger domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one holding within a portfolio: the company label together
/// with its ticker symbol. Two operations belong to the same position only
/// when both fields match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionKey {
    pub company: String,
    pub symbol: String,
}

impl PositionKey {
    pub fn new(company: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            symbol: symbol.into(),
        }
    }
}

impl fmt::Display for PositionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.symbol, self.company)
    }
}

/// Side of a ledger operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSide {
    Purchase,
    Sale,
}

/// One entry of the append-only operation ledger.
///
/// Owned and persisted by the external transactional layer; immutable from
/// the engine's point of view. `total_eur` is the signed EUR cash flow of
/// the operation from the owner's perspective: negative for purchases
/// (capital out), positive for sales (capital back in), commissions
/// included, converted with the FX rate captured at entry time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub id: String,
    pub owner_id: String,
    pub portfolio_id: String,
    pub side: TradeSide,
    pub company: String,
    pub symbol: String,
    /// Shares traded; always positive, the side carries the direction.
    pub shares: Decimal,
    /// Price per share in the instrument's trading currency.
    pub unit_price: Decimal,
    pub currency: String,
    /// Currency -> EUR multiplier captured when the operation was recorded.
    pub fx_rate_to_eur: Decimal,
    /// Broker commission in the instrument's trading currency.
    pub commission: Decimal,
    /// Signed EUR cash flow consistent with `side`.
    pub total_eur: Decimal,
    pub executed_at: DateTime<Utc>,
    /// Ledger insertion order; tie-break for equal `executed_at` values.
    pub sequence: i64,
}

impl Operation {
    pub fn position_key(&self) -> PositionKey {
        PositionKey::new(self.company.clone(), self.symbol.clone())
    }

    /// Gross trade amount in EUR, commission excluded.
    pub fn gross_eur(&self) -> Decimal {
        self.shares * self.unit_price * self.fx_rate_to_eur
    }

    /// What a purchase cost in EUR, commission included. Positive.
    pub fn purchase_cost_eur(&self) -> Decimal {
        (self.shares * self.unit_price + self.commission) * self.fx_rate_to_eur
    }

    /// What a sale brought back in EUR, commission deducted. Positive.
    pub fn sale_proceeds_eur(&self) -> Decimal {
        (self.shares * self.unit_price - self.commission) * self.fx_rate_to_eur
    }
}

/// Sorts a ledger slice into deterministic replay order: executed-at
/// ascending, then insertion sequence ascending for equal timestamps.
pub fn sort_operations(operations: &mut [Operation]) {
    operations.sort_by(|a, b| {
        a.executed_at
            .cmp(&b.executed_at)
            .then(a.sequence.cmp(&b.sequence))
    });
}

/// An (owner, portfolio) pair known to the ledger store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioRef {
    pub owner_id: String,
    pub portfolio_id: String,
}
