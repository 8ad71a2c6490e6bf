use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::PositionKey;

/// End-of-month PnL sample: the PnL *level* at the month's last recorded
/// day, not the delta against the prior month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyPnl {
    pub year: i32,
    pub month: u32,
    pub pnl_eur: Decimal,
}

/// Realized gains summed over the sales of one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyRealized {
    pub year: i32,
    pub month: u32,
    pub realized_eur: Decimal,
}

/// Percentage drop from the running PnL peak on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawdownPoint {
    pub date: NaiveDate,
    pub pnl_eur: Decimal,
    pub peak_pnl_eur: Decimal,
    pub drawdown_pct: Decimal,
}

/// One position's share of the portfolio market value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionWeight {
    pub key: PositionKey,
    pub market_value_eur: Decimal,
    pub weight_pct: Decimal,
}

/// Herfindahl-style concentration over position market values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConcentrationReport {
    /// Sum of squared weight fractions, in `(0, 1]`; 1 means a single
    /// position holds everything.
    pub herfindahl_index: Decimal,
    pub weights: Vec<PositionWeight>,
}
