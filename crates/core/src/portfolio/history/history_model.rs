use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One business day of reconstructed portfolio history.
///
/// `total_invested_eur` is net injected capital: cumulative purchase outflow
/// minus sale inflow. It is intentionally a cash-flow metric, not the
/// average-cost basis - the two diverge by exactly the realized gain once a
/// sale realizes one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPoint {
    pub date: NaiveDate,
    pub total_invested_eur: Decimal,
    pub total_value_eur: Decimal,
    pub pnl_eur: Decimal,
}
