//! Market data domain models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::market_data_constants::{DATA_SOURCE_MANUAL, DATA_SOURCE_YAHOO};

/// Source of a cached daily price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum PriceSource {
    Yahoo,
    #[default]
    Manual,
}

impl PriceSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceSource::Yahoo => DATA_SOURCE_YAHOO,
            PriceSource::Manual => DATA_SOURCE_MANUAL,
        }
    }
}

impl From<&str> for PriceSource {
    fn from(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            DATA_SOURCE_YAHOO => PriceSource::Yahoo,
            _ => PriceSource::Manual,
        }
    }
}

/// A cached close price fact: one row per owner/position/date.
///
/// Created once, read many times. After creation only previously-missing
/// optional fields (open/high/low/volume) may be filled in; the close and
/// the captured FX rate are never rewritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPrice {
    pub id: String,
    pub owner_id: String,
    pub company: String,
    pub symbol: String,
    pub date: NaiveDate,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub close: Decimal,
    pub volume: Option<Decimal>,
    /// Quote currency as reported by the provider; may be a minor unit
    /// code such as GBp.
    pub currency: String,
    /// Currency -> EUR multiplier as resolved for this date, minor-unit
    /// factor already applied.
    pub fx_rate_to_eur: Decimal,
    pub source: PriceSource,
    pub created_at: DateTime<Utc>,
}

impl DailyPrice {
    pub fn make_id(owner_id: &str, symbol: &str, date: NaiveDate) -> String {
        format!("{}_{}_{}", owner_id, symbol, date.format("%Y-%m-%d"))
    }

    /// Market value in EUR of `shares` at this close.
    pub fn market_value_eur(&self, shares: Decimal) -> Decimal {
        shares * self.close * self.fx_rate_to_eur
    }

    /// True when any of the optional OHLC/volume fields is still absent.
    pub fn has_missing_fields(&self) -> bool {
        self.open.is_none() || self.high.is_none() || self.low.is_none() || self.volume.is_none()
    }
}
