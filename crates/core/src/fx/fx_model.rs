//! FX domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::currency::{minor_unit_factor, normalize_currency_code};

/// Where a cross-rate map came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FxRateSource {
    /// Keyed, budgeted HTTP rate provider.
    Primary,
    /// Rates derived from EUR currency-pair quotes.
    Secondary,
    /// Last successfully fetched map, possibly stale.
    LastKnown,
    /// Compile-time defaults of last resort.
    StaticDefaults,
}

/// A currency -> EUR multiplier map, produced fresh per resolution call.
///
/// The map is never stored: the rate that matters for historical valuation
/// is the one captured on the `DailyPrice` row at resolution time, never a
/// later live rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FxRateMap {
    /// Major currency code -> EUR multiplier. Always contains `EUR -> 1`.
    pub rates: HashMap<String, Decimal>,
    pub source: FxRateSource,
    pub as_of: DateTime<Utc>,
}

impl FxRateMap {
    pub fn new(rates: HashMap<String, Decimal>, source: FxRateSource) -> Self {
        let mut rates = rates;
        rates.insert("EUR".to_string(), Decimal::ONE);
        Self {
            rates,
            source,
            as_of: Utc::now(),
        }
    }

    /// EUR multiplier for an amount quoted in `currency`.
    ///
    /// Minor-unit codes (GBp, GBX, ...) resolve through their major currency
    /// with the multiplier scaled down by the minor-unit factor, so a pence
    /// quote times the returned rate lands directly in EUR.
    pub fn rate_to_eur(&self, currency: &str) -> Option<Decimal> {
        let major = normalize_currency_code(currency);
        let rate = self.rates.get(major)?;
        Some(*rate * minor_unit_factor(currency))
    }
}

/// Defaults of last resort when every provider is unavailable.
pub fn static_default_rates() -> HashMap<String, Decimal> {
    let mut rates = HashMap::new();
    rates.insert("EUR".to_string(), Decimal::ONE);
    rates.insert("USD".to_string(), dec!(0.92));
    rates.insert("GBP".to_string(), dec!(0.86));
    rates
}
