//! Secondary FX source: rates derived from EUR currency-pair quotes.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use log::debug;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

use crate::fx::fx_errors::FxError;
use crate::fx::fx_traits::FxRateProviderTrait;
use crate::market_data::MarketDataProviderTrait;

/// Currencies resolvable through quoted EUR pairs.
const QUOTE_PAIR_CURRENCIES: &[&str] = &["USD", "GBP", "CHF"];

/// How many days back to look for the latest pair candle.
const QUOTE_LOOKBACK_DAYS: i64 = 7;

/// Derives base-quoted rates from `<BASE><CCY>=X` currency-pair candles.
/// Used when the budgeted rate provider is unavailable.
pub struct QuoteFxProvider {
    market_data: Arc<dyn MarketDataProviderTrait>,
}

impl QuoteFxProvider {
    pub fn new(market_data: Arc<dyn MarketDataProviderTrait>) -> Self {
        Self { market_data }
    }
}

#[async_trait]
impl FxRateProviderTrait for QuoteFxProvider {
    fn name(&self) -> &'static str {
        "QUOTE_PAIRS"
    }

    async fn get_rates(&self, base: &str) -> Result<HashMap<String, Decimal>, FxError> {
        let end = Utc::now().date_naive();
        let start = end - Duration::days(QUOTE_LOOKBACK_DAYS);

        let mut rates = HashMap::new();
        for currency in QUOTE_PAIR_CURRENCIES {
            if *currency == base {
                continue;
            }
            let symbol = format!("{}{}=X", base, currency);
            match self.market_data.get_daily_history(&symbol, start, end).await {
                Ok(candles) => {
                    if let Some(last) = candles.last() {
                        rates.insert(currency.to_string(), last.close);
                    }
                }
                Err(e) => {
                    debug!("Pair quote {} unavailable: {}", symbol, e);
                }
            }
        }

        if rates.is_empty() {
            return Err(FxError::FetchFailed(
                "no currency pair quotes available".to_string(),
            ));
        }
        Ok(rates)
    }
}
