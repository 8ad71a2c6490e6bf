//! Historical daily candles from the Yahoo Finance chart API.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use log::debug;
use rust_decimal::Decimal;

use super::models::ProviderCandle;
use crate::market_data::market_data_errors::MarketDataError;
use crate::market_data::market_data_model::PriceSource;
use crate::market_data::market_data_traits::MarketDataProviderTrait;

const BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

pub struct YahooChartProvider {
    client: reqwest::Client,
}

impl YahooChartProvider {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    fn day_start_ts(date: NaiveDate) -> i64 {
        date.and_time(NaiveTime::MIN).and_utc().timestamp()
    }
}

impl Default for YahooChartProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataProviderTrait for YahooChartProvider {
    fn source(&self) -> PriceSource {
        PriceSource::Yahoo
    }

    async fn get_daily_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ProviderCandle>, MarketDataError> {
        let period1 = Self::day_start_ts(start);
        // End bound is exclusive on the API side; push it one day forward so
        // the candle of `end` itself is included.
        let period2 = Self::day_start_ts(end) + 86_400;

        let url = format!("{}/{}", BASE_URL, symbol);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("events", "history".to_string()),
            ])
            .send()
            .await
            .map_err(|e| MarketDataError::FetchFailed(e.to_string()))?;

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| MarketDataError::InvalidResponse(e.to_string()))?;

        let result = body
            .pointer("/chart/result/0")
            .ok_or_else(|| MarketDataError::InvalidResponse("missing chart result".to_string()))?;

        let currency = result
            .pointer("/meta/currency")
            .and_then(|v| v.as_str())
            .unwrap_or("USD")
            .to_string();

        let timestamps: Vec<i64> = result
            .pointer("/timestamp")
            .and_then(|v| v.as_array())
            .map(|a| a.iter().filter_map(|t| t.as_i64()).collect())
            .unwrap_or_default();

        let quote = result
            .pointer("/indicators/quote/0")
            .ok_or_else(|| MarketDataError::InvalidResponse("missing quote block".to_string()))?;

        let series = |field: &str| -> Vec<Option<Decimal>> {
            quote
                .pointer(&format!("/{}", field))
                .and_then(|v| v.as_array())
                .map(|a| {
                    a.iter()
                        .map(|x| x.as_f64().and_then(Decimal::from_f64_retain))
                        .collect()
                })
                .unwrap_or_default()
        };

        let opens = series("open");
        let highs = series("high");
        let lows = series("low");
        let closes = series("close");
        let volumes = series("volume");

        let mut candles = Vec::with_capacity(timestamps.len());
        for (i, ts) in timestamps.iter().enumerate() {
            let date = match chrono::DateTime::from_timestamp(*ts, 0) {
                Some(instant) => instant.date_naive(),
                None => continue,
            };
            // Sessions with no close (halted days) are dropped entirely.
            let close = match closes.get(i).copied().flatten() {
                Some(close) => close,
                None => continue,
            };
            candles.push(ProviderCandle {
                date,
                open: opens.get(i).copied().flatten(),
                high: highs.get(i).copied().flatten(),
                low: lows.get(i).copied().flatten(),
                close,
                volume: volumes.get(i).copied().flatten(),
                currency: currency.clone(),
            });
        }

        debug!(
            "Fetched {} candles for {} between {} and {}",
            candles.len(),
            symbol,
            start,
            end
        );
        Ok(candles)
    }
}
