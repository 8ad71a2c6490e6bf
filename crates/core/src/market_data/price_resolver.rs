use chrono::{Duration, NaiveDate, Utc};
use dashmap::DashMap;
use log::{debug, warn};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use super::market_data_constants::{
    HOLIDAY_TOLERANCE_DAYS, PRICE_COVERAGE_THRESHOLD, PROVIDER_TIMEOUT_SECS,
};
use super::market_data_model::DailyPrice;
use super::market_data_traits::{DailyPriceRepositoryTrait, MarketDataProviderTrait};
use super::providers::models::ProviderCandle;
use crate::errors::Result;
use crate::events::{DomainEvent, DomainEventSink, NoOpDomainEventSink};
use crate::fx::{FxRateMap, FxService};
use crate::ledger::PositionKey;
use crate::utils::time_utils::count_business_days;

/// Tunables for historical close resolution.
#[derive(Debug, Clone)]
pub struct PriceResolverOptions {
    /// Per-call timeout for provider requests.
    pub provider_timeout: StdDuration,
    /// How many days before the requested date a candle may be picked from.
    pub holiday_tolerance_days: i64,
    /// Cached-row coverage fraction below which a full re-fetch runs.
    pub coverage_threshold: Decimal,
}

impl Default for PriceResolverOptions {
    fn default() -> Self {
        Self {
            provider_timeout: StdDuration::from_secs(PROVIDER_TIMEOUT_SECS),
            holiday_tolerance_days: HOLIDAY_TOLERANCE_DAYS,
            coverage_threshold: Decimal::from_str(PRICE_COVERAGE_THRESHOLD)
                .unwrap_or_else(|_| Decimal::new(70, 2)),
        }
    }
}

/// Resolves a position's historical close price and EUR cross-rate.
///
/// Lookup order: in-process cache, then the price repository, then the
/// external provider (persisting what it returns). Provider failures and
/// timeouts resolve to `None` at this boundary; only repository errors
/// propagate.
pub struct PriceResolver {
    repository: Arc<dyn DailyPriceRepositoryTrait>,
    provider: Arc<dyn MarketDataProviderTrait>,
    fx_service: Arc<FxService>,
    cache: DashMap<(String, String, NaiveDate), DailyPrice>,
    event_sink: Arc<dyn DomainEventSink>,
    options: PriceResolverOptions,
}

impl PriceResolver {
    pub fn new(
        repository: Arc<dyn DailyPriceRepositoryTrait>,
        provider: Arc<dyn MarketDataProviderTrait>,
        fx_service: Arc<FxService>,
    ) -> Self {
        Self {
            repository,
            provider,
            fx_service,
            cache: DashMap::new(),
            event_sink: Arc::new(NoOpDomainEventSink),
            options: PriceResolverOptions::default(),
        }
    }

    /// Sets the domain event sink for this resolver.
    pub fn with_event_sink(mut self, event_sink: Arc<dyn DomainEventSink>) -> Self {
        self.event_sink = event_sink;
        self
    }

    pub fn with_options(mut self, options: PriceResolverOptions) -> Self {
        self.options = options;
        self
    }

    /// The close price of `key` as of `date`, or `None` when nothing is
    /// cached and the provider cannot supply a candle within the holiday
    /// tolerance window.
    pub async fn resolve_close(
        &self,
        owner_id: &str,
        key: &PositionKey,
        date: NaiveDate,
    ) -> Result<Option<DailyPrice>> {
        let cache_key = (owner_id.to_string(), key.symbol.clone(), date);
        if let Some(hit) = self.cache.get(&cache_key) {
            return Ok(Some(hit.clone()));
        }

        if let Some(row) = self.repository.get_price(owner_id, &key.symbol, date)? {
            self.cache.insert(cache_key, row.clone());
            return Ok(Some(row));
        }

        let window_start = date - Duration::days(self.options.holiday_tolerance_days);
        let candles = match self.fetch_candles(&key.symbol, window_start, date).await {
            Some(candles) => candles,
            None => return Ok(None),
        };

        // Nearest candle at or before the requested date; a holiday resolves
        // to the previous session within the tolerance window.
        let candle = candles
            .into_iter()
            .filter(|c| c.date <= date)
            .max_by_key(|c| c.date);
        let candle = match candle {
            Some(candle) => candle,
            None => {
                debug!("No candle for {} on or before {}", key.symbol, date);
                return Ok(None);
            }
        };

        let rates = self.fx_service.get_eur_cross_rates().await;
        let row = match self.build_price(owner_id, key, date, &candle, &rates) {
            Some(row) => row,
            None => return Ok(None),
        };

        self.repository.create_price_if_absent(&row).await?;
        self.cache.insert(cache_key, row.clone());
        Ok(Some(row))
    }

    /// Checks cached coverage for one position and runs a single full
    /// historical re-fetch when it falls under the threshold. Fetching every
    /// missing day individually would cost one provider call per gap; one
    /// range call amortizes that.
    pub async fn ensure_coverage(
        &self,
        owner_id: &str,
        key: &PositionKey,
        as_of: NaiveDate,
    ) -> Result<()> {
        let first = match self.repository.first_price_date(owner_id, &key.symbol)? {
            Some(first) => first,
            None => return Ok(()),
        };

        let expected = count_business_days(first, as_of);
        if expected == 0 {
            return Ok(());
        }
        let cached = self.repository.count_prices(owner_id, &key.symbol)?;
        let coverage = Decimal::from(cached) / Decimal::from(expected);
        if coverage >= self.options.coverage_threshold {
            return Ok(());
        }

        debug!(
            "Price coverage for {} is {} of {} expected rows, backfilling from {}",
            key.symbol, cached, expected, first
        );

        let candles = match self.fetch_candles(&key.symbol, first, as_of).await {
            Some(candles) => candles,
            None => return Ok(()),
        };
        if candles.is_empty() {
            return Ok(());
        }

        let rates = self.fx_service.get_eur_cross_rates().await;
        let mut inserted = 0usize;
        for candle in &candles {
            let row = match self.build_price(owner_id, key, candle.date, candle, &rates) {
                Some(row) => row,
                None => continue,
            };
            if self.repository.create_price_if_absent(&row).await? {
                inserted += 1;
            } else {
                // Row already confirmed; only absent optional fields may be
                // completed from the fresh candle.
                self.repository.fill_missing_price_fields(&row).await?;
            }
        }

        if inserted > 0 {
            self.event_sink.emit(DomainEvent::prices_backfilled(
                owner_id.to_string(),
                key.symbol.clone(),
                inserted,
            ));
        }
        Ok(())
    }

    /// Cached rows for `[start, end]`, repository order (date ascending).
    pub fn cached_range(
        &self,
        owner_id: &str,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyPrice>> {
        self.repository
            .get_prices_in_range(owner_id, symbol, start, end)
    }

    fn build_price(
        &self,
        owner_id: &str,
        key: &PositionKey,
        date: NaiveDate,
        candle: &ProviderCandle,
        rates: &FxRateMap,
    ) -> Option<DailyPrice> {
        let fx_rate_to_eur = match rates.rate_to_eur(&candle.currency) {
            Some(rate) => rate,
            None => {
                warn!(
                    "No EUR rate for currency {} ({} on {}), skipping price",
                    candle.currency, key.symbol, date
                );
                return None;
            }
        };

        Some(DailyPrice {
            id: DailyPrice::make_id(owner_id, &key.symbol, date),
            owner_id: owner_id.to_string(),
            company: key.company.clone(),
            symbol: key.symbol.clone(),
            date,
            open: candle.open,
            high: candle.high,
            low: candle.low,
            close: candle.close,
            volume: candle.volume,
            currency: candle.currency.clone(),
            fx_rate_to_eur,
            source: self.provider.source(),
            created_at: Utc::now(),
        })
    }

    async fn fetch_candles(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Option<Vec<ProviderCandle>> {
        let fetch = self.provider.get_daily_history(symbol, start, end);
        match tokio::time::timeout(self.options.provider_timeout, fetch).await {
            Ok(Ok(candles)) => Some(candles),
            Ok(Err(e)) => {
                warn!("Market data fetch for {} failed: {}", symbol, e);
                None
            }
            Err(_) => {
                warn!(
                    "Market data fetch for {} timed out after {:?}",
                    symbol, self.options.provider_timeout
                );
                None
            }
        }
    }
}
