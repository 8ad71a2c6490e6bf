//! Shared fixtures for integration tests: in-memory collaborators and
//! ledger builders.

// Each test binary uses a different subset of these fixtures.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use ledgerfolio_core::errors::Result;
use ledgerfolio_core::fx::{FxError, FxRateProviderTrait, FxService};
use ledgerfolio_core::ledger::{
    LedgerRepositoryTrait, Operation, PortfolioRef, TradeSide,
};
use ledgerfolio_core::market_data::providers::models::ProviderCandle;
use ledgerfolio_core::market_data::{
    DailyPrice, DailyPriceRepositoryTrait, MarketDataError, MarketDataProviderTrait,
    PriceResolver, PriceSource,
};
use ledgerfolio_core::portfolio::snapshot::{
    DailyPortfolioStats, DailyPositionSnapshot, SnapshotRepositoryTrait,
};

pub const OWNER: &str = "user-1";
pub const PORTFOLIO: &str = "main";

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

pub fn operation(
    id: &str,
    side: TradeSide,
    symbol: &str,
    shares: Decimal,
    price: Decimal,
    date: NaiveDate,
) -> Operation {
    let gross = shares * price;
    Operation {
        id: id.to_string(),
        owner_id: OWNER.to_string(),
        portfolio_id: PORTFOLIO.to_string(),
        side,
        company: format!("{} Corp", symbol),
        symbol: symbol.to_string(),
        shares,
        unit_price: price,
        currency: "EUR".to_string(),
        fx_rate_to_eur: Decimal::ONE,
        commission: Decimal::ZERO,
        total_eur: match side {
            TradeSide::Purchase => -gross,
            TradeSide::Sale => gross,
        },
        executed_at: Utc.from_utc_datetime(&date.and_hms_opt(10, 0, 0).unwrap()),
        sequence: date.and_hms_opt(10, 0, 0).unwrap().and_utc().timestamp(),
    }
}

pub fn buy(id: &str, symbol: &str, shares: Decimal, price: Decimal, date: NaiveDate) -> Operation {
    operation(id, TradeSide::Purchase, symbol, shares, price, date)
}

pub fn sell(id: &str, symbol: &str, shares: Decimal, price: Decimal, date: NaiveDate) -> Operation {
    operation(id, TradeSide::Sale, symbol, shares, price, date)
}

// --- Ledger ---

pub struct InMemoryLedger {
    pub operations: Vec<Operation>,
}

impl LedgerRepositoryTrait for InMemoryLedger {
    fn list_operations(&self, owner_id: &str, portfolio_id: &str) -> Result<Vec<Operation>> {
        Ok(self
            .operations
            .iter()
            .filter(|o| o.owner_id == owner_id && o.portfolio_id == portfolio_id)
            .cloned()
            .collect())
    }

    fn list_operations_until(
        &self,
        owner_id: &str,
        portfolio_id: &str,
        as_of: NaiveDate,
    ) -> Result<Vec<Operation>> {
        Ok(self
            .list_operations(owner_id, portfolio_id)?
            .into_iter()
            .filter(|o| o.executed_at.date_naive() <= as_of)
            .collect())
    }

    fn list_portfolios(&self) -> Result<Vec<PortfolioRef>> {
        let mut seen = Vec::new();
        for op in &self.operations {
            let portfolio = PortfolioRef {
                owner_id: op.owner_id.clone(),
                portfolio_id: op.portfolio_id.clone(),
            };
            if !seen.contains(&portfolio) {
                seen.push(portfolio);
            }
        }
        Ok(seen)
    }
}

// --- Price cache ---

#[derive(Default)]
pub struct InMemoryPriceRepository {
    rows: Mutex<HashMap<(String, String, NaiveDate), DailyPrice>>,
}

impl InMemoryPriceRepository {
    pub fn seed(&self, owner_id: &str, symbol: &str, date: NaiveDate, close: Decimal) {
        let price = DailyPrice {
            id: DailyPrice::make_id(owner_id, symbol, date),
            owner_id: owner_id.to_string(),
            company: format!("{} Corp", symbol),
            symbol: symbol.to_string(),
            date,
            open: None,
            high: None,
            low: None,
            close,
            volume: None,
            currency: "EUR".to_string(),
            fx_rate_to_eur: Decimal::ONE,
            source: PriceSource::Manual,
            created_at: Utc::now(),
        };
        self.rows
            .lock()
            .unwrap()
            .insert((owner_id.to_string(), symbol.to_string(), date), price);
    }
}

#[async_trait]
impl DailyPriceRepositoryTrait for InMemoryPriceRepository {
    fn get_price(
        &self,
        owner_id: &str,
        symbol: &str,
        date: NaiveDate,
    ) -> Result<Option<DailyPrice>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .get(&(owner_id.to_string(), symbol.to_string(), date))
            .cloned())
    }

    fn get_prices_in_range(
        &self,
        owner_id: &str,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyPrice>> {
        let rows = self.rows.lock().unwrap();
        let mut result: Vec<DailyPrice> = rows
            .values()
            .filter(|p| {
                p.owner_id == owner_id && p.symbol == symbol && p.date >= start && p.date <= end
            })
            .cloned()
            .collect();
        result.sort_by_key(|p| p.date);
        Ok(result)
    }

    fn count_prices(&self, owner_id: &str, symbol: &str) -> Result<u64> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.owner_id == owner_id && p.symbol == symbol)
            .count() as u64)
    }

    fn first_price_date(&self, owner_id: &str, symbol: &str) -> Result<Option<NaiveDate>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.owner_id == owner_id && p.symbol == symbol)
            .map(|p| p.date)
            .min())
    }

    async fn create_price_if_absent(&self, price: &DailyPrice) -> Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        let key = (price.owner_id.clone(), price.symbol.clone(), price.date);
        if rows.contains_key(&key) {
            return Ok(false);
        }
        rows.insert(key, price.clone());
        Ok(true)
    }

    async fn fill_missing_price_fields(&self, price: &DailyPrice) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        let key = (price.owner_id.clone(), price.symbol.clone(), price.date);
        if let Some(existing) = rows.get_mut(&key) {
            if existing.open.is_none() {
                existing.open = price.open;
            }
            if existing.high.is_none() {
                existing.high = price.high;
            }
            if existing.low.is_none() {
                existing.low = price.low;
            }
            if existing.volume.is_none() {
                existing.volume = price.volume;
            }
        }
        Ok(())
    }
}

// --- Snapshot store ---

#[derive(Default)]
pub struct InMemorySnapshotRepository {
    pub stats: Mutex<HashMap<String, DailyPortfolioStats>>,
    pub positions: Mutex<HashMap<String, DailyPositionSnapshot>>,
}

#[async_trait]
impl SnapshotRepositoryTrait for InMemorySnapshotRepository {
    fn get_portfolio_stats(
        &self,
        owner_id: &str,
        portfolio_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailyPortfolioStats>> {
        Ok(self
            .stats
            .lock()
            .unwrap()
            .get(&DailyPortfolioStats::make_id(owner_id, portfolio_id, date))
            .cloned())
    }

    fn latest_portfolio_stats_before(
        &self,
        owner_id: &str,
        portfolio_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailyPortfolioStats>> {
        let stats = self.stats.lock().unwrap();
        Ok(stats
            .values()
            .filter(|s| s.owner_id == owner_id && s.portfolio_id == portfolio_id && s.date < date)
            .max_by_key(|s| s.date)
            .cloned())
    }

    fn list_portfolio_stats_range(
        &self,
        owner_id: &str,
        portfolio_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyPortfolioStats>> {
        let stats = self.stats.lock().unwrap();
        let mut rows: Vec<DailyPortfolioStats> = stats
            .values()
            .filter(|s| {
                s.owner_id == owner_id
                    && s.portfolio_id == portfolio_id
                    && s.date >= start
                    && s.date <= end
            })
            .cloned()
            .collect();
        rows.sort_by_key(|s| s.date);
        Ok(rows)
    }

    fn get_position_snapshots(
        &self,
        owner_id: &str,
        portfolio_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<DailyPositionSnapshot>> {
        let positions = self.positions.lock().unwrap();
        Ok(positions
            .values()
            .filter(|p| p.owner_id == owner_id && p.portfolio_id == portfolio_id && p.date == date)
            .cloned()
            .collect())
    }

    async fn create_stats_if_absent(&self, row: &DailyPortfolioStats) -> Result<bool> {
        let mut stats = self.stats.lock().unwrap();
        if stats.contains_key(&row.id) {
            return Ok(false);
        }
        stats.insert(row.id.clone(), row.clone());
        Ok(true)
    }

    async fn create_position_snapshot_if_absent(
        &self,
        row: &DailyPositionSnapshot,
    ) -> Result<bool> {
        let mut positions = self.positions.lock().unwrap();
        if positions.contains_key(&row.id) {
            return Ok(false);
        }
        positions.insert(row.id.clone(), row.clone());
        Ok(true)
    }
}

// --- Offline collaborators ---

pub struct OfflineProvider;

#[async_trait]
impl MarketDataProviderTrait for OfflineProvider {
    fn source(&self) -> PriceSource {
        PriceSource::Yahoo
    }

    async fn get_daily_history(
        &self,
        _symbol: &str,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> std::result::Result<Vec<ProviderCandle>, MarketDataError> {
        Err(MarketDataError::FetchFailed("offline".to_string()))
    }
}

pub struct OfflineFxProvider;

#[async_trait]
impl FxRateProviderTrait for OfflineFxProvider {
    fn name(&self) -> &'static str {
        "OFFLINE"
    }

    async fn get_rates(
        &self,
        _base: &str,
    ) -> std::result::Result<HashMap<String, Decimal>, FxError> {
        Err(FxError::FetchFailed("offline".to_string()))
    }
}

/// A resolver wired to the given price cache with offline providers: every
/// resolution is served from (or denied by) the cache.
pub fn offline_resolver(prices: Arc<InMemoryPriceRepository>) -> Arc<PriceResolver> {
    let fx = Arc::new(FxService::new(
        Arc::new(OfflineFxProvider),
        Arc::new(OfflineFxProvider),
    ));
    Arc::new(PriceResolver::new(prices, Arc::new(OfflineProvider), fx))
}
