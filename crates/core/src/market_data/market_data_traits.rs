use async_trait::async_trait;
use chrono::NaiveDate;

use super::market_data_errors::MarketDataError;
use super::market_data_model::{DailyPrice, PriceSource};
use super::providers::models::ProviderCandle;
use crate::errors::Result;

/// Trait defining the contract for external market data providers.
///
/// Providers serve historical daily candles only; live quotes are a
/// different pipeline and out of scope here.
#[async_trait]
pub trait MarketDataProviderTrait: Send + Sync {
    fn source(&self) -> PriceSource;

    /// Daily candles for `[start, end]`, ascending by date. Days without a
    /// session are simply absent.
    async fn get_daily_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> std::result::Result<Vec<ProviderCandle>, MarketDataError>;
}

/// Trait defining the contract for the daily price cache store.
#[async_trait]
pub trait DailyPriceRepositoryTrait: Send + Sync {
    fn get_price(
        &self,
        owner_id: &str,
        symbol: &str,
        date: NaiveDate,
    ) -> Result<Option<DailyPrice>>;

    fn get_prices_in_range(
        &self,
        owner_id: &str,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyPrice>>;

    fn count_prices(&self, owner_id: &str, symbol: &str) -> Result<u64>;

    fn first_price_date(&self, owner_id: &str, symbol: &str) -> Result<Option<NaiveDate>>;

    /// Inserts the row unless one already exists for its owner/symbol/date.
    /// Returns true when the row was inserted.
    async fn create_price_if_absent(&self, price: &DailyPrice) -> Result<bool>;

    /// Fills previously-missing optional fields (open/high/low/volume) on an
    /// existing row. Must never alter close, currency or the captured rate.
    async fn fill_missing_price_fields(&self, price: &DailyPrice) -> Result<()>;
}
