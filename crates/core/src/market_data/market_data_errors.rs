use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised by market data providers and the price resolver.
///
/// Fetch-class failures are converted to absent results at the resolver
/// boundary; callers only see them in logs and per-position failure records.
#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("Failed to fetch market data: {0}")]
    FetchFailed(String),

    #[error("Market data provider timed out: {0}")]
    Timeout(String),

    #[error("Market data provider returned an invalid response: {0}")]
    InvalidResponse(String),

    #[error("No close price available for {symbol} on {date}")]
    MissingPriceData { symbol: String, date: NaiveDate },
}
