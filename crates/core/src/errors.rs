//! Core error types for the valuation engine.
//!
//! This module defines database-agnostic error types. Storage-specific errors
//! are converted to these types by the storage layer before they reach the
//! engine.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::fx::FxError;
use crate::market_data::MarketDataError;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the valuation engine.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Ledger replay failed: {0}")]
    Calculation(#[from] CalculatorError),

    #[error("Market data operation failed: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("Fx error: {0}")]
    Fx(#[from] FxError),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Input validation failed: {0}")]
    Validation(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Errors raised while replaying the ledger into derived state.
///
/// The `NegativeShares` and `SaleFromEmptyPosition` variants are ledger
/// integrity violations: the ledger itself is inconsistent and the result
/// must be surfaced, never silently clamped.
#[derive(Error, Debug)]
pub enum CalculatorError {
    #[error("Ledger integrity violation for {symbol}: sale {operation_id} on {date} exceeds held quantity ({held} held, {sold} sold)")]
    NegativeShares {
        symbol: String,
        operation_id: String,
        date: NaiveDate,
        held: Decimal,
        sold: Decimal,
    },

    #[error("Ledger integrity violation for {symbol}: sale {operation_id} against an empty position")]
    SaleFromEmptyPosition {
        symbol: String,
        operation_id: String,
    },

    #[error("Invalid operation data: {0}")]
    InvalidOperation(String),
}

impl CalculatorError {
    /// True when the error denotes a corrupt ledger rather than bad input.
    pub fn is_integrity_violation(&self) -> bool {
        matches!(
            self,
            CalculatorError::NegativeShares { .. } | CalculatorError::SaleFromEmptyPosition { .. }
        )
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}
