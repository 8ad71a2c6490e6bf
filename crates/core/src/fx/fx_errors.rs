use thiserror::Error;

/// Errors raised inside the FX provider chain.
///
/// These never escape `FxService::get_eur_cross_rates`; they only steer the
/// fallback chain and end up in logs.
#[derive(Error, Debug)]
pub enum FxError {
    #[error("Rate provider request budget exhausted")]
    BudgetExhausted,

    #[error("Failed to fetch exchange rates: {0}")]
    FetchFailed(String),

    #[error("Rate provider returned an invalid response: {0}")]
    InvalidResponse(String),

    #[error("Rate provider timed out: {0}")]
    Timeout(String),
}
