use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;

use super::fx_errors::FxError;

/// Trait defining the contract for external FX rate providers.
///
/// `get_rates` returns rates quoted against `base`: one unit of `base`
/// equals the returned amount of each currency. The service inverts them
/// into currency -> EUR multipliers.
#[async_trait]
pub trait FxRateProviderTrait: Send + Sync {
    fn name(&self) -> &'static str;

    async fn get_rates(&self, base: &str) -> Result<HashMap<String, Decimal>, FxError>;
}
