//! Concrete FX rate providers.

mod exchange_rate_api_provider;
mod quote_fx_provider;

pub use exchange_rate_api_provider::*;
pub use quote_fx_provider::*;
