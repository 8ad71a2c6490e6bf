//! Market data module - historical close resolution and the daily price cache.

pub mod market_data_constants;
mod market_data_errors;
mod market_data_model;
mod market_data_traits;
mod price_resolver;
pub mod providers;

pub use market_data_errors::*;
pub use market_data_model::*;
pub use market_data_traits::*;
pub use price_resolver::*;
