//! FX module - EUR cross-rate resolution with a provider fallback chain.

pub mod currency;
mod fx_errors;
mod fx_model;
mod fx_service;
mod fx_traits;
pub mod providers;

pub use fx_errors::*;
pub use fx_model::*;
pub use fx_service::*;
pub use fx_traits::*;
