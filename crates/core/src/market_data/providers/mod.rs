//! Concrete market data providers.

pub mod models;
mod yahoo_provider;

pub use yahoo_provider::*;
