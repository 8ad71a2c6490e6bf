//! Report rollups - monthly PnL samples, realized gains by month, drawdown
//! and concentration. A thin aggregation layer over snapshot/history output.

mod reports_model;
mod reports_service;

pub use reports_model::*;
pub use reports_service::*;
