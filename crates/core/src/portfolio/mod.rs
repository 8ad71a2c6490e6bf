//! Portfolio module - derived position state, realized trades, snapshots,
//! history reconstruction and report rollups.

pub mod history;
pub mod positions;
pub mod reports;
pub mod snapshot;
pub mod trades;

mod portfolio_service;

pub use history::*;
pub use portfolio_service::*;
pub use positions::*;
pub use reports::*;
pub use snapshot::*;
pub use trades::*;
