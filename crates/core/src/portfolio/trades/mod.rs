//! Closed trade matching - FIFO lot relief for realized PnL.

mod trades_matcher;
mod trades_model;

pub use trades_matcher::*;
pub use trades_model::*;
