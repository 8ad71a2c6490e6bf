//! Position aggregation - ledger replay into average-cost position state.

mod positions_calculator;
mod positions_model;

pub use positions_calculator::*;
pub use positions_model::*;
