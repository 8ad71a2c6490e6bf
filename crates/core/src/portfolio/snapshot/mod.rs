//! Daily snapshot module - immutable valuation records and the job that
//! produces them.

mod snapshot_job;
mod snapshot_model;
mod snapshot_traits;

pub use snapshot_job::*;
pub use snapshot_model::*;
pub use snapshot_traits::*;
