//! Ledger module - operation models and ledger-store access traits.
//!
//! The ledger itself is owned by the external CRUD layer; this module only
//! defines what an operation looks like to the engine and the trait the
//! ledger store implements.

mod ledger_model;
mod ledger_traits;

pub use ledger_model::*;
pub use ledger_traits::*;
