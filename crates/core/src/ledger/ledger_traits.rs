use chrono::NaiveDate;

use super::ledger_model::{Operation, PortfolioRef};
use crate::errors::Result;

/// Trait defining the contract for reading the operation ledger.
///
/// Implemented by the external transactional layer. Implementations are not
/// required to return operations sorted; callers sort into replay order.
pub trait LedgerRepositoryTrait: Send + Sync {
    /// All operations for one owner/portfolio.
    fn list_operations(&self, owner_id: &str, portfolio_id: &str) -> Result<Vec<Operation>>;

    /// Operations executed on or before `as_of` (valuation-date granularity).
    fn list_operations_until(
        &self,
        owner_id: &str,
        portfolio_id: &str,
        as_of: NaiveDate,
    ) -> Result<Vec<Operation>>;

    /// Every (owner, portfolio) pair with at least one operation.
    fn list_portfolios(&self) -> Result<Vec<PortfolioRef>>;
}
