use async_trait::async_trait;
use chrono::NaiveDate;

use super::snapshot_model::{DailyPortfolioStats, DailyPositionSnapshot};
use crate::errors::Result;

/// Trait defining the contract for the snapshot store.
///
/// All writes are create-if-absent; a row that exists for its composite key
/// is never touched again. That is what makes duplicate job triggers safe.
#[async_trait]
pub trait SnapshotRepositoryTrait: Send + Sync {
    fn get_portfolio_stats(
        &self,
        owner_id: &str,
        portfolio_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailyPortfolioStats>>;

    /// Latest stats row strictly before `date`, for day-over-day changes.
    fn latest_portfolio_stats_before(
        &self,
        owner_id: &str,
        portfolio_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailyPortfolioStats>>;

    fn list_portfolio_stats_range(
        &self,
        owner_id: &str,
        portfolio_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyPortfolioStats>>;

    fn get_position_snapshots(
        &self,
        owner_id: &str,
        portfolio_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<DailyPositionSnapshot>>;

    /// Returns true when the row was inserted, false when one already
    /// existed for its owner/portfolio/date.
    async fn create_stats_if_absent(&self, stats: &DailyPortfolioStats) -> Result<bool>;

    /// Returns true when the row was inserted, false when one already
    /// existed for its owner/portfolio/position/date.
    async fn create_position_snapshot_if_absent(
        &self,
        snapshot: &DailyPositionSnapshot,
    ) -> Result<bool>;
}
