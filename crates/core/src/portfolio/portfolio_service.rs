use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::errors::Result;
use crate::ledger::LedgerRepositoryTrait;
use crate::portfolio::history::{HistoryPoint, HistoryService};
use crate::portfolio::positions::{replay_operations, Position};
use crate::portfolio::snapshot::{
    DailyPortfolioStats, DailyPositionSnapshot, SnapshotRepositoryTrait,
};
use crate::portfolio::trades::{match_closed_trades, ClosedTrade};

/// A stored daily snapshot with its position detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSnapshot {
    pub stats: DailyPortfolioStats,
    pub positions: Vec<DailyPositionSnapshot>,
}

/// Read facade over the engine for the API layer, report UI and context
/// builders. Pure reads; no write side effects, safe to call concurrently
/// with the snapshot job.
pub struct PortfolioService {
    ledger: Arc<dyn LedgerRepositoryTrait>,
    snapshots: Arc<dyn SnapshotRepositoryTrait>,
    history: Arc<HistoryService>,
}

impl PortfolioService {
    pub fn new(
        ledger: Arc<dyn LedgerRepositoryTrait>,
        snapshots: Arc<dyn SnapshotRepositoryTrait>,
        history: Arc<HistoryService>,
    ) -> Self {
        Self {
            ledger,
            snapshots,
            history,
        }
    }

    /// Positions currently holding shares, replayed from the ledger.
    pub fn get_active_positions(
        &self,
        owner_id: &str,
        portfolio_id: &str,
    ) -> Result<Vec<Position>> {
        let operations = self.ledger.list_operations(owner_id, portfolio_id)?;
        let replay = replay_operations(&operations)?;
        Ok(replay.active_positions())
    }

    /// Every sale enriched with its FIFO-matched purchase side.
    pub fn get_closed_trades(
        &self,
        owner_id: &str,
        portfolio_id: &str,
    ) -> Result<Vec<ClosedTrade>> {
        let operations = self.ledger.list_operations(owner_id, portfolio_id)?;
        let outcome = match_closed_trades(&operations)?;
        Ok(outcome.closed_trades)
    }

    /// Daily value/PnL series over the last `days` days, business days only.
    pub async fn get_history(
        &self,
        owner_id: &str,
        portfolio_id: &str,
        days: i64,
    ) -> Result<Vec<HistoryPoint>> {
        self.history.get_history(owner_id, portfolio_id, days).await
    }

    /// The stored snapshot of one date, position detail included. `None`
    /// when the job has not produced a row for that date.
    pub fn get_snapshot(
        &self,
        owner_id: &str,
        portfolio_id: &str,
        date: NaiveDate,
    ) -> Result<Option<PortfolioSnapshot>> {
        let stats = match self
            .snapshots
            .get_portfolio_stats(owner_id, portfolio_id, date)?
        {
            Some(stats) => stats,
            None => return Ok(None),
        };
        let mut positions = self
            .snapshots
            .get_position_snapshots(owner_id, portfolio_id, date)?;
        positions.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(Some(PortfolioSnapshot { stats, positions }))
    }
}
