//! Snapshot domain models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use uuid::Uuid;

use crate::ledger::PositionKey;
use crate::market_data::PriceSource;

/// Portfolio-level valuation record, unique per owner/portfolio/date.
/// Append-only: once a row exists for a date it is never rewritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPortfolioStats {
    pub id: String,
    pub owner_id: String,
    pub portfolio_id: String,
    pub date: NaiveDate,
    pub total_invested_eur: Decimal,
    pub total_value_eur: Decimal,
    pub pnl_eur: Decimal,
    /// PnL as a percentage of invested capital; zero when nothing is
    /// invested.
    pub roi_pct: Decimal,
    /// Change of total value against the latest prior stats row; absent for
    /// the first row of a portfolio.
    pub day_change_pct: Option<Decimal>,
    pub open_positions: u32,
    pub executed_sales: u32,
    pub created_at: DateTime<Utc>,
}

impl DailyPortfolioStats {
    pub fn make_id(owner_id: &str, portfolio_id: &str, date: NaiveDate) -> String {
        format!(
            "{}_{}_{}",
            owner_id,
            portfolio_id,
            date.format("%Y-%m-%d")
        )
    }
}

/// Position-level valuation record, unique per
/// owner/portfolio/position/date. Append-only like the portfolio row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPositionSnapshot {
    pub id: String,
    pub owner_id: String,
    pub portfolio_id: String,
    pub key: PositionKey,
    pub date: NaiveDate,
    pub shares: Decimal,
    pub cost_basis_eur: Decimal,
    pub close: Decimal,
    pub currency: String,
    pub fx_rate_to_eur: Decimal,
    pub market_value_eur: Decimal,
    pub pnl_eur: Decimal,
    pub pnl_pct: Decimal,
    pub source: PriceSource,
    pub created_at: DateTime<Utc>,
}

impl DailyPositionSnapshot {
    pub fn make_id(
        owner_id: &str,
        portfolio_id: &str,
        symbol: &str,
        date: NaiveDate,
    ) -> String {
        format!(
            "{}_{}_{}_{}",
            owner_id,
            portfolio_id,
            symbol,
            date.format("%Y-%m-%d")
        )
    }
}

/// One position (or portfolio) the job could not snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotFailure {
    pub owner_id: String,
    pub portfolio_id: String,
    /// Absent when the whole portfolio failed (ledger unreadable,
    /// integrity violation).
    pub position: Option<PositionKey>,
    pub reason: String,
}

/// Structured outcome of one job run. The job itself never returns an error
/// and never panics the host; everything it has to say is in here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobRunOutcome {
    /// Every portfolio snapshotted.
    Completed {
        stats_written: usize,
        positions_written: usize,
    },
    /// Some positions or portfolios failed; the rest were written.
    PartiallyFailed {
        stats_written: usize,
        positions_written: usize,
        failures: Vec<SnapshotFailure>,
    },
    /// Nothing was written (e.g. the processing date could not be
    /// determined or the portfolio list was unavailable).
    Failed { reason: String },
    /// A run was already in flight; this trigger was a no-op.
    Skipped,
}

/// Result envelope of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRunResult {
    pub run_id: Uuid,
    /// The business day that was snapshotted; absent for skipped/failed
    /// runs that never got that far.
    pub valuation_date: Option<NaiveDate>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcome: JobRunOutcome,
}

/// In-process job state owned by the single scheduler instance.
///
/// The running flag only guards reentrancy inside one process. Running
/// several instances requires an external lock/lease; that is a deployment
/// constraint of this engine.
#[derive(Default)]
pub struct SnapshotJobState {
    running: AtomicBool,
    last_run_at: RwLock<Option<DateTime<Utc>>>,
    last_outcome: RwLock<Option<JobRunOutcome>>,
}

impl SnapshotJobState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the running flag. False means a run is already in flight.
    pub fn try_begin(&self) -> bool {
        self.running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Releases the running flag and records the outcome.
    pub fn finish(&self, outcome: &JobRunOutcome) {
        if let Ok(mut guard) = self.last_run_at.write() {
            *guard = Some(Utc::now());
        }
        if let Ok(mut guard) = self.last_outcome.write() {
            *guard = Some(outcome.clone());
        }
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn last_run_at(&self) -> Option<DateTime<Utc>> {
        self.last_run_at.read().ok().and_then(|guard| *guard)
    }

    pub fn last_outcome(&self) -> Option<JobRunOutcome> {
        self.last_outcome
            .read()
            .ok()
            .and_then(|guard| guard.clone())
    }
}
