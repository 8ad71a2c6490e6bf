use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use futures::future::join_all;
use log::{debug, error, info};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use super::snapshot_model::{
    DailyPortfolioStats, DailyPositionSnapshot, JobRunOutcome, JobRunResult, SnapshotFailure,
    SnapshotJobState,
};
use super::snapshot_traits::SnapshotRepositoryTrait;
use crate::constants::{
    BENCHMARK_COMPANY, BENCHMARK_OWNER_ID, BENCHMARK_PORTFOLIO_ID, BENCHMARK_SYMBOL,
    DECIMAL_PRECISION,
};
use crate::errors::Result;
use crate::events::{DomainEvent, DomainEventSink, NoOpDomainEventSink};
use crate::ledger::{LedgerRepositoryTrait, PortfolioRef, PositionKey, TradeSide};
use crate::market_data::{DailyPrice, MarketDataError, PriceResolver};
use crate::portfolio::positions::{replay_operations, Position};
use crate::utils::time_utils::{
    previous_business_day, valuation_date_from_utc, DEFAULT_VALUATION_TZ,
};

/// Tunables for the daily snapshot job.
#[derive(Debug, Clone)]
pub struct SnapshotJobOptions {
    /// Timezone the processing date is derived in.
    pub valuation_tz: Tz,
    /// Whether the reserved market-index identity is snapshotted too.
    pub snapshot_benchmark: bool,
}

impl Default for SnapshotJobOptions {
    fn default() -> Self {
        Self {
            valuation_tz: DEFAULT_VALUATION_TZ,
            snapshot_benchmark: true,
        }
    }
}

#[derive(Default)]
struct PortfolioWriteResult {
    stats_written: usize,
    positions_written: usize,
    failures: Vec<SnapshotFailure>,
}

/// Produces one immutable valuation record per owner/portfolio/day and per
/// position/day, for the previous business day.
///
/// State machine: Idle -> Running -> {Completed | PartiallyFailed} -> Idle,
/// guarded by the in-process flag in [`SnapshotJobState`]. The guard does
/// not protect against concurrent execution across process instances;
/// deploying more than one scheduler requires an external lock. Re-running
/// for a date that already has rows is safe because every write is
/// create-if-absent.
pub struct DailySnapshotJob {
    ledger: Arc<dyn LedgerRepositoryTrait>,
    snapshots: Arc<dyn SnapshotRepositoryTrait>,
    resolver: Arc<PriceResolver>,
    state: Arc<SnapshotJobState>,
    event_sink: Arc<dyn DomainEventSink>,
    options: SnapshotJobOptions,
}

impl DailySnapshotJob {
    pub fn new(
        ledger: Arc<dyn LedgerRepositoryTrait>,
        snapshots: Arc<dyn SnapshotRepositoryTrait>,
        resolver: Arc<PriceResolver>,
    ) -> Self {
        Self {
            ledger,
            snapshots,
            resolver,
            state: Arc::new(SnapshotJobState::new()),
            event_sink: Arc::new(NoOpDomainEventSink),
            options: SnapshotJobOptions::default(),
        }
    }

    /// Sets the domain event sink for this job.
    pub fn with_event_sink(mut self, event_sink: Arc<dyn DomainEventSink>) -> Self {
        self.event_sink = event_sink;
        self
    }

    pub fn with_options(mut self, options: SnapshotJobOptions) -> Self {
        self.options = options;
        self
    }

    /// The job's state record, for scheduler introspection.
    pub fn state(&self) -> Arc<SnapshotJobState> {
        self.state.clone()
    }

    /// Runs the job against the current wall clock.
    pub async fn run(&self) -> JobRunResult {
        self.run_at(Utc::now()).await
    }

    /// Runs the job as if triggered at `now`. Never returns an error and
    /// never panics the host; the outcome carries everything that happened.
    pub async fn run_at(&self, now: DateTime<Utc>) -> JobRunResult {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();

        if !self.state.try_begin() {
            debug!("Snapshot job trigger skipped, a run is already in flight");
            return JobRunResult {
                run_id,
                valuation_date: None,
                started_at,
                finished_at: Utc::now(),
                outcome: JobRunOutcome::Skipped,
            };
        }

        let valuation_date = self.processing_date(now);
        let outcome = match valuation_date {
            Some(date) => self.run_inner(date).await,
            None => JobRunOutcome::Failed {
                reason: "could not determine the processing date".to_string(),
            },
        };

        self.state.finish(&outcome);
        JobRunResult {
            run_id,
            valuation_date,
            started_at,
            finished_at: Utc::now(),
            outcome,
        }
    }

    /// Previous business day relative to `now` in the configured timezone.
    /// Weekend triggers roll back to Friday.
    fn processing_date(&self, now: DateTime<Utc>) -> Option<NaiveDate> {
        let today = valuation_date_from_utc(now, self.options.valuation_tz);
        previous_business_day(today)
    }

    async fn run_inner(&self, date: NaiveDate) -> JobRunOutcome {
        let portfolios = match self.ledger.list_portfolios() {
            Ok(portfolios) => portfolios,
            Err(e) => {
                error!("Snapshot job could not list portfolios: {}", e);
                return JobRunOutcome::Failed {
                    reason: format!("could not list portfolios: {}", e),
                };
            }
        };

        info!(
            "Snapshot job running for {} over {} portfolios",
            date,
            portfolios.len()
        );

        let mut stats_written = 0usize;
        let mut positions_written = 0usize;
        let mut failures: Vec<SnapshotFailure> = Vec::new();

        for portfolio in &portfolios {
            match self.snapshot_portfolio(portfolio, date).await {
                Ok(result) => {
                    stats_written += result.stats_written;
                    positions_written += result.positions_written;
                    failures.extend(result.failures);
                }
                Err(e) => {
                    error!(
                        "Snapshot of portfolio {}/{} failed: {}",
                        portfolio.owner_id, portfolio.portfolio_id, e
                    );
                    failures.push(SnapshotFailure {
                        owner_id: portfolio.owner_id.clone(),
                        portfolio_id: portfolio.portfolio_id.clone(),
                        position: None,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if self.options.snapshot_benchmark {
            self.snapshot_benchmark(date, &mut positions_written, &mut failures)
                .await;
        }

        // Report generation hangs off this event; a failing consumer never
        // rolls the snapshots back.
        self.event_sink.emit(DomainEvent::snapshot_completed(
            date,
            portfolios.len(),
            failures.len(),
        ));

        if failures.is_empty() {
            JobRunOutcome::Completed {
                stats_written,
                positions_written,
            }
        } else {
            JobRunOutcome::PartiallyFailed {
                stats_written,
                positions_written,
                failures,
            }
        }
    }

    async fn snapshot_portfolio(
        &self,
        portfolio: &PortfolioRef,
        date: NaiveDate,
    ) -> Result<PortfolioWriteResult> {
        let operations =
            self.ledger
                .list_operations_until(&portfolio.owner_id, &portfolio.portfolio_id, date)?;
        if operations.is_empty() {
            return Ok(PortfolioWriteResult::default());
        }

        let replay = replay_operations(&operations)?;
        let active = replay.active_positions();

        let resolutions = join_all(active.iter().map(|position| {
            self.resolver
                .resolve_close(&portfolio.owner_id, &position.key, date)
        }))
        .await;

        let mut result = PortfolioWriteResult::default();
        let mut total_invested = Decimal::ZERO;
        let mut total_value = Decimal::ZERO;
        let mut position_rows: Vec<DailyPositionSnapshot> = Vec::new();

        for (position, resolution) in active.iter().zip(resolutions) {
            match resolution {
                Ok(Some(price)) => {
                    total_invested += position.cost_basis_eur;
                    total_value += price.market_value_eur(position.shares);
                    position_rows.push(self.build_position_row(portfolio, position, &price, date));
                }
                Ok(None) => {
                    // Missing price data: the position is skipped for this
                    // date and the aggregate stays partial.
                    result.failures.push(SnapshotFailure {
                        owner_id: portfolio.owner_id.clone(),
                        portfolio_id: portfolio.portfolio_id.clone(),
                        position: Some(position.key.clone()),
                        reason: MarketDataError::MissingPriceData {
                            symbol: position.key.symbol.clone(),
                            date,
                        }
                        .to_string(),
                    });
                }
                Err(e) => {
                    result.failures.push(SnapshotFailure {
                        owner_id: portfolio.owner_id.clone(),
                        portfolio_id: portfolio.portfolio_id.clone(),
                        position: Some(position.key.clone()),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let pnl = total_value - total_invested;
        let roi_pct = if total_invested.is_zero() {
            Decimal::ZERO
        } else {
            pnl / total_invested * Decimal::from(100)
        };

        let day_change_pct = self
            .snapshots
            .latest_portfolio_stats_before(&portfolio.owner_id, &portfolio.portfolio_id, date)?
            .and_then(|previous| {
                if previous.total_value_eur.is_zero() {
                    None
                } else {
                    Some(
                        (total_value - previous.total_value_eur) / previous.total_value_eur
                            * Decimal::from(100),
                    )
                }
            });

        let executed_sales = operations
            .iter()
            .filter(|op| op.side == TradeSide::Sale)
            .count() as u32;

        let stats = DailyPortfolioStats {
            id: DailyPortfolioStats::make_id(&portfolio.owner_id, &portfolio.portfolio_id, date),
            owner_id: portfolio.owner_id.clone(),
            portfolio_id: portfolio.portfolio_id.clone(),
            date,
            total_invested_eur: total_invested.round_dp(DECIMAL_PRECISION),
            total_value_eur: total_value.round_dp(DECIMAL_PRECISION),
            pnl_eur: pnl.round_dp(DECIMAL_PRECISION),
            roi_pct: roi_pct.round_dp(DECIMAL_PRECISION),
            day_change_pct: day_change_pct.map(|v| v.round_dp(DECIMAL_PRECISION)),
            open_positions: active.len() as u32,
            executed_sales,
            created_at: Utc::now(),
        };

        if self.snapshots.create_stats_if_absent(&stats).await? {
            result.stats_written += 1;
        } else {
            debug!(
                "Stats row for {}/{} on {} already exists, left untouched",
                portfolio.owner_id, portfolio.portfolio_id, date
            );
        }

        for row in &position_rows {
            if self.snapshots.create_position_snapshot_if_absent(row).await? {
                result.positions_written += 1;
            }
        }

        Ok(result)
    }

    fn build_position_row(
        &self,
        portfolio: &PortfolioRef,
        position: &Position,
        price: &DailyPrice,
        date: NaiveDate,
    ) -> DailyPositionSnapshot {
        let market_value = price.market_value_eur(position.shares);
        let pnl = market_value - position.cost_basis_eur;
        let pnl_pct = if position.cost_basis_eur.is_zero() {
            Decimal::ZERO
        } else {
            pnl / position.cost_basis_eur * Decimal::from(100)
        };

        DailyPositionSnapshot {
            id: DailyPositionSnapshot::make_id(
                &portfolio.owner_id,
                &portfolio.portfolio_id,
                &position.key.symbol,
                date,
            ),
            owner_id: portfolio.owner_id.clone(),
            portfolio_id: portfolio.portfolio_id.clone(),
            key: position.key.clone(),
            date,
            shares: position.shares,
            cost_basis_eur: position.cost_basis_eur.round_dp(DECIMAL_PRECISION),
            close: price.close,
            currency: price.currency.clone(),
            fx_rate_to_eur: price.fx_rate_to_eur,
            market_value_eur: market_value.round_dp(DECIMAL_PRECISION),
            pnl_eur: pnl.round_dp(DECIMAL_PRECISION),
            pnl_pct: pnl_pct.round_dp(DECIMAL_PRECISION),
            source: price.source,
            created_at: Utc::now(),
        }
    }

    /// Snapshots the reserved market-index identity with one synthetic
    /// unit, so every user's history can be compared against the index.
    async fn snapshot_benchmark(
        &self,
        date: NaiveDate,
        positions_written: &mut usize,
        failures: &mut Vec<SnapshotFailure>,
    ) {
        let key = PositionKey::new(BENCHMARK_COMPANY, BENCHMARK_SYMBOL);
        let benchmark = PortfolioRef {
            owner_id: BENCHMARK_OWNER_ID.to_string(),
            portfolio_id: BENCHMARK_PORTFOLIO_ID.to_string(),
        };

        let fail = |reason: String| SnapshotFailure {
            owner_id: benchmark.owner_id.clone(),
            portfolio_id: benchmark.portfolio_id.clone(),
            position: Some(key.clone()),
            reason,
        };

        match self
            .resolver
            .resolve_close(BENCHMARK_OWNER_ID, &key, date)
            .await
        {
            Ok(Some(price)) => {
                let unit = Position {
                    key: key.clone(),
                    shares: Decimal::ONE,
                    cost_basis_eur: Decimal::ZERO,
                    average_cost_eur: Decimal::ZERO,
                    currency: price.currency.clone(),
                    first_purchase_at: Utc::now(),
                };
                let mut row = self.build_position_row(&benchmark, &unit, &price, date);
                // The synthetic unit carries no basis; its PnL is not
                // meaningful.
                row.pnl_eur = Decimal::ZERO;
                row.pnl_pct = Decimal::ZERO;
                match self.snapshots.create_position_snapshot_if_absent(&row).await {
                    Ok(true) => *positions_written += 1,
                    Ok(false) => {}
                    Err(e) => failures.push(fail(e.to_string())),
                }
            }
            Ok(None) => failures.push(fail(
                MarketDataError::MissingPriceData {
                    symbol: key.symbol.clone(),
                    date,
                }
                .to_string(),
            )),
            Err(e) => failures.push(fail(e.to_string())),
        }
    }
}
