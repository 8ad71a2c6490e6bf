use chrono::{Duration, NaiveDate, Utc};
use log::debug;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::history_model::HistoryPoint;
use crate::errors::Result;
use crate::ledger::{sort_operations, LedgerRepositoryTrait, PositionKey, TradeSide};
use crate::market_data::market_data_constants::PRICE_CARRY_LOOKBACK_DAYS;
use crate::market_data::PriceResolver;
use crate::portfolio::positions::is_quantity_significant;
use crate::utils::time_utils::{
    business_days_between, valuation_date_from_utc, DEFAULT_VALUATION_TZ,
};

/// Reconstructs a portfolio's daily value/PnL series over an arbitrary
/// window, business days only.
///
/// A pure function of ledger + cached prices: no state of its own, freely
/// restartable, and safe to run concurrently with the snapshot job. Price
/// gaps carry the last known close forward instead of valuing a held
/// position at zero.
pub struct HistoryService {
    ledger: Arc<dyn LedgerRepositoryTrait>,
    resolver: Arc<PriceResolver>,
}

impl HistoryService {
    pub fn new(ledger: Arc<dyn LedgerRepositoryTrait>, resolver: Arc<PriceResolver>) -> Self {
        Self { ledger, resolver }
    }

    /// The last `days` calendar days ending today, reduced to business days.
    pub async fn get_history(
        &self,
        owner_id: &str,
        portfolio_id: &str,
        days: i64,
    ) -> Result<Vec<HistoryPoint>> {
        let end = valuation_date_from_utc(Utc::now(), DEFAULT_VALUATION_TZ);
        let start = end - Duration::days(days.max(0));
        self.get_history_window(owner_id, portfolio_id, start, end)
            .await
    }

    pub async fn get_history_window(
        &self,
        owner_id: &str,
        portfolio_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<HistoryPoint>> {
        let mut operations = self.ledger.list_operations(owner_id, portfolio_id)?;
        sort_operations(&mut operations);
        operations.retain(|op| op.executed_at.date_naive() <= end);

        if operations.is_empty() {
            return Ok(Vec::new());
        }

        // Every position ever touched in the window needs price coverage;
        // after this the per-day lookups below stay cache-only.
        let mut keys: Vec<PositionKey> = Vec::new();
        for operation in &operations {
            let key = operation.position_key();
            if !keys.contains(&key) {
                keys.push(key);
            }
        }

        let mut price_series: HashMap<PositionKey, BTreeMap<NaiveDate, (Decimal, Decimal)>> =
            HashMap::new();
        let seed_start = start - Duration::days(PRICE_CARRY_LOOKBACK_DAYS);
        for key in &keys {
            self.resolver.ensure_coverage(owner_id, key, end).await?;
            let rows = self
                .resolver
                .cached_range(owner_id, &key.symbol, seed_start, end)?;
            let series = rows
                .into_iter()
                .map(|p| (p.date, (p.close, p.fx_rate_to_eur)))
                .collect();
            price_series.insert(key.clone(), series);
        }

        let mut shares: HashMap<PositionKey, Decimal> = HashMap::new();
        let mut net_injected = Decimal::ZERO;
        let mut points = Vec::new();
        let mut next_op = 0usize;

        for day in business_days_between(start, end) {
            while next_op < operations.len()
                && operations[next_op].executed_at.date_naive() <= day
            {
                let operation = &operations[next_op];
                let entry = shares
                    .entry(operation.position_key())
                    .or_insert(Decimal::ZERO);
                match operation.side {
                    TradeSide::Purchase => *entry += operation.shares,
                    TradeSide::Sale => *entry -= operation.shares,
                }
                // Signed cash flow: purchases negative, sales positive, so
                // the running sum of outflows is just the negated total.
                net_injected -= operation.total_eur;
                next_op += 1;
            }

            let mut total_value = Decimal::ZERO;
            for (key, quantity) in &shares {
                if *quantity <= Decimal::ZERO || !is_quantity_significant(quantity) {
                    continue;
                }
                let last_known = price_series
                    .get(key)
                    .and_then(|series| series.range(..=day).next_back());
                match last_known {
                    Some((_, (close, fx_rate))) => {
                        total_value += *quantity * *close * *fx_rate;
                    }
                    None => {
                        debug!(
                            "No close at or before {} for {}, position valued at nothing yet",
                            day, key
                        );
                    }
                }
            }

            points.push(HistoryPoint {
                date: day,
                total_invested_eur: net_injected,
                total_value_eur: total_value,
                pnl_eur: total_value - net_injected,
            });
        }

        Ok(points)
    }
}
