use chrono::Datelike;
use rust_decimal::Decimal;

use super::reports_model::{
    ConcentrationReport, DrawdownPoint, MonthlyPnl, MonthlyRealized, PositionWeight,
};
use crate::ledger::PositionKey;
use crate::portfolio::history::HistoryPoint;
use crate::portfolio::trades::ClosedTrade;

/// End-of-month PnL levels from a daily history series.
///
/// "Best month" language downstream refers to these levels, not to
/// month-over-month deltas.
pub fn month_end_pnl(points: &[HistoryPoint]) -> Vec<MonthlyPnl> {
    let mut samples: Vec<MonthlyPnl> = Vec::new();
    for point in points {
        let year = point.date.year();
        let month = point.date.month();
        match samples.last_mut() {
            // Points arrive date-ascending, so the last point of a month
            // wins by overwriting.
            Some(last) if last.year == year && last.month == month => {
                last.pnl_eur = point.pnl_eur;
            }
            _ => samples.push(MonthlyPnl {
                year,
                month,
                pnl_eur: point.pnl_eur,
            }),
        }
    }
    samples
}

/// Best and worst end-of-month PnL samples, by level.
pub fn best_and_worst_month(samples: &[MonthlyPnl]) -> Option<(MonthlyPnl, MonthlyPnl)> {
    let best = samples.iter().max_by_key(|s| s.pnl_eur)?;
    let worst = samples.iter().min_by_key(|s| s.pnl_eur)?;
    Some((best.clone(), worst.clone()))
}

/// Realized gains grouped by sale month, ascending.
pub fn realized_by_month(trades: &[ClosedTrade]) -> Vec<MonthlyRealized> {
    let mut buckets: Vec<MonthlyRealized> = Vec::new();
    let mut ordered: Vec<&ClosedTrade> = trades.iter().collect();
    ordered.sort_by_key(|t| t.sold_at);

    for trade in ordered {
        let date = trade.sold_at.date_naive();
        let year = date.year();
        let month = date.month();
        match buckets
            .iter_mut()
            .find(|b| b.year == year && b.month == month)
        {
            Some(bucket) => bucket.realized_eur += trade.realized_pnl_eur,
            None => buckets.push(MonthlyRealized {
                year,
                month,
                realized_eur: trade.realized_pnl_eur,
            }),
        }
    }
    buckets
}

/// Percentage drop from the running PnL peak, per day.
pub fn drawdown_series(points: &[HistoryPoint]) -> Vec<DrawdownPoint> {
    let mut peak = Decimal::MIN;
    let mut series = Vec::with_capacity(points.len());

    for point in points {
        if point.pnl_eur > peak {
            peak = point.pnl_eur;
        }
        let drawdown_pct = if peak > Decimal::ZERO {
            (peak - point.pnl_eur) / peak * Decimal::from(100)
        } else {
            Decimal::ZERO
        };
        series.push(DrawdownPoint {
            date: point.date,
            pnl_eur: point.pnl_eur,
            peak_pnl_eur: peak,
            drawdown_pct,
        });
    }
    series
}

/// Herfindahl concentration over position market values.
pub fn concentration(values: &[(PositionKey, Decimal)]) -> ConcentrationReport {
    let total: Decimal = values.iter().map(|(_, value)| *value).sum();
    if total <= Decimal::ZERO {
        return ConcentrationReport {
            herfindahl_index: Decimal::ZERO,
            weights: Vec::new(),
        };
    }

    let mut herfindahl_index = Decimal::ZERO;
    let mut weights = Vec::with_capacity(values.len());
    for (key, value) in values {
        let fraction = *value / total;
        herfindahl_index += fraction * fraction;
        weights.push(PositionWeight {
            key: key.clone(),
            market_value_eur: *value,
            weight_pct: fraction * Decimal::from(100),
        });
    }
    weights.sort_by(|a, b| b.market_value_eur.cmp(&a.market_value_eur));

    ConcentrationReport {
        herfindahl_index,
        weights,
    }
}
