use chrono::Datelike;
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::HashMap;

use super::trades_model::{ClosedTrade, PurchaseLot};
use crate::errors::{CalculatorError, Result};
use crate::ledger::{sort_operations, Operation, PositionKey, TradeSide};

/// Result of FIFO-matching every sale in a ledger slice.
#[derive(Debug, Clone, Default)]
pub struct MatchOutcome {
    /// Sales enriched with their matched purchase side, sale order.
    pub closed_trades: Vec<ClosedTrade>,
    /// Per-position purchase lots with their post-matching remainders.
    pub open_lots: HashMap<PositionKey, Vec<PurchaseLot>>,
}

impl MatchOutcome {
    /// Unconsumed quantity left for one position. After matching, this must
    /// equal the open share count from ledger replay.
    pub fn remaining_shares(&self, key: &PositionKey) -> Decimal {
        self.open_lots
            .get(key)
            .map(|lots| lots.iter().map(|lot| lot.remaining).sum())
            .unwrap_or(Decimal::ZERO)
    }

    /// EUR cost still sitting in the unconsumed lots of one position.
    pub fn remaining_cost_eur(&self, key: &PositionKey) -> Decimal {
        self.open_lots
            .get(key)
            .map(|lots| lots.iter().map(|lot| lot.remaining_cost_eur()).sum())
            .unwrap_or(Decimal::ZERO)
    }
}

/// FIFO-matches sales against purchase lots to compute realized PnL.
///
/// Lot remainders are carried across the entire sale sequence of each
/// position: every sale consumes the oldest quantity that no earlier sale
/// already took. A sale that needs more shares than all remaining lots hold
/// is a ledger integrity violation.
pub fn match_closed_trades(operations: &[Operation]) -> Result<MatchOutcome> {
    let mut ordered = operations.to_vec();
    sort_operations(&mut ordered);

    let mut lots: HashMap<PositionKey, Vec<PurchaseLot>> = HashMap::new();
    let mut closed_trades = Vec::new();

    for operation in &ordered {
        match operation.side {
            TradeSide::Purchase => {
                lots.entry(operation.position_key())
                    .or_default()
                    .push(PurchaseLot {
                        operation_id: operation.id.clone(),
                        acquired_at: operation.executed_at,
                        shares: operation.shares,
                        total_cost_eur: operation.purchase_cost_eur(),
                        remaining: operation.shares,
                    });
            }
            TradeSide::Sale => {
                let position_lots = lots.entry(operation.position_key()).or_default();
                let trade = consume_lots(operation, position_lots)?;
                closed_trades.push(trade);
            }
        }
    }

    Ok(MatchOutcome {
        closed_trades,
        open_lots: lots,
    })
}

/// Consumes the oldest remaining lot quantity for one sale and builds its
/// closed-trade record.
fn consume_lots(sale: &Operation, lots: &mut [PurchaseLot]) -> Result<ClosedTrade> {
    let mut needed = sale.shares;
    let mut matched_cost = Decimal::ZERO;
    // Shares-weighted day numbers of the consumed lots, for the mean
    // purchase date.
    let mut weighted_days = Decimal::ZERO;

    for lot in lots.iter_mut() {
        if needed <= Decimal::ZERO {
            break;
        }
        if lot.remaining <= Decimal::ZERO {
            continue;
        }

        let take = lot.remaining.min(needed);
        matched_cost += lot.unit_cost_eur() * take;
        weighted_days += Decimal::from(lot.acquired_at.date_naive().num_days_from_ce()) * take;
        lot.remaining -= take;
        needed -= take;
    }

    if needed > Decimal::ZERO {
        let held = sale.shares - needed;
        return Err(CalculatorError::NegativeShares {
            symbol: sale.symbol.clone(),
            operation_id: sale.id.clone(),
            date: sale.executed_at.date_naive(),
            held,
            sold: sale.shares,
        }
        .into());
    }

    let net_proceeds = sale.sale_proceeds_eur();
    let realized_pnl = net_proceeds - matched_cost;
    let realized_pnl_pct = if matched_cost.is_zero() {
        Decimal::ZERO
    } else {
        realized_pnl / matched_cost * Decimal::from(100)
    };

    let avg_purchase_date = (weighted_days / sale.shares)
        .round()
        .to_i32()
        .and_then(chrono::NaiveDate::from_num_days_from_ce_opt)
        .unwrap_or_else(|| sale.executed_at.date_naive());

    Ok(ClosedTrade {
        operation_id: sale.id.clone(),
        owner_id: sale.owner_id.clone(),
        portfolio_id: sale.portfolio_id.clone(),
        key: sale.position_key(),
        sold_at: sale.executed_at,
        shares: sale.shares,
        unit_price: sale.unit_price,
        currency: sale.currency.clone(),
        net_proceeds_eur: net_proceeds,
        matched_cost_eur: matched_cost,
        realized_pnl_eur: realized_pnl,
        realized_pnl_pct,
        avg_purchase_date,
    })
}
