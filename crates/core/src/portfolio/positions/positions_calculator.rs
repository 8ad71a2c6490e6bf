use log::warn;
use rust_decimal::Decimal;
use std::collections::HashMap;

use super::positions_model::{is_quantity_significant, Position};
use crate::errors::{CalculatorError, Result};
use crate::ledger::{sort_operations, Operation, PositionKey, TradeSide};

/// Result of replaying a portfolio's ledger into position state.
#[derive(Debug, Clone, Default)]
pub struct ReplayOutcome {
    positions: HashMap<PositionKey, Position>,
}

impl ReplayOutcome {
    /// Positions still holding a significant share count, ordered by key for
    /// deterministic output.
    pub fn active_positions(&self) -> Vec<Position> {
        let mut active: Vec<Position> = self
            .positions
            .values()
            .filter(|p| p.is_active())
            .cloned()
            .collect();
        active.sort_by(|a, b| a.key.cmp(&b.key));
        active
    }

    /// Every replayed position, closed ones included.
    pub fn position(&self, key: &PositionKey) -> Option<&Position> {
        self.positions.get(key)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Replays a portfolio's operations into average-cost position state.
///
/// Operations are re-sorted into (executed-at, sequence) order so replay is
/// deterministic even when several entries share a timestamp. A purchase
/// adds its shares and EUR cost; a sale removes cost proportionally to the
/// sold fraction, then the shares. A ledger whose replay would drive any
/// position's share count negative is surfaced as a
/// `CalculatorError` integrity violation, never clamped.
pub fn replay_operations(operations: &[Operation]) -> Result<ReplayOutcome> {
    let mut ordered = operations.to_vec();
    sort_operations(&mut ordered);

    let mut positions: HashMap<PositionKey, Position> = HashMap::new();

    for operation in &ordered {
        if operation.shares <= Decimal::ZERO {
            return Err(CalculatorError::InvalidOperation(format!(
                "operation {} has non-positive share count {}",
                operation.id, operation.shares
            ))
            .into());
        }

        let key = operation.position_key();
        match operation.side {
            TradeSide::Purchase => {
                let position = positions.entry(key).or_insert_with(|| Position {
                    key: operation.position_key(),
                    shares: Decimal::ZERO,
                    cost_basis_eur: Decimal::ZERO,
                    average_cost_eur: Decimal::ZERO,
                    currency: operation.currency.clone(),
                    first_purchase_at: operation.executed_at,
                });
                position.shares += operation.shares;
                position.cost_basis_eur += operation.purchase_cost_eur();
                if operation.executed_at < position.first_purchase_at {
                    position.first_purchase_at = operation.executed_at;
                }
            }
            TradeSide::Sale => {
                let position = match positions.get_mut(&key) {
                    Some(position) => position,
                    None => {
                        return Err(CalculatorError::SaleFromEmptyPosition {
                            symbol: operation.symbol.clone(),
                            operation_id: operation.id.clone(),
                        }
                        .into())
                    }
                };

                let shares_before = position.shares;
                if shares_before <= Decimal::ZERO || !is_quantity_significant(&shares_before) {
                    return Err(CalculatorError::SaleFromEmptyPosition {
                        symbol: operation.symbol.clone(),
                        operation_id: operation.id.clone(),
                    }
                    .into());
                }

                let shares_after = shares_before - operation.shares;
                if shares_after < Decimal::ZERO && is_quantity_significant(&shares_after) {
                    return Err(CalculatorError::NegativeShares {
                        symbol: operation.symbol.clone(),
                        operation_id: operation.id.clone(),
                        date: operation.executed_at.date_naive(),
                        held: shares_before,
                        sold: operation.shares,
                    }
                    .into());
                }

                // Average-cost relief: the sold fraction takes its share of
                // the basis with it.
                position.cost_basis_eur -=
                    position.cost_basis_eur * (operation.shares / shares_before);
                position.shares = shares_after;
            }
        }
    }

    for position in positions.values_mut() {
        if position.is_active() {
            position.average_cost_eur = position.cost_basis_eur / position.shares;
        } else {
            if !position.shares.is_zero() {
                warn!(
                    "Position {} left with insignificant residual quantity {}",
                    position.key, position.shares
                );
            }
            position.shares = Decimal::ZERO;
            position.cost_basis_eur = Decimal::ZERO;
            position.average_cost_eur = Decimal::ZERO;
        }
    }

    Ok(ReplayOutcome { positions })
}
