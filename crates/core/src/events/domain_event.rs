//! Domain event types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Domain events emitted by engine components after successful work.
///
/// These events represent facts about derived data. Runtime adapters
/// translate them into platform-specific actions (report generation,
/// cache invalidation, notification fan-out, etc.).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// The daily snapshot job finished a run. Report generation hangs off
    /// this event; a failing consumer never rolls the snapshots back.
    SnapshotCompleted {
        valuation_date: NaiveDate,
        portfolios_processed: usize,
        failure_count: usize,
    },

    /// A historical price backfill inserted rows for one position.
    PricesBackfilled {
        owner_id: String,
        symbol: String,
        rows_inserted: usize,
    },
}

impl DomainEvent {
    /// Creates a SnapshotCompleted event.
    pub fn snapshot_completed(
        valuation_date: NaiveDate,
        portfolios_processed: usize,
        failure_count: usize,
    ) -> Self {
        Self::SnapshotCompleted {
            valuation_date,
            portfolios_processed,
            failure_count,
        }
    }

    /// Creates a PricesBackfilled event.
    pub fn prices_backfilled(owner_id: String, symbol: String, rows_inserted: usize) -> Self {
        Self::PricesBackfilled {
            owner_id,
            symbol,
            rows_inserted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_snapshot_completed_serialization() {
        let event = DomainEvent::snapshot_completed(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            4,
            1,
        );

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("snapshot_completed"));

        let deserialized: DomainEvent = serde_json::from_str(&json).unwrap();
        match deserialized {
            DomainEvent::SnapshotCompleted {
                portfolios_processed,
                failure_count,
                ..
            } => {
                assert_eq!(portfolios_processed, 4);
                assert_eq!(failure_count, 1);
            }
            _ => panic!("Expected SnapshotCompleted"),
        }
    }
}
