// Test cases for history reconstruction.
#[cfg(test)]
mod tests {
    use crate::errors::Result;
    use crate::fx::{FxError, FxRateProviderTrait, FxService};
    use crate::ledger::{LedgerRepositoryTrait, Operation, PortfolioRef, TradeSide};
    use crate::market_data::providers::models::ProviderCandle;
    use crate::market_data::{
        DailyPrice, DailyPriceRepositoryTrait, MarketDataError, MarketDataProviderTrait,
        PriceResolver, PriceSource,
    };
    use crate::portfolio::history::HistoryService;
    use crate::portfolio::positions::replay_operations;
    use crate::portfolio::trades::match_closed_trades;
    use async_trait::async_trait;
    use chrono::{NaiveDate, TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    struct MockLedger {
        operations: Vec<Operation>,
    }

    impl LedgerRepositoryTrait for MockLedger {
        fn list_operations(&self, owner_id: &str, portfolio_id: &str) -> Result<Vec<Operation>> {
            Ok(self
                .operations
                .iter()
                .filter(|o| o.owner_id == owner_id && o.portfolio_id == portfolio_id)
                .cloned()
                .collect())
        }

        fn list_operations_until(
            &self,
            owner_id: &str,
            portfolio_id: &str,
            as_of: NaiveDate,
        ) -> Result<Vec<Operation>> {
            Ok(self
                .list_operations(owner_id, portfolio_id)?
                .into_iter()
                .filter(|o| o.executed_at.date_naive() <= as_of)
                .collect())
        }

        fn list_portfolios(&self) -> Result<Vec<PortfolioRef>> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct MockPriceRepository {
        rows: Mutex<HashMap<(String, NaiveDate), DailyPrice>>,
    }

    impl MockPriceRepository {
        fn seed(&self, symbol: &str, date: NaiveDate, close: Decimal) {
            let price = DailyPrice {
                id: DailyPrice::make_id("user-1", symbol, date),
                owner_id: "user-1".to_string(),
                company: format!("{} Corp", symbol),
                symbol: symbol.to_string(),
                date,
                open: None,
                high: None,
                low: None,
                close,
                volume: None,
                currency: "EUR".to_string(),
                fx_rate_to_eur: Decimal::ONE,
                source: PriceSource::Manual,
                created_at: Utc::now(),
            };
            self.rows
                .lock()
                .unwrap()
                .insert((symbol.to_string(), date), price);
        }
    }

    #[async_trait]
    impl DailyPriceRepositoryTrait for MockPriceRepository {
        fn get_price(
            &self,
            _owner_id: &str,
            symbol: &str,
            date: NaiveDate,
        ) -> Result<Option<DailyPrice>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .get(&(symbol.to_string(), date))
                .cloned())
        }

        fn get_prices_in_range(
            &self,
            _owner_id: &str,
            symbol: &str,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<Vec<DailyPrice>> {
            let rows = self.rows.lock().unwrap();
            let mut result: Vec<DailyPrice> = rows
                .values()
                .filter(|p| p.symbol == symbol && p.date >= start && p.date <= end)
                .cloned()
                .collect();
            result.sort_by_key(|p| p.date);
            Ok(result)
        }

        fn count_prices(&self, _owner_id: &str, symbol: &str) -> Result<u64> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .values()
                .filter(|p| p.symbol == symbol)
                .count() as u64)
        }

        fn first_price_date(&self, _owner_id: &str, symbol: &str) -> Result<Option<NaiveDate>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .values()
                .filter(|p| p.symbol == symbol)
                .map(|p| p.date)
                .min())
        }

        async fn create_price_if_absent(&self, price: &DailyPrice) -> Result<bool> {
            let mut rows = self.rows.lock().unwrap();
            let key = (price.symbol.clone(), price.date);
            if rows.contains_key(&key) {
                return Ok(false);
            }
            rows.insert(key, price.clone());
            Ok(true)
        }

        async fn fill_missing_price_fields(&self, _price: &DailyPrice) -> Result<()> {
            Ok(())
        }
    }

    struct OfflineProvider;

    #[async_trait]
    impl MarketDataProviderTrait for OfflineProvider {
        fn source(&self) -> PriceSource {
            PriceSource::Yahoo
        }

        async fn get_daily_history(
            &self,
            _symbol: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> std::result::Result<Vec<ProviderCandle>, MarketDataError> {
            Err(MarketDataError::FetchFailed("offline".to_string()))
        }
    }

    struct OfflineFxProvider;

    #[async_trait]
    impl FxRateProviderTrait for OfflineFxProvider {
        fn name(&self) -> &'static str {
            "OFFLINE"
        }

        async fn get_rates(
            &self,
            _base: &str,
        ) -> std::result::Result<HashMap<String, Decimal>, FxError> {
            Err(FxError::FetchFailed("offline".to_string()))
        }
    }

    fn operation(
        id: &str,
        side: TradeSide,
        symbol: &str,
        shares: Decimal,
        price: Decimal,
        date: NaiveDate,
    ) -> Operation {
        let gross = shares * price;
        Operation {
            id: id.to_string(),
            owner_id: "user-1".to_string(),
            portfolio_id: "main".to_string(),
            side,
            company: format!("{} Corp", symbol),
            symbol: symbol.to_string(),
            shares,
            unit_price: price,
            currency: "EUR".to_string(),
            fx_rate_to_eur: Decimal::ONE,
            commission: Decimal::ZERO,
            total_eur: match side {
                TradeSide::Purchase => -gross,
                TradeSide::Sale => gross,
            },
            executed_at: Utc.from_utc_datetime(&date.and_hms_opt(10, 0, 0).unwrap()),
            sequence: date.and_hms_opt(10, 0, 0).unwrap().and_utc().timestamp(),
        }
    }

    fn service(
        operations: Vec<Operation>,
        prices: Arc<MockPriceRepository>,
    ) -> HistoryService {
        let fx = Arc::new(FxService::new(
            Arc::new(OfflineFxProvider),
            Arc::new(OfflineFxProvider),
        ));
        let resolver = Arc::new(PriceResolver::new(prices, Arc::new(OfflineProvider), fx));
        HistoryService::new(Arc::new(MockLedger { operations }), resolver)
    }

    #[tokio::test]
    async fn weekend_gap_carries_friday_close_forward() {
        let prices = Arc::new(MockPriceRepository::default());
        // Friday traded; Monday has no cached close; Tuesday traded again.
        prices.seed("ACME", d(2024, 3, 1), dec!(150));
        prices.seed("ACME", d(2024, 3, 5), dec!(160));

        let ops = vec![operation(
            "b1",
            TradeSide::Purchase,
            "ACME",
            dec!(10),
            dec!(100),
            d(2024, 1, 2),
        )];
        let history = service(ops, prices)
            .get_history_window("user-1", "main", d(2024, 3, 1), d(2024, 3, 5))
            .await
            .unwrap();

        // Business days only: Friday, Monday, Tuesday.
        let dates: Vec<NaiveDate> = history.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![d(2024, 3, 1), d(2024, 3, 4), d(2024, 3, 5)]);

        assert_eq!(history[0].total_value_eur, dec!(1500));
        // Monday carries Friday's close instead of dropping to zero.
        assert_eq!(history[1].total_value_eur, dec!(1500));
        assert_eq!(history[2].total_value_eur, dec!(1600));
    }

    #[tokio::test]
    async fn net_injected_capital_diverges_from_cost_basis_by_the_realized_gain() {
        let prices = Arc::new(MockPriceRepository::default());
        let mut day = d(2024, 3, 4);
        while day <= d(2024, 3, 8) {
            prices.seed("ACME", day, dec!(150));
            day = day.succ_opt().unwrap();
        }

        let ops = vec![
            operation(
                "b1",
                TradeSide::Purchase,
                "ACME",
                dec!(10),
                dec!(100),
                d(2024, 3, 4),
            ),
            operation(
                "s1",
                TradeSide::Sale,
                "ACME",
                dec!(5),
                dec!(150),
                d(2024, 3, 6),
            ),
        ];

        let history = service(ops.clone(), prices)
            .get_history_window("user-1", "main", d(2024, 3, 4), d(2024, 3, 8))
            .await
            .unwrap();

        // After the sale: 1000 out, 750 back in.
        let friday = history.last().unwrap();
        assert_eq!(friday.total_invested_eur, dec!(250));
        assert_eq!(friday.total_value_eur, dec!(750));

        // Cost basis keeps average-cost semantics; the gap to net injected
        // capital is exactly the realized gain.
        let replay = replay_operations(&ops).unwrap();
        let cost_basis = replay.active_positions()[0].cost_basis_eur;
        let realized: Decimal = match_closed_trades(&ops)
            .unwrap()
            .closed_trades
            .iter()
            .map(|t| t.realized_pnl_eur)
            .sum();
        assert_eq!(cost_basis, dec!(500));
        assert_eq!(cost_basis - friday.total_invested_eur, realized);
    }

    #[tokio::test]
    async fn empty_ledger_yields_empty_history() {
        let prices = Arc::new(MockPriceRepository::default());
        let history = service(Vec::new(), prices)
            .get_history_window("user-1", "main", d(2024, 3, 1), d(2024, 3, 5))
            .await
            .unwrap();
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn position_without_any_price_contributes_nothing_yet() {
        let prices = Arc::new(MockPriceRepository::default());
        let ops = vec![operation(
            "b1",
            TradeSide::Purchase,
            "ACME",
            dec!(10),
            dec!(100),
            d(2024, 3, 4),
        )];
        let history = service(ops, prices)
            .get_history_window("user-1", "main", d(2024, 3, 4), d(2024, 3, 5))
            .await
            .unwrap();

        assert_eq!(history[0].total_invested_eur, dec!(1000));
        assert_eq!(history[0].total_value_eur, Decimal::ZERO);
        assert_eq!(history[0].pnl_eur, dec!(-1000));
    }
}
