//! Keyed, request-budgeted provider backed by exchangerate-api.com.

use async_trait::async_trait;
use log::debug;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::fx::fx_errors::FxError;
use crate::fx::fx_traits::FxRateProviderTrait;

const BASE_URL: &str = "https://v6.exchangerate-api.com/v6";

/// Free-tier monthly request allowance; the counter is reset by
/// reconstructing the provider, which the host does on its billing cycle.
pub const DEFAULT_MONTHLY_BUDGET: u32 = 1500;

pub struct ExchangeRateApiProvider {
    client: reqwest::Client,
    api_key: String,
    budget_remaining: AtomicU32,
}

impl ExchangeRateApiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_budget(api_key, DEFAULT_MONTHLY_BUDGET)
    }

    pub fn with_budget(api_key: impl Into<String>, budget: u32) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            budget_remaining: AtomicU32::new(budget),
        }
    }

    pub fn budget_remaining(&self) -> u32 {
        self.budget_remaining.load(Ordering::Relaxed)
    }

    fn consume_budget(&self) -> Result<(), FxError> {
        let mut remaining = self.budget_remaining.load(Ordering::Relaxed);
        loop {
            if remaining == 0 {
                return Err(FxError::BudgetExhausted);
            }
            match self.budget_remaining.compare_exchange(
                remaining,
                remaining - 1,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return Ok(()),
                Err(actual) => remaining = actual,
            }
        }
    }
}

#[async_trait]
impl FxRateProviderTrait for ExchangeRateApiProvider {
    fn name(&self) -> &'static str {
        "EXCHANGE_RATE_API"
    }

    async fn get_rates(&self, base: &str) -> Result<HashMap<String, Decimal>, FxError> {
        self.consume_budget()?;

        let url = format!("{}/{}/latest/{}", BASE_URL, self.api_key, base);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FxError::FetchFailed(e.to_string()))?;

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| FxError::InvalidResponse(e.to_string()))?;

        if body.get("result").and_then(|v| v.as_str()) != Some("success") {
            return Err(FxError::InvalidResponse(format!(
                "unexpected result field: {}",
                body.get("result").cloned().unwrap_or_default()
            )));
        }

        let conversion_rates = body
            .get("conversion_rates")
            .and_then(|v| v.as_object())
            .ok_or_else(|| FxError::InvalidResponse("missing conversion_rates".to_string()))?;

        let mut rates = HashMap::new();
        for (currency, value) in conversion_rates {
            if let Some(rate) = value.as_f64().and_then(Decimal::from_f64_retain) {
                rates.insert(currency.clone(), rate);
            }
        }

        debug!(
            "Fetched {} rates from exchangerate-api, {} requests left",
            rates.len(),
            self.budget_remaining()
        );
        Ok(rates)
    }
}
