/// Reporting currency for all aggregated valuations.
pub const BASE_CURRENCY: &str = "EUR";

/// Decimal precision for valuation calculations
pub const DECIMAL_PRECISION: u32 = 6;

/// Quantity threshold for significant positions
pub const QUANTITY_THRESHOLD: &str = "0.00000001";

/// Reserved owner identity for the market benchmark snapshots.
/// Not a real user; rows written under it are shared across users.
pub const BENCHMARK_OWNER_ID: &str = "__MARKET__";

/// Portfolio identity for benchmark snapshot rows.
pub const BENCHMARK_PORTFOLIO_ID: &str = "BENCHMARK";

/// Benchmark instrument snapshotted alongside user portfolios.
pub const BENCHMARK_COMPANY: &str = "EURO STOXX 50";
pub const BENCHMARK_SYMBOL: &str = "^STOXX50E";
