pub const DATA_SOURCE_YAHOO: &str = "YAHOO";
pub const DATA_SOURCE_MANUAL: &str = "MANUAL";

/// Per-call timeout for provider requests.
pub const PROVIDER_TIMEOUT_SECS: u64 = 10;

/// How many days before a requested date the resolver may look for a candle.
/// Absorbs market holidays without a trading calendar.
pub const HOLIDAY_TOLERANCE_DAYS: i64 = 5;

/// Minimum cached-row coverage (fraction of expected trading days) below
/// which a position triggers a full historical re-fetch.
pub const PRICE_COVERAGE_THRESHOLD: &str = "0.70";

/// How far back history reconstruction looks for a carry-forward seed price
/// before its window starts.
pub const PRICE_CARRY_LOOKBACK_DAYS: i64 = 30;
