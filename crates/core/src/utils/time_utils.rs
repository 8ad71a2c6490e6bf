use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;

/// Default timezone for valuation dates.
/// This is the canonical timezone used to convert UTC instants to domain
/// dates. For a EUR-reporting portfolio tracker, Europe/Madrid is the
/// reference market close.
pub const DEFAULT_VALUATION_TZ: Tz = chrono_tz::Europe::Madrid;

/// Converts a UTC instant to a valuation date in the given timezone.
///
/// This is the single source of truth for converting instants to domain
/// dates; use it whenever a "business date" must be derived from a timestamp.
pub fn valuation_date_from_utc(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// Convenience function that uses the default valuation timezone.
pub fn valuation_date_today() -> NaiveDate {
    valuation_date_from_utc(Utc::now(), DEFAULT_VALUATION_TZ)
}

/// Markets trade Monday through Friday; holidays are absorbed by the price
/// resolver's tolerance window, not by the calendar.
pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// The closest business day strictly before `date`.
pub fn previous_business_day(date: NaiveDate) -> Option<NaiveDate> {
    let mut current = date.pred_opt()?;
    while !is_business_day(current) {
        current = current.pred_opt()?;
    }
    Some(current)
}

/// Business days in `[start, end]`, ascending. Empty when `start > end`.
pub fn business_days_between(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    if start > end {
        return Vec::new();
    }
    let mut days = Vec::new();
    let mut current = start;
    while current <= end {
        if is_business_day(current) {
            days.push(current);
        }
        if let Some(next) = current.succ_opt() {
            current = next;
        } else {
            break;
        }
    }
    days
}

/// Number of business days in `[start, end]`.
pub fn count_business_days(start: NaiveDate, end: NaiveDate) -> u64 {
    if start > end {
        return 0;
    }
    let total = (end - start).num_days() + 1;
    let full_weeks = total / 7;
    let mut count = full_weeks * 5;
    let mut current = start + Duration::days(full_weeks * 7);
    while current <= end {
        if is_business_day(current) {
            count += 1;
        }
        match current.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }
    count.max(0) as u64
}
