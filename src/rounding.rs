//! Numeric and date utilities shared by every calculation module.
//!
//! All monetary amounts are rounded to 2 decimal places and all day/hour
//! quantities and rates to 4 decimal places before they are stored, so that
//! recomputation from identical inputs is bit-for-bit reproducible.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

/// Fixed reporting timezone offset in hours (UTC+8, Asia/Manila).
pub const REPORTING_UTC_OFFSET_HOURS: i32 = 8;

/// Scheduled hours assumed per working day when an employee has no
/// explicit value.
pub const DEFAULT_HOURS_PER_DAY: Decimal = Decimal::from_parts(8, 0, 0, false, 0);

/// Calendar-day divisor used to annualize and de-annualize salaries.
/// Leap years are deliberately ignored.
pub const ANNUAL_DAY_DIVISOR: Decimal = Decimal::from_parts(365, 0, 0, false, 0);

/// Months per calendar year.
pub const MONTHS_PER_YEAR: Decimal = Decimal::from_parts(12, 0, 0, false, 0);

/// Working days per month assumed when converting a daily rate to its
/// monthly equivalent for statutory bracket lookups.
pub const DAILY_TO_MONTHLY_DAYS: Decimal = Decimal::from_parts(26, 0, 0, false, 0);

/// Minutes per hour, for tardiness/undertime deductions.
pub const MINUTES_PER_HOUR: Decimal = Decimal::from_parts(60, 0, 0, false, 0);

/// Rounds a monetary amount to 2 decimal places, midpoint away from zero.
///
/// # Example
///
/// ```
/// use payroll_engine::rounding::round_currency;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let amount = Decimal::from_str("1234.565").unwrap();
/// assert_eq!(round_currency(amount), Decimal::from_str("1234.57").unwrap());
/// ```
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds a day/hour quantity or per-unit rate to 4 decimal places,
/// midpoint away from zero.
pub fn round_quantity(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
}

/// Expands an inclusive cutoff window into its calendar days.
///
/// Returns an empty vector when `start` is after `end`.
pub fn days_in_window(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut day = start;
    while day <= end {
        days.push(day);
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
    days
}

/// Number of inclusive calendar days between two dates, zero when the
/// window is inverted.
pub fn calendar_days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    if start > end {
        return 0;
    }
    (end - start).num_days() + 1
}

/// Derives the calendar date key for a UTC instant in the fixed reporting
/// timezone. Falls back to the UTC date if the offset cannot be built.
pub fn reporting_date_key(at: DateTime<Utc>) -> NaiveDate {
    match FixedOffset::east_opt(REPORTING_UTC_OFFSET_HOURS * 3600) {
        Some(offset) => at.with_timezone(&offset).date_naive(),
        None => at.date_naive(),
    }
}
