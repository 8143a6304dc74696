//! Contribution and recurring-line timing resolution.
//!
//! Timing policies are written against semi-monthly patterns, where a month
//! has a first and a second cutoff. On any other frequency there is no
//! half to land on, so FIRST_HALF and SECOND_HALF collapse to every-period
//! behavior; DISABLED always wins.

use crate::models::{ContributionTiming, PayFrequency, PeriodHalf, RecurringFrequency};

/// Whether a statutory item deducts on the given period.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::timing_applies;
/// use payroll_engine::models::{ContributionTiming, PayFrequency, PeriodHalf};
///
/// // SECOND_HALF policy on the first semi-monthly cutoff: skipped.
/// assert!(!timing_applies(
///     ContributionTiming::SecondHalf,
///     PayFrequency::SemiMonthly,
///     PeriodHalf::First,
/// ));
///
/// // The same policy on a monthly pattern collapses to every period.
/// assert!(timing_applies(
///     ContributionTiming::SecondHalf,
///     PayFrequency::Monthly,
///     PeriodHalf::First,
/// ));
/// ```
pub fn timing_applies(
    timing: ContributionTiming,
    frequency: PayFrequency,
    half: PeriodHalf,
) -> bool {
    match timing {
        ContributionTiming::Disabled => false,
        ContributionTiming::EveryPeriod => true,
        ContributionTiming::FirstHalf => {
            !frequency.is_semi_monthly() || half == PeriodHalf::First
        }
        ContributionTiming::SecondHalf => {
            !frequency.is_semi_monthly() || half == PeriodHalf::Second
        }
    }
}

/// Whether a recurring earning or deduction line lands on the given period.
///
/// Monthly lines land once a month: on the second half of semi-monthly
/// patterns, and on every period of any other frequency.
pub fn recurring_due(
    line_frequency: RecurringFrequency,
    pay_frequency: PayFrequency,
    half: PeriodHalf,
) -> bool {
    match line_frequency {
        RecurringFrequency::PerPeriod => true,
        RecurringFrequency::Monthly => {
            !pay_frequency.is_semi_monthly() || half == PeriodHalf::Second
        }
    }
}
