//! Pay periods, pay-period patterns, and the holiday calendar.
//!
//! A pattern owns the cutting frequency and the statutory timing schedule;
//! each [`PayPeriod`] is one immutable-once-locked cutoff window cut from it.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How often a pay-period pattern cuts periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayFrequency {
    /// One period per calendar month.
    Monthly,
    /// Two periods per calendar month, cut at mid-month.
    SemiMonthly,
    /// One period every two weeks.
    BiWeekly,
    /// One period per week.
    Weekly,
}

impl PayFrequency {
    /// Number of pay periods cut per calendar year.
    ///
    /// # Example
    ///
    /// ```
    /// use payroll_engine::models::PayFrequency;
    /// use rust_decimal::Decimal;
    ///
    /// assert_eq!(PayFrequency::SemiMonthly.periods_per_year(), Decimal::from(24));
    /// ```
    pub fn periods_per_year(&self) -> Decimal {
        match self {
            PayFrequency::Monthly => Decimal::from_parts(12, 0, 0, false, 0),
            PayFrequency::SemiMonthly => Decimal::from_parts(24, 0, 0, false, 0),
            PayFrequency::BiWeekly => Decimal::from_parts(26, 0, 0, false, 0),
            PayFrequency::Weekly => Decimal::from_parts(52, 0, 0, false, 0),
        }
    }

    /// Whether the frequency splits a month into two halves. Statutory
    /// timing policies only distinguish halves on such patterns.
    pub fn is_semi_monthly(&self) -> bool {
        matches!(self, PayFrequency::SemiMonthly)
    }
}

/// Which half of the month a period covers on semi-monthly patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodHalf {
    /// The first cutoff of the month.
    First,
    /// The second cutoff of the month.
    Second,
}

/// Timing policy for one statutory item on a pay-period pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributionTiming {
    /// Deducted on the first half of semi-monthly patterns.
    FirstHalf,
    /// Deducted on the second half of semi-monthly patterns.
    SecondHalf,
    /// Deducted every period.
    EveryPeriod,
    /// Never deducted.
    Disabled,
}

/// Timing policies for each statutory item on a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionSchedule {
    /// Social Security System contribution timing.
    pub sss: ContributionTiming,
    /// PhilHealth contribution timing.
    pub philhealth: ContributionTiming,
    /// Pag-IBIG (HDMF) contribution timing.
    pub pagibig: ContributionTiming,
    /// Withholding tax timing.
    pub withholding_tax: ContributionTiming,
}

impl Default for ContributionSchedule {
    fn default() -> Self {
        Self {
            sss: ContributionTiming::EveryPeriod,
            philhealth: ContributionTiming::EveryPeriod,
            pagibig: ContributionTiming::EveryPeriod,
            withholding_tax: ContributionTiming::EveryPeriod,
        }
    }
}

/// A recurring pay-period cutting pattern owned by a company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayPeriodPattern {
    /// Unique identifier for the pattern.
    pub id: String,
    /// The owning company.
    pub company_id: String,
    /// Cutting frequency.
    pub frequency: PayFrequency,
    /// Statutory deduction timing schedule.
    #[serde(default)]
    pub schedule: ContributionSchedule,
}

/// Lifecycle state of a pay period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodStatus {
    /// Accepting runs.
    Open,
    /// Frozen by a closed regular run; no further regular runs may start.
    Locked,
}

/// A fixed cutoff window for one payroll computation.
///
/// # Example
///
/// ```
/// use payroll_engine::models::{PayPeriod, PeriodHalf, PeriodStatus};
/// use chrono::NaiveDate;
///
/// let period = PayPeriod {
///     id: "2025-01-A".to_string(),
///     pattern_id: "SEMI-OPS".to_string(),
///     cutoff_start: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
///     cutoff_end: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
///     year: 2025,
///     half: PeriodHalf::First,
///     working_days: None,
///     status: PeriodStatus::Open,
/// };
///
/// assert!(period.contains(NaiveDate::from_ymd_opt(2025, 1, 8).unwrap()));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayPeriod {
    /// Unique identifier for the period (e.g., "2025-01-A").
    pub id: String,
    /// The pattern this period was cut from.
    pub pattern_id: String,
    /// First day of the cutoff window (inclusive).
    pub cutoff_start: NaiveDate,
    /// Last day of the cutoff window (inclusive).
    pub cutoff_end: NaiveDate,
    /// Calendar year the period belongs to.
    pub year: i32,
    /// Which half of the month the window covers.
    pub half: PeriodHalf,
    /// Optional override for the period's working-day count.
    #[serde(default)]
    pub working_days: Option<Decimal>,
    /// Lifecycle state.
    pub status: PeriodStatus,
}

impl PayPeriod {
    /// Whether `date` falls inside the cutoff window (inclusive).
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.cutoff_start <= date && date <= self.cutoff_end
    }
}

/// Kind of holiday, controlling overtime classification and premium rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HolidayKind {
    /// Regular holiday (e.g., New Year's Day).
    Regular,
    /// Special non-working day.
    SpecialNonWorking,
}

/// A calendar holiday observed by the company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holiday {
    /// The date the holiday falls on.
    pub date: NaiveDate,
    /// Display name (e.g., "Araw ng Kagitingan").
    pub name: String,
    /// Holiday kind.
    pub kind: HolidayKind,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_periods_per_year_by_frequency() {
        assert_eq!(PayFrequency::Monthly.periods_per_year(), dec("12"));
        assert_eq!(PayFrequency::SemiMonthly.periods_per_year(), dec("24"));
        assert_eq!(PayFrequency::BiWeekly.periods_per_year(), dec("26"));
        assert_eq!(PayFrequency::Weekly.periods_per_year(), dec("52"));
    }

    #[test]
    fn test_only_semi_monthly_distinguishes_halves() {
        assert!(PayFrequency::SemiMonthly.is_semi_monthly());
        assert!(!PayFrequency::Monthly.is_semi_monthly());
        assert!(!PayFrequency::BiWeekly.is_semi_monthly());
        assert!(!PayFrequency::Weekly.is_semi_monthly());
    }

    #[test]
    fn test_contribution_schedule_defaults_to_every_period() {
        let schedule = ContributionSchedule::default();
        assert_eq!(schedule.sss, ContributionTiming::EveryPeriod);
        assert_eq!(schedule.philhealth, ContributionTiming::EveryPeriod);
        assert_eq!(schedule.pagibig, ContributionTiming::EveryPeriod);
        assert_eq!(schedule.withholding_tax, ContributionTiming::EveryPeriod);
    }

    #[test]
    fn test_deserialize_pattern_with_schedule_defaulted() {
        let json = r#"{
            "id": "SEMI-OPS",
            "company_id": "PH-ACME",
            "frequency": "semi_monthly"
        }"#;
        let pattern: PayPeriodPattern = serde_json::from_str(json).unwrap();
        assert_eq!(pattern.frequency, PayFrequency::SemiMonthly);
        assert_eq!(pattern.schedule, ContributionSchedule::default());
    }

    #[test]
    fn test_period_contains_is_inclusive() {
        let period = PayPeriod {
            id: "2025-01-A".to_string(),
            pattern_id: "SEMI-OPS".to_string(),
            cutoff_start: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            cutoff_end: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            year: 2025,
            half: PeriodHalf::First,
            working_days: None,
            status: PeriodStatus::Open,
        };
        assert!(period.contains(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()));
        assert!(period.contains(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()));
        assert!(!period.contains(NaiveDate::from_ymd_opt(2025, 1, 16).unwrap()));
    }

    #[test]
    fn test_timing_serialization_uses_snake_case() {
        assert_eq!(
            serde_json::to_string(&ContributionTiming::FirstHalf).unwrap(),
            "\"first_half\""
        );
        assert_eq!(
            serde_json::to_string(&ContributionTiming::EveryPeriod).unwrap(),
            "\"every_period\""
        );
        assert_eq!(
            serde_json::to_string(&HolidayKind::SpecialNonWorking).unwrap(),
            "\"special_non_working\""
        );
    }
}
