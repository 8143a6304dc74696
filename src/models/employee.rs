//! Employee model and related types.
//!
//! This module defines the Employee struct, the pay basis it is anchored
//! on, and the recurring earning/deduction lines configured against it.

use chrono::{Datelike, NaiveDate, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::rounding::{DAILY_TO_MONTHLY_DAYS, round_currency};

/// How an employee's pay is anchored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "basis", rename_all = "snake_case")]
pub enum PayBasis {
    /// Salaried employee paid a fixed monthly amount.
    Monthly {
        /// The monthly base salary.
        monthly_salary: Decimal,
    },
    /// Wage employee paid per payable day.
    Daily {
        /// The rate for one payable day.
        daily_rate: Decimal,
    },
}

impl PayBasis {
    /// The monthly base salary used for statutory bracket lookups.
    ///
    /// Daily-rated employees are converted at 26 working days per month.
    pub fn monthly_equivalent(&self) -> Decimal {
        match self {
            PayBasis::Monthly { monthly_salary } => *monthly_salary,
            PayBasis::Daily { daily_rate } => round_currency(*daily_rate * DAILY_TO_MONTHLY_DAYS),
        }
    }
}

/// Weekly work schedule: rest days and scheduled hours per working day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkSchedule {
    /// Days of the week the employee is not scheduled to work.
    #[serde(default)]
    pub rest_days: Vec<Weekday>,
    /// Scheduled hours per working day; the engine assumes 8 when absent.
    #[serde(default)]
    pub hours_per_day: Option<Decimal>,
}

impl WorkSchedule {
    /// Returns true when `date` falls on one of the schedule's rest days.
    pub fn is_rest_day(&self, date: NaiveDate) -> bool {
        self.rest_days.contains(&date.weekday())
    }
}

/// Frequency with which a recurring line applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurringFrequency {
    /// Applies to every pay period.
    PerPeriod,
    /// Applies once per month; lands on the second half of semi-monthly
    /// patterns.
    Monthly,
}

/// Proration applied to a recurring earning for partial attendance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProrationPolicy {
    /// Applied in full whenever the line is due.
    #[default]
    None,
    /// Scaled by payable days over working days.
    DayRatio,
    /// Scaled by hours worked over scheduled hours.
    HourRatio,
}

/// A recurring earning line configured on an employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringEarning {
    /// Earning type code (e.g., "RICE_ALLOW").
    pub code: String,
    /// Human-readable description shown on the payslip line.
    pub description: String,
    /// Amount per application, before proration.
    pub amount: Decimal,
    /// How often the line applies.
    pub frequency: RecurringFrequency,
    /// Proration policy for partial attendance.
    #[serde(default)]
    pub proration: ProrationPolicy,
}

/// A recurring deduction line configured on an employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringDeduction {
    /// Deduction type code (e.g., "HMO_PREMIUM").
    pub code: String,
    /// Human-readable description shown on the payslip line.
    pub description: String,
    /// Amount per application.
    pub amount: Decimal,
    /// How often the line applies.
    pub frequency: RecurringFrequency,
    /// Deducted before withholding tax is computed when set.
    #[serde(default)]
    pub pre_tax: bool,
}

/// Represents an employee subject to payroll computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique identifier for the employee (e.g., "EMP-2025-00017").
    pub id: String,
    /// The owning company.
    pub company_id: String,
    /// Department used by run scope filters.
    #[serde(default)]
    pub department_id: Option<String>,
    /// Branch used by run scope filters.
    #[serde(default)]
    pub branch_id: Option<String>,
    /// Monthly-salaried or daily-rated pay anchoring.
    pub pay_basis: PayBasis,
    /// First day of employment.
    pub hire_date: NaiveDate,
    /// Last day of employment, when separated.
    #[serde(default)]
    pub separation_date: Option<NaiveDate>,
    /// Whether the employment type accrues a thirteenth-month benefit.
    #[serde(default = "default_true")]
    pub has_thirteenth_month: bool,
    /// Whether approved overtime is payable.
    #[serde(default)]
    pub overtime_eligible: bool,
    /// Whether recorded night-differential hours are payable.
    #[serde(default)]
    pub night_diff_eligible: bool,
    /// Substituted-filing taxpayers withhold a flat rate of the taxable base.
    #[serde(default)]
    pub substituted_filing: bool,
    /// Weekly work schedule.
    pub schedule: WorkSchedule,
    /// Recurring earnings applied by frequency and proration policy.
    #[serde(default)]
    pub recurring_earnings: Vec<RecurringEarning>,
    /// Recurring deductions applied by frequency.
    #[serde(default)]
    pub recurring_deductions: Vec<RecurringDeduction>,
    /// Inactive employees are excluded from run scopes.
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

impl Employee {
    /// Whether the employee is employed at any point inside the window.
    pub fn employed_during(&self, start: NaiveDate, end: NaiveDate) -> bool {
        if self.hire_date > end {
            return false;
        }
        match self.separation_date {
            Some(separated) => separated >= start,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn create_test_employee() -> Employee {
        Employee {
            id: "EMP-2025-00001".to_string(),
            company_id: "PH-ACME".to_string(),
            department_id: Some("OPS".to_string()),
            branch_id: None,
            pay_basis: PayBasis::Monthly {
                monthly_salary: dec("30000"),
            },
            hire_date: NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
            separation_date: None,
            has_thirteenth_month: true,
            overtime_eligible: true,
            night_diff_eligible: false,
            substituted_filing: false,
            schedule: WorkSchedule {
                rest_days: vec![Weekday::Sat, Weekday::Sun],
                hours_per_day: None,
            },
            recurring_earnings: vec![],
            recurring_deductions: vec![],
            active: true,
        }
    }

    #[test]
    fn test_deserialize_monthly_employee() {
        let json = r#"{
            "id": "EMP-2025-00001",
            "company_id": "PH-ACME",
            "pay_basis": { "basis": "monthly", "monthly_salary": "30000" },
            "hire_date": "2023-06-01",
            "schedule": { "rest_days": ["Sat", "Sun"] }
        }"#;

        let employee: Employee = serde_json::from_str(json).unwrap();
        assert_eq!(employee.id, "EMP-2025-00001");
        assert_eq!(
            employee.pay_basis,
            PayBasis::Monthly {
                monthly_salary: dec("30000")
            }
        );
        assert!(employee.has_thirteenth_month);
        assert!(employee.active);
        assert!(!employee.overtime_eligible);
        assert!(employee.schedule.hours_per_day.is_none());
    }

    #[test]
    fn test_deserialize_daily_employee() {
        let json = r#"{
            "id": "EMP-2025-00002",
            "company_id": "PH-ACME",
            "pay_basis": { "basis": "daily", "daily_rate": "650.00" },
            "hire_date": "2024-01-15",
            "overtime_eligible": true,
            "schedule": { "rest_days": ["Sun"], "hours_per_day": "8" }
        }"#;

        let employee: Employee = serde_json::from_str(json).unwrap();
        assert_eq!(
            employee.pay_basis,
            PayBasis::Daily {
                daily_rate: dec("650.00")
            }
        );
        assert!(employee.overtime_eligible);
        assert_eq!(employee.schedule.hours_per_day, Some(dec("8")));
    }

    #[test]
    fn test_serialize_round_trip() {
        let employee = create_test_employee();
        let json = serde_json::to_string(&employee).unwrap();
        let deserialized: Employee = serde_json::from_str(&json).unwrap();
        assert_eq!(employee, deserialized);
    }

    #[test]
    fn test_monthly_equivalent_for_monthly_basis() {
        let basis = PayBasis::Monthly {
            monthly_salary: dec("30000"),
        };
        assert_eq!(basis.monthly_equivalent(), dec("30000"));
    }

    #[test]
    fn test_monthly_equivalent_converts_daily_rate() {
        let basis = PayBasis::Daily {
            daily_rate: dec("650.00"),
        };
        assert_eq!(basis.monthly_equivalent(), dec("16900.00"));
    }

    #[test]
    fn test_is_rest_day_matches_schedule() {
        let employee = create_test_employee();
        // 2025-01-11 is a Saturday, 2025-01-13 a Monday.
        assert!(
            employee
                .schedule
                .is_rest_day(NaiveDate::from_ymd_opt(2025, 1, 11).unwrap())
        );
        assert!(
            !employee
                .schedule
                .is_rest_day(NaiveDate::from_ymd_opt(2025, 1, 13).unwrap())
        );
    }

    #[test]
    fn test_employed_during_respects_hire_and_separation() {
        let mut employee = create_test_employee();
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        assert!(employee.employed_during(start, end));

        employee.hire_date = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        assert!(!employee.employed_during(start, end));

        employee.hire_date = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
        employee.separation_date = Some(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
        assert!(!employee.employed_during(start, end));

        employee.separation_date = Some(start);
        assert!(employee.employed_during(start, end));
    }

    #[test]
    fn test_recurring_frequency_serialization() {
        assert_eq!(
            serde_json::to_string(&RecurringFrequency::PerPeriod).unwrap(),
            "\"per_period\""
        );
        assert_eq!(
            serde_json::to_string(&RecurringFrequency::Monthly).unwrap(),
            "\"monthly\""
        );
    }

    #[test]
    fn test_proration_policy_defaults_to_none() {
        let json = r#"{
            "code": "RICE_ALLOW",
            "description": "Rice allowance",
            "amount": "1000",
            "frequency": "monthly"
        }"#;
        let earning: RecurringEarning = serde_json::from_str(json).unwrap();
        assert_eq!(earning.proration, ProrationPolicy::None);
    }
}
