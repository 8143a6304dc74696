//! Derived pay rates and the period basic pay.
//!
//! Monthly salaries annualize over a fixed 365-day year when deriving the
//! daily rate, so the derived rates drift slightly from a calendar-exact
//! figure; the divisor is centralized in [`crate::rounding`] and kept
//! as-is for parity with historical payslips.

use rust_decimal::Decimal;

use crate::calculation::attendance::AttendanceSummary;
use crate::models::{Employee, PayBasis, PayFrequency};
use crate::rounding::{
    ANNUAL_DAY_DIVISOR, DEFAULT_HOURS_PER_DAY, MONTHS_PER_YEAR, round_currency, round_quantity,
};

/// The rate ladder derived once per employee per calculation pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmployeeRates {
    /// Monthly base salary, or its 26-day equivalent for daily-rated staff.
    pub monthly_base: Decimal,
    /// Rate for one payable day, at 4 dp.
    pub daily_rate: Decimal,
    /// Rate for one worked hour, at 4 dp.
    pub hourly_rate: Decimal,
    /// Base salary for one period; zero for daily-rated staff, whose basic
    /// pay comes entirely from payable days.
    pub period_base: Decimal,
}

/// Derives the employee's rate ladder for a pay frequency.
///
/// Monthly basis: `dailyRate = monthlySalary x 12 / 365`, `hourlyRate =
/// dailyRate / hoursPerDay` (8 when unscheduled), `periodBase =
/// monthlySalary x 12 / periodsPerYear`.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::employee_rates;
/// # use payroll_engine::models::{Employee, PayBasis, PayFrequency, WorkSchedule};
/// # use chrono::NaiveDate;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// # let employee = Employee {
/// #     id: "EMP-2025-00001".to_string(),
/// #     company_id: "PH-ACME".to_string(),
/// #     department_id: None,
/// #     branch_id: None,
/// #     pay_basis: PayBasis::Monthly { monthly_salary: Decimal::from(30000) },
/// #     hire_date: NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
/// #     separation_date: None,
/// #     has_thirteenth_month: true,
/// #     overtime_eligible: false,
/// #     night_diff_eligible: false,
/// #     substituted_filing: false,
/// #     schedule: WorkSchedule { rest_days: vec![], hours_per_day: None },
/// #     recurring_earnings: vec![],
/// #     recurring_deductions: vec![],
/// #     active: true,
/// # };
/// let rates = employee_rates(&employee, PayFrequency::SemiMonthly);
/// assert_eq!(rates.daily_rate, Decimal::from_str("986.3014").unwrap());
/// assert_eq!(rates.period_base, Decimal::from_str("15000.00").unwrap());
/// ```
pub fn employee_rates(employee: &Employee, frequency: PayFrequency) -> EmployeeRates {
    let hours_per_day = employee
        .schedule
        .hours_per_day
        .filter(|h| *h > Decimal::ZERO)
        .unwrap_or(DEFAULT_HOURS_PER_DAY);

    match employee.pay_basis {
        PayBasis::Monthly { monthly_salary } => {
            let daily_rate =
                round_quantity(monthly_salary * MONTHS_PER_YEAR / ANNUAL_DAY_DIVISOR);
            EmployeeRates {
                monthly_base: monthly_salary,
                daily_rate,
                hourly_rate: round_quantity(daily_rate / hours_per_day),
                period_base: round_currency(
                    monthly_salary * MONTHS_PER_YEAR / frequency.periods_per_year(),
                ),
            }
        }
        PayBasis::Daily { daily_rate } => {
            let daily_rate = round_quantity(daily_rate);
            EmployeeRates {
                monthly_base: employee.pay_basis.monthly_equivalent(),
                daily_rate,
                hourly_rate: round_quantity(daily_rate / hours_per_day),
                period_base: Decimal::ZERO,
            }
        }
    }
}

/// Period basic pay with the absence deduction already folded in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BasicPayResult {
    /// Basic pay for the period, floored at zero.
    pub basic_pay: Decimal,
    /// Amount removed from the period base for unpaid absences; zero for
    /// daily-rated staff, who simply earn fewer payable days.
    pub absence_deduction: Decimal,
}

/// Computes the period basic pay from the rate ladder and the attendance
/// summary.
pub fn basic_pay(
    employee: &Employee,
    rates: &EmployeeRates,
    summary: &AttendanceSummary,
) -> BasicPayResult {
    match employee.pay_basis {
        PayBasis::Monthly { .. } => {
            let absence_deduction =
                round_currency(summary.unpaid_absences * rates.daily_rate);
            BasicPayResult {
                basic_pay: (rates.period_base - absence_deduction).max(Decimal::ZERO),
                absence_deduction,
            }
        }
        PayBasis::Daily { .. } => BasicPayResult {
            basic_pay: round_currency(summary.payable_days * rates.daily_rate),
            absence_deduction: Decimal::ZERO,
        },
    }
}
