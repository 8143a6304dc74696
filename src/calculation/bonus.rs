//! Bonus-run earnings: thirteenth-month pay and the mid-year bonus.
//!
//! Bonus runs are anchored to a period for scheduling but compute over the
//! calendar year. They carry none of the attendance-derived earnings or
//! penalties of a regular run.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::{Employee, PayslipEarning, RunType};
use crate::rounding::{ANNUAL_DAY_DIVISOR, calendar_days_between, round_currency};

/// Thirteenth-month pay for one employee, or `None` when the employment
/// type does not accrue the benefit.
///
/// The primary basis is one twelfth of the regular basic pay actually paid
/// this year. With no paid regular basic yet (new hires, first run of the
/// year), the accrual falls back to the monthly base prorated by calendar
/// days employed within the year.
pub fn thirteenth_month(
    employee: &Employee,
    ytd_regular_basic: Decimal,
    year: i32,
) -> Option<Decimal> {
    if !employee.has_thirteenth_month {
        return None;
    }
    if ytd_regular_basic > Decimal::ZERO {
        return Some(round_currency(ytd_regular_basic / Decimal::from(12)));
    }

    let year_start = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let year_end = NaiveDate::from_ymd_opt(year, 12, 31)?;
    let from = employee.hire_date.max(year_start);
    let to = employee
        .separation_date
        .map(|d| d.min(year_end))
        .unwrap_or(year_end);
    let days_employed = Decimal::from(calendar_days_between(from, to));

    Some(round_currency(
        employee.pay_basis.monthly_equivalent() * days_employed / ANNUAL_DAY_DIVISOR,
    ))
}

/// Mid-year bonus: half of the monthly base, ungated.
pub fn mid_year_bonus(employee: &Employee) -> Decimal {
    round_currency(employee.pay_basis.monthly_equivalent() / Decimal::from(2))
}

/// Builds the single earning line of a bonus run, or `None` when the
/// employee is skipped (regular runs, or a gated thirteenth month).
pub fn bonus_earning(
    run_type: RunType,
    employee: &Employee,
    ytd_regular_basic: Decimal,
    year: i32,
) -> Option<PayslipEarning> {
    match run_type {
        RunType::Regular => None,
        RunType::ThirteenthMonth => {
            thirteenth_month(employee, ytd_regular_basic, year).map(|amount| PayslipEarning {
                type_code: "THIRTEENTH_MONTH".to_string(),
                description: "13th Month Pay".to_string(),
                quantity: None,
                rate: None,
                amount,
            })
        }
        RunType::MidYearBonus => Some(PayslipEarning {
            type_code: "MID_YEAR_BONUS".to_string(),
            description: "Mid-Year Bonus".to_string(),
            quantity: None,
            rate: None,
            amount: mid_year_bonus(employee),
        }),
    }
}
