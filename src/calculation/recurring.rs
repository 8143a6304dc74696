//! Recurring earning and deduction lines.
//!
//! Recurring lines are configured on the employee and land by frequency:
//! per-period lines on every cutoff, monthly lines once a month (the
//! second half of semi-monthly patterns). Earnings may additionally be
//! prorated for partial attendance; deductions never are.

use rust_decimal::Decimal;

use crate::calculation::attendance::AttendanceSummary;
use crate::calculation::timing::recurring_due;
use crate::models::{
    DeductionSource, Employee, PayFrequency, PayslipDeduction, PayslipEarning, PeriodHalf,
    ProrationPolicy,
};
use crate::rounding::{DEFAULT_HOURS_PER_DAY, round_currency};

fn proration_factor(
    policy: ProrationPolicy,
    employee: &Employee,
    summary: &AttendanceSummary,
) -> Decimal {
    let factor = match policy {
        ProrationPolicy::None => Decimal::ONE,
        ProrationPolicy::DayRatio => {
            if summary.working_days > Decimal::ZERO {
                summary.payable_days / summary.working_days
            } else {
                Decimal::ONE
            }
        }
        ProrationPolicy::HourRatio => {
            let hours_per_day = employee
                .schedule
                .hours_per_day
                .filter(|h| *h > Decimal::ZERO)
                .unwrap_or(DEFAULT_HOURS_PER_DAY);
            let scheduled = summary.working_days * hours_per_day;
            if scheduled > Decimal::ZERO {
                summary.hours_worked / scheduled
            } else {
                Decimal::ONE
            }
        }
    };
    // Rest-day-payable windows can push the day ratio past one; a prorated
    // line never pays more than its configured amount.
    factor.min(Decimal::ONE)
}

/// Builds the recurring earning lines due this period.
pub fn recurring_earnings(
    employee: &Employee,
    frequency: PayFrequency,
    half: PeriodHalf,
    summary: &AttendanceSummary,
) -> Vec<PayslipEarning> {
    employee
        .recurring_earnings
        .iter()
        .filter(|line| recurring_due(line.frequency, frequency, half))
        .map(|line| {
            let factor = proration_factor(line.proration, employee, summary);
            PayslipEarning {
                type_code: line.code.clone(),
                description: line.description.clone(),
                quantity: None,
                rate: None,
                amount: round_currency(line.amount * factor),
            }
        })
        .collect()
}

/// Builds the recurring deduction lines due this period.
pub fn recurring_deduction_lines(
    employee: &Employee,
    frequency: PayFrequency,
    half: PeriodHalf,
) -> Vec<PayslipDeduction> {
    employee
        .recurring_deductions
        .iter()
        .filter(|line| recurring_due(line.frequency, frequency, half))
        .map(|line| PayslipDeduction {
            type_code: line.code.clone(),
            description: line.description.clone(),
            amount: round_currency(line.amount),
            employer_share: None,
            source: DeductionSource::Recurring,
            reference_id: None,
            pre_tax: line.pre_tax,
        })
        .collect()
}
