//! Overtime classification and earning lines.
//!
//! Approved overtime is classified by the day it was rendered on. A rest
//! day that is also a holiday outranks the holiday alone, which outranks
//! the rest day alone; the holiday's kind picks between the regular and
//! special holiday classes.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::config::OvertimePolicy;
use crate::models::{
    ApprovalStatus, Employee, Holiday, HolidayKind, OvertimeKind, OvertimeRequest, PayslipEarning,
};
use crate::rounding::{round_currency, round_quantity};

/// Classifies overtime rendered on a day with the given traits.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::classify_overtime;
/// use payroll_engine::models::{HolidayKind, OvertimeKind};
///
/// assert_eq!(classify_overtime(false, None), OvertimeKind::Regular);
/// assert_eq!(
///     classify_overtime(true, Some(HolidayKind::Regular)),
///     OvertimeKind::RestDayHoliday,
/// );
/// ```
pub fn classify_overtime(is_rest_day: bool, holiday: Option<HolidayKind>) -> OvertimeKind {
    match (is_rest_day, holiday) {
        (true, Some(_)) => OvertimeKind::RestDayHoliday,
        (false, Some(HolidayKind::Regular)) => OvertimeKind::RegularHoliday,
        (false, Some(HolidayKind::SpecialNonWorking)) => OvertimeKind::SpecialHoliday,
        (true, None) => OvertimeKind::RestDay,
        (false, None) => OvertimeKind::Regular,
    }
}

/// Builds overtime earning lines for one employee over the window.
///
/// Only approved requests dated inside the window count, and only for
/// overtime-eligible employees. Hours are pooled per overtime class, one
/// line per class that received hours, in classification order.
pub fn overtime_earnings(
    employee: &Employee,
    cutoff_start: NaiveDate,
    cutoff_end: NaiveDate,
    requests: &[OvertimeRequest],
    holidays: &[Holiday],
    hourly_rate: Decimal,
    policy: &OvertimePolicy,
) -> Vec<PayslipEarning> {
    if !employee.overtime_eligible {
        return Vec::new();
    }

    let order = [
        OvertimeKind::Regular,
        OvertimeKind::RestDay,
        OvertimeKind::RegularHoliday,
        OvertimeKind::SpecialHoliday,
        OvertimeKind::RestDayHoliday,
    ];
    let mut pooled = [Decimal::ZERO; 5];

    for request in requests {
        if request.status != ApprovalStatus::Approved
            || request.date < cutoff_start
            || request.date > cutoff_end
            || request.hours <= Decimal::ZERO
        {
            continue;
        }
        let holiday = holidays
            .iter()
            .find(|h| h.date == request.date)
            .map(|h| h.kind);
        let kind = classify_overtime(employee.schedule.is_rest_day(request.date), holiday);
        let slot = order
            .iter()
            .position(|k| *k == kind)
            .unwrap_or_default();
        pooled[slot] += request.hours;
    }

    order
        .iter()
        .zip(pooled)
        .filter(|(_, hours)| *hours > Decimal::ZERO)
        .map(|(kind, hours)| {
            let multiplier = policy.multiplier_for(*kind);
            PayslipEarning {
                type_code: kind.type_code().to_string(),
                description: kind.description().to_string(),
                quantity: Some(round_quantity(hours)),
                rate: Some(round_quantity(hourly_rate * multiplier)),
                amount: round_currency(hours * hourly_rate * multiplier),
            }
        })
        .collect()
}
