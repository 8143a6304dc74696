//! Attendance aggregation over a cutoff window.
//!
//! This module folds raw per-day inputs (attendance rows, approved leave,
//! the holiday calendar, the employee's rest-day schedule) into one
//! [`AttendanceSummary`] per employee, classifying every calendar day of
//! the window exactly once. The fold is pure: recomputing it over the same
//! inputs yields the same summary.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::config::HolidayPolicy;
use crate::models::{
    AttendanceDay, Employee, Holiday, HolidayKind, LeaveRequest, PayslipEarning,
};
use crate::rounding::{days_in_window, round_currency, round_quantity};

/// Classification of one calendar day inside the cutoff window.
///
/// Precedence, highest first: holiday, approved leave, rest day, recorded
/// attendance, unpaid absence. A day is classified exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayClass {
    /// A company holiday; payable whether or not the employee clocked in.
    Holiday(HolidayKind),
    /// Covered by approved paid leave.
    PaidLeave,
    /// Covered by approved unpaid leave; not payable, but not an absence.
    UnpaidLeave,
    /// A scheduled rest day.
    RestDay,
    /// Attendance recorded for the full day.
    PresentFull,
    /// Attendance recorded with an explicit half-day marker.
    PresentHalf,
    /// A working day with no attendance, leave, or holiday covering it.
    UnpaidAbsence,
}

/// Whether an attendance remark carries an explicit half-day marker.
///
/// The marker convention is free text, so matching is deliberately loose:
/// any of `HALF_DAY`, `HALF DAY`, or `HALFDAY` anywhere in the remark,
/// case-insensitive.
pub fn is_half_day_remark(remarks: &str) -> bool {
    let upper = remarks.to_uppercase();
    upper.contains("HALF_DAY") || upper.contains("HALF DAY") || upper.contains("HALFDAY")
}

/// Classifies a single calendar day for one employee.
pub fn classify_day(
    date: NaiveDate,
    employee: &Employee,
    attendance: Option<&AttendanceDay>,
    leaves: &[LeaveRequest],
    holiday: Option<&Holiday>,
) -> DayClass {
    if let Some(holiday) = holiday {
        return DayClass::Holiday(holiday.kind);
    }
    if let Some(leave) = leaves.iter().find(|l| l.covers(date)) {
        return if leave.paid {
            DayClass::PaidLeave
        } else {
            DayClass::UnpaidLeave
        };
    }
    if employee.schedule.is_rest_day(date) {
        return DayClass::RestDay;
    }
    match attendance {
        Some(day) => {
            let half = day
                .remarks
                .as_deref()
                .map(is_half_day_remark)
                .unwrap_or(false);
            if half {
                DayClass::PresentHalf
            } else {
                DayClass::PresentFull
            }
        }
        None => DayClass::UnpaidAbsence,
    }
}

/// Per-employee attendance aggregate for one cutoff window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttendanceSummary {
    /// Scheduled working days in the window (non-rest days).
    pub working_days: Decimal,
    /// Days payable at the daily rate (present, paid leave, rest, holiday).
    pub payable_days: Decimal,
    /// Working days with nothing covering them.
    pub unpaid_absences: Decimal,
    /// Total minutes late across the window.
    pub tardiness_mins: Decimal,
    /// Total minutes of undertime across the window.
    pub undertime_mins: Decimal,
    /// Total hours actually worked.
    pub hours_worked: Decimal,
    /// Total hours inside the night-differential window.
    pub night_diff_hours: Decimal,
    /// Regular holidays the employee clocked in on.
    pub regular_holidays_worked: Decimal,
    /// Special non-working days the employee clocked in on.
    pub special_holidays_worked: Decimal,
}

/// Folds the window's raw inputs into an [`AttendanceSummary`].
///
/// Every calendar day from `cutoff_start` through `cutoff_end` is
/// classified once via [`classify_day`]. Payability by class:
///
/// - holiday: one payable day whether or not the employee clocked in
/// - paid leave: one payable day
/// - rest day: one payable day
/// - present: one payable day, half with a half-day marker
/// - unpaid leave: zero payable days, and not an absence
/// - anything else on a working day: one unpaid absence
///
/// Attendance-row metrics (tardiness, undertime, hours, night-diff hours)
/// accumulate whenever a row exists for the date, regardless of class.
pub fn summarize_attendance(
    employee: &Employee,
    cutoff_start: NaiveDate,
    cutoff_end: NaiveDate,
    attendance: &[AttendanceDay],
    leaves: &[LeaveRequest],
    holidays: &[Holiday],
) -> AttendanceSummary {
    let mut summary = AttendanceSummary::default();
    let half_day = Decimal::new(5, 1);

    for date in days_in_window(cutoff_start, cutoff_end) {
        let row = attendance.iter().find(|a| a.date == date);
        let holiday = holidays.iter().find(|h| h.date == date);

        if !employee.schedule.is_rest_day(date) {
            summary.working_days += Decimal::ONE;
        }

        if let Some(row) = row {
            summary.tardiness_mins += row.tardiness_mins;
            summary.undertime_mins += row.undertime_mins;
            summary.hours_worked += row.hours_worked;
            summary.night_diff_hours += row.night_diff_hours;
        }

        match classify_day(date, employee, row, leaves, holiday) {
            DayClass::Holiday(kind) => {
                summary.payable_days += Decimal::ONE;
                if row.is_some() {
                    match kind {
                        HolidayKind::Regular => summary.regular_holidays_worked += Decimal::ONE,
                        HolidayKind::SpecialNonWorking => {
                            summary.special_holidays_worked += Decimal::ONE
                        }
                    }
                }
            }
            DayClass::PaidLeave | DayClass::RestDay | DayClass::PresentFull => {
                summary.payable_days += Decimal::ONE;
            }
            DayClass::PresentHalf => {
                summary.payable_days += half_day;
            }
            DayClass::UnpaidLeave => {}
            DayClass::UnpaidAbsence => {
                summary.unpaid_absences += Decimal::ONE;
            }
        }
    }

    summary.payable_days = round_quantity(summary.payable_days);
    summary.hours_worked = round_quantity(summary.hours_worked);
    summary.night_diff_hours = round_quantity(summary.night_diff_hours);
    summary
}

/// Builds holiday premium earning lines from a summary.
///
/// The premium pays the excess over the already-payable holiday day:
/// `dailyRate x (multiplier - 1)` per holiday the employee clocked in on.
/// Holidays spent at home pay the plain daily rate only.
pub fn holiday_premium_earnings(
    summary: &AttendanceSummary,
    daily_rate: Decimal,
    policy: &HolidayPolicy,
) -> Vec<PayslipEarning> {
    let mut earnings = Vec::new();
    let cases = [
        (
            summary.regular_holidays_worked,
            policy.regular_multiplier,
            "REGULAR_HOLIDAY_PAY",
            "Regular Holiday Premium",
        ),
        (
            summary.special_holidays_worked,
            policy.special_multiplier,
            "SPECIAL_HOLIDAY_PAY",
            "Special Holiday Premium",
        ),
    ];

    for (days, multiplier, type_code, description) in cases {
        let premium_rate = multiplier - Decimal::ONE;
        if days <= Decimal::ZERO || premium_rate <= Decimal::ZERO {
            continue;
        }
        earnings.push(PayslipEarning {
            type_code: type_code.to_string(),
            description: description.to_string(),
            quantity: Some(round_quantity(days)),
            rate: Some(round_quantity(daily_rate * premium_rate)),
            amount: round_currency(days * daily_rate * premium_rate),
        });
    }

    earnings
}

/// Builds the night-differential earning line, when one is payable.
pub fn night_diff_earning(
    employee: &Employee,
    summary: &AttendanceSummary,
    hourly_rate: Decimal,
    night_diff_rate: Decimal,
) -> Option<PayslipEarning> {
    if !employee.night_diff_eligible
        || summary.night_diff_hours <= Decimal::ZERO
        || night_diff_rate <= Decimal::ZERO
    {
        return None;
    }
    Some(PayslipEarning {
        type_code: "NIGHT_DIFF".to_string(),
        description: "Night Differential".to_string(),
        quantity: Some(summary.night_diff_hours),
        rate: Some(round_quantity(hourly_rate * night_diff_rate)),
        amount: round_currency(summary.night_diff_hours * hourly_rate * night_diff_rate),
    })
}
