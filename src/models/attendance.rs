//! Attendance, leave, and overtime input records.
//!
//! These are the raw per-day inputs the attendance aggregator folds into a
//! single per-employee snapshot for the cutoff window.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Review state for leave and overtime requests. Only approved requests
/// take part in payroll computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    /// Awaiting review.
    Pending,
    /// Approved; counted by the aggregator.
    Approved,
    /// Rejected; ignored by the aggregator.
    Rejected,
}

/// One recorded attendance day for an employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceDay {
    /// The employee the record belongs to.
    pub employee_id: String,
    /// The date worked.
    pub date: NaiveDate,
    /// Minutes late, if any.
    #[serde(default)]
    pub tardiness_mins: Decimal,
    /// Minutes short of the scheduled end, if any.
    #[serde(default)]
    pub undertime_mins: Decimal,
    /// Hours actually worked.
    pub hours_worked: Decimal,
    /// Hours worked inside the night-differential window.
    #[serde(default)]
    pub night_diff_hours: Decimal,
    /// Free-text remarks; an explicit half-day marker here halves the day.
    #[serde(default)]
    pub remarks: Option<String>,
}

/// An employee leave interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveRequest {
    /// The employee on leave.
    pub employee_id: String,
    /// First day of leave (inclusive).
    pub start_date: NaiveDate,
    /// Last day of leave (inclusive).
    pub end_date: NaiveDate,
    /// Paid leave counts as a payable day; unpaid leave does not.
    pub paid: bool,
    /// Review state; only approved leave is honored.
    pub status: ApprovalStatus,
}

impl LeaveRequest {
    /// Whether this request is approved and covers `date`.
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.status == ApprovalStatus::Approved
            && self.start_date <= date
            && date <= self.end_date
    }
}

/// Approved overtime hours for one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OvertimeRequest {
    /// The employee the overtime belongs to.
    pub employee_id: String,
    /// The date the overtime was rendered.
    pub date: NaiveDate,
    /// Overtime hours requested.
    pub hours: Decimal,
    /// Review state; only approved overtime is paid.
    pub status: ApprovalStatus,
}

/// Classification of a day's overtime, in rest-day/holiday precedence.
///
/// Rest day plus holiday beats holiday alone, which beats rest day alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OvertimeKind {
    /// Overtime on an ordinary working day.
    Regular,
    /// Overtime on a scheduled rest day.
    RestDay,
    /// Overtime on a regular holiday.
    RegularHoliday,
    /// Overtime on a special non-working day.
    SpecialHoliday,
    /// Overtime on a rest day that is also a holiday.
    RestDayHoliday,
}

impl OvertimeKind {
    /// The earning type code recorded on the payslip line.
    pub fn type_code(&self) -> &'static str {
        match self {
            OvertimeKind::Regular => "OT_REGULAR",
            OvertimeKind::RestDay => "OT_REST_DAY",
            OvertimeKind::RegularHoliday => "OT_REGULAR_HOLIDAY",
            OvertimeKind::SpecialHoliday => "OT_SPECIAL_HOLIDAY",
            OvertimeKind::RestDayHoliday => "OT_REST_DAY_HOLIDAY",
        }
    }

    /// Human-readable description for the payslip line.
    pub fn description(&self) -> &'static str {
        match self {
            OvertimeKind::Regular => "Overtime",
            OvertimeKind::RestDay => "Rest Day Overtime",
            OvertimeKind::RegularHoliday => "Regular Holiday Overtime",
            OvertimeKind::SpecialHoliday => "Special Holiday Overtime",
            OvertimeKind::RestDayHoliday => "Rest Day Holiday Overtime",
        }
    }
}
