//! Core data models for the Payroll Run Calculation Engine.
//!
//! This module contains all the domain models used throughout the engine.

mod attendance;
mod employee;
mod loan;
mod pay_period;
mod payslip;
mod run;

pub use attendance::{
    ApprovalStatus, AttendanceDay, LeaveRequest, OvertimeKind, OvertimeRequest,
};
pub use employee::{
    Employee, PayBasis, ProrationPolicy, RecurringDeduction, RecurringEarning,
    RecurringFrequency, WorkSchedule,
};
pub use loan::{Loan, LoanAmortization, LoanPayment, LoanStatus};
pub use pay_period::{
    ContributionSchedule, ContributionTiming, Holiday, HolidayKind, PayFrequency, PayPeriod,
    PayPeriodPattern, PeriodHalf, PeriodStatus,
};
pub use payslip::{
    DeductionSource, Payslip, PayslipDeduction, PayslipEarning, YtdSnapshot, slip_number,
};
pub use run::{
    AdjustmentEntry, PayrollRun, ProcessStep, RunScope, RunStatus, RunTotals, RunType, Step,
    StepStatus,
};
