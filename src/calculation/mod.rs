//! Calculation logic for the Payroll Run Calculation Engine.
//!
//! This module contains the pure calculation functions for computing one
//! employee's payslip: contribution and recurring-line timing resolution,
//! attendance aggregation over the cutoff window, overtime classification
//! and pricing, derived rates and period basic pay, bonus-run earnings,
//! recurring earning and deduction lines, statutory contribution lookup,
//! withholding tax, and deduction assembly with loan allocation. Every
//! function here is deterministic over its inputs; orchestration and
//! persistence live in the engine.

mod attendance;
mod basic_pay;
mod bonus;
mod deductions;
mod overtime;
mod recurring;
mod statutory;
mod tax;
mod timing;

pub use attendance::{
    AttendanceSummary, DayClass, classify_day, holiday_premium_earnings, is_half_day_remark,
    night_diff_earning, summarize_attendance,
};
pub use basic_pay::{BasicPayResult, EmployeeRates, basic_pay, employee_rates};
pub use bonus::{bonus_earning, mid_year_bonus, thirteenth_month};
pub use deductions::{
    AllocationResult, DeductionInputs, LoanApplication, allocate_deductions,
};
pub use overtime::{classify_overtime, overtime_earnings};
pub use recurring::{recurring_deduction_lines, recurring_earnings};
pub use statutory::{
    ContributionShares, StatutoryDiagnostics, StatutoryResult, statutory_contributions,
};
pub use tax::{TaxBasis, bracket_tax, withholding_tax};
pub use timing::{recurring_due, timing_applies};
