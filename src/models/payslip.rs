//! Payslips and their earning/deduction line items.
//!
//! A payslip is the full computed snapshot for one `(run, employee)` pair.
//! The calculate step deletes and regenerates a run's payslips wholesale,
//! so the stored output is always a pure function of current inputs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Source category of a deduction line, in reporting precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeductionSource {
    /// Tardiness/undertime penalties.
    Attendance,
    /// Statutory contributions (SSS, PhilHealth, Pag-IBIG).
    Government,
    /// Withholding tax.
    Tax,
    /// Recurring deductions configured on the employee.
    Recurring,
    /// Manual review adjustments.
    Adjustment,
    /// Loan amortizations.
    Loan,
}

/// An earning line on a payslip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayslipEarning {
    /// Earning type code, registered per company on first use.
    pub type_code: String,
    /// Display description.
    pub description: String,
    /// Day/hour quantity behind the amount, when one exists.
    #[serde(default)]
    pub quantity: Option<Decimal>,
    /// Per-unit rate behind the amount, when one exists.
    #[serde(default)]
    pub rate: Option<Decimal>,
    /// Line amount.
    pub amount: Decimal,
}

/// A deduction line on a payslip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayslipDeduction {
    /// Deduction type code, registered per company on first use.
    pub type_code: String,
    /// Display description.
    pub description: String,
    /// Employee-side amount.
    pub amount: Decimal,
    /// Employer counterpart share, for statutory lines.
    #[serde(default)]
    pub employer_share: Option<Decimal>,
    /// Where the line came from.
    pub source: DeductionSource,
    /// Back-reference to the source record (e.g., a loan id).
    #[serde(default)]
    pub reference_id: Option<String>,
    /// Whether the line reduced the taxable base.
    #[serde(default)]
    pub pre_tax: bool,
}

/// Year-to-date rollups snapshotted onto a payslip.
///
/// Figures include the payslip they are stored on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YtdSnapshot {
    /// Gross pay across paid runs this year.
    pub gross_pay: Decimal,
    /// Basic pay from regular runs, the thirteenth-month basis.
    pub regular_basic_pay: Decimal,
    /// Bonus-run pay, subject to the statutory exclusion ceiling.
    pub bonus_pay: Decimal,
    /// Withholding tax already withheld.
    pub tax_withheld: Decimal,
    /// SSS employee shares.
    pub sss_employee: Decimal,
    /// PhilHealth employee shares.
    pub philhealth_employee: Decimal,
    /// Pag-IBIG employee shares.
    pub pagibig_employee: Decimal,
    /// Pre-tax recurring deductions.
    pub pre_tax_deductions: Decimal,
}

impl YtdSnapshot {
    /// Sum of the mandatory employee contribution shares.
    pub fn mandatory_employee_total(&self) -> Decimal {
        self.sss_employee + self.philhealth_employee + self.pagibig_employee
    }
}

/// The finalized computed output of a run for one employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payslip {
    /// Unique identifier; regenerated on every calculation pass.
    pub id: Uuid,
    /// Payslip number, `PSL-<runSuffix>-<employeeIdPrefix>`.
    pub slip_number: String,
    /// The owning run.
    pub run_id: Uuid,
    /// The employee the slip belongs to.
    pub employee_id: String,
    /// Derived daily rate.
    pub daily_rate: Decimal,
    /// Derived hourly rate.
    pub hourly_rate: Decimal,
    /// Working days in the cutoff window (non-rest days).
    pub working_days: Decimal,
    /// Payable days, in half-day increments.
    pub payable_days: Decimal,
    /// Unpaid absence days.
    pub unpaid_absences: Decimal,
    /// Tardiness minutes accumulated over the window.
    pub tardiness_mins: Decimal,
    /// Undertime minutes accumulated over the window.
    pub undertime_mins: Decimal,
    /// Hours actually worked.
    pub hours_worked: Decimal,
    /// Approved overtime hours paid.
    pub overtime_hours: Decimal,
    /// Night-differential hours paid.
    pub night_diff_hours: Decimal,
    /// Basic pay for the period.
    pub basic_pay: Decimal,
    /// Gross pay: the sum of all earning lines.
    pub gross_pay: Decimal,
    /// Sum of all deduction lines.
    pub total_deductions: Decimal,
    /// Gross less deductions, floored at zero.
    pub net_pay: Decimal,
    /// SSS employee share withheld this period.
    pub sss_employee: Decimal,
    /// PhilHealth employee share withheld this period.
    pub philhealth_employee: Decimal,
    /// Pag-IBIG employee share withheld this period.
    pub pagibig_employee: Decimal,
    /// Withholding tax for this period.
    pub tax_withheld: Decimal,
    /// SSS employer share.
    pub sss_employer: Decimal,
    /// PhilHealth employer share.
    pub philhealth_employer: Decimal,
    /// Pag-IBIG employer share.
    pub pagibig_employer: Decimal,
    /// Year-to-date rollups including this slip.
    pub ytd: YtdSnapshot,
    /// Ordered earning lines.
    pub earnings: Vec<PayslipEarning>,
    /// Ordered deduction lines.
    pub deductions: Vec<PayslipDeduction>,
}

impl Payslip {
    /// Sum of the employer statutory shares on this slip.
    pub fn employer_share_total(&self) -> Decimal {
        self.sss_employer + self.philhealth_employer + self.pagibig_employer
    }
}

/// Builds a payslip number from the run number and employee id.
///
/// The run suffix is the run number's sequence part; the employee prefix is
/// the first eight characters of the employee id.
///
/// # Example
///
/// ```
/// use payroll_engine::models::slip_number;
///
/// assert_eq!(
///     slip_number("RUN-2025-00004", "EMP-2025-00017"),
///     "PSL-00004-EMP-2025"
/// );
/// ```
pub fn slip_number(run_number: &str, employee_id: &str) -> String {
    let suffix = run_number.rsplit('-').next().unwrap_or(run_number);
    let prefix: String = employee_id.chars().take(8).collect();
    format!("PSL-{suffix}-{prefix}")
}
