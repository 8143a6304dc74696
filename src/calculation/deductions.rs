//! Deduction assembly and loan allocation.
//!
//! Lines assemble in a fixed precedence: attendance penalties, statutory
//! contributions, withholding tax, recurring deductions, adjustments, and
//! finally loans. Loans are capacity-gated: an amortization applies only
//! when it fits in the net pay remaining after everything ahead of it, so
//! net pay can never be driven below zero by a loan.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::calculation::statutory::{ContributionShares, StatutoryResult};
use crate::config::{AttendanceDeductionBasis, AttendancePolicy};
use crate::models::{DeductionSource, Loan, LoanStatus, PayslipDeduction};
use crate::rounding::{MINUTES_PER_HOUR, round_currency};

/// An amortization the allocator decided to apply. The store turns these
/// into payment records when the calculation commits.
#[derive(Debug, Clone, PartialEq)]
pub struct LoanApplication {
    /// The loan being paid down.
    pub loan_id: Uuid,
    /// The amortization being settled.
    pub amortization_id: Uuid,
    /// The borrowing employee.
    pub employee_id: String,
    /// Amount applied.
    pub amount: Decimal,
}

/// The assembled deduction side of one payslip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllocationResult {
    /// Deduction lines in assembly order.
    pub deductions: Vec<PayslipDeduction>,
    /// Sum of all deduction line amounts.
    pub total_deductions: Decimal,
    /// `max(0, gross - totalDeductions)`, rounded to currency.
    pub net_pay: Decimal,
    /// Loan amortizations the allocator applied.
    pub loan_applications: Vec<LoanApplication>,
}

/// Everything the allocator needs for one employee and period.
#[derive(Debug)]
pub struct DeductionInputs<'a> {
    /// Gross pay the deductions draw against.
    pub gross_pay: Decimal,
    /// Hourly rate used for per-minute attendance penalties.
    pub hourly_rate: Decimal,
    /// Minutes of tardiness accumulated over the window.
    pub tardiness_mins: Decimal,
    /// Minutes of undertime accumulated over the window.
    pub undertime_mins: Decimal,
    /// Company attendance penalty policy.
    pub attendance_policy: &'a AttendancePolicy,
    /// Statutory contribution shares already computed.
    pub statutory: &'a StatutoryResult,
    /// Withholding tax already computed.
    pub tax_withheld: Decimal,
    /// Recurring deduction lines due this period.
    pub recurring: Vec<PayslipDeduction>,
    /// Manual adjustment deduction lines for this run.
    pub adjustments: Vec<PayslipDeduction>,
    /// The employee's loans.
    pub loans: &'a [Loan],
    /// Amortizations due on or before this date are candidates.
    pub cutoff_end: NaiveDate,
}

fn statutory_line(
    type_code: &str,
    description: &str,
    shares: &ContributionShares,
) -> Option<PayslipDeduction> {
    if shares.is_zero() {
        return None;
    }
    Some(PayslipDeduction {
        type_code: type_code.to_string(),
        description: description.to_string(),
        amount: shares.employee,
        employer_share: Some(shares.employer),
        source: DeductionSource::Government,
        reference_id: None,
        pre_tax: true,
    })
}

fn penalty_line(type_code: &str, description: &str, amount: Decimal) -> Option<PayslipDeduction> {
    if amount <= Decimal::ZERO {
        return None;
    }
    Some(PayslipDeduction {
        type_code: type_code.to_string(),
        description: description.to_string(),
        amount,
        employer_share: None,
        source: DeductionSource::Attendance,
        reference_id: None,
        pre_tax: false,
    })
}

/// Assembles the deduction lines for one employee in precedence order and
/// allocates loan amortizations into whatever net pay remains.
pub fn allocate_deductions(inputs: DeductionInputs<'_>) -> AllocationResult {
    let mut deductions = Vec::new();

    if inputs.attendance_policy.deduction_basis == AttendanceDeductionBasis::PerMinute {
        let per_minute = inputs.hourly_rate / MINUTES_PER_HOUR;
        deductions.extend(penalty_line(
            "TARDINESS",
            "Tardiness",
            round_currency(inputs.tardiness_mins * per_minute),
        ));
        deductions.extend(penalty_line(
            "UNDERTIME",
            "Undertime",
            round_currency(inputs.undertime_mins * per_minute),
        ));
    }

    deductions.extend(statutory_line(
        "SSS",
        "SSS Contribution",
        &inputs.statutory.sss,
    ));
    deductions.extend(statutory_line(
        "PHILHEALTH",
        "PhilHealth Contribution",
        &inputs.statutory.philhealth,
    ));
    deductions.extend(statutory_line(
        "PAGIBIG",
        "Pag-IBIG Contribution",
        &inputs.statutory.pagibig,
    ));

    if inputs.tax_withheld > Decimal::ZERO {
        deductions.push(PayslipDeduction {
            type_code: "WITHHOLDING_TAX".to_string(),
            description: "Withholding Tax".to_string(),
            amount: inputs.tax_withheld,
            employer_share: None,
            source: DeductionSource::Tax,
            reference_id: None,
            pre_tax: false,
        });
    }

    deductions.extend(inputs.recurring);
    deductions.extend(inputs.adjustments);

    let mut total: Decimal = deductions.iter().map(|d| d.amount).sum();
    let mut loan_applications = Vec::new();

    let mut candidates: Vec<(&Loan, NaiveDate)> = inputs
        .loans
        .iter()
        .filter(|loan| loan.status == LoanStatus::Active)
        .filter_map(|loan| loan.next_due(inputs.cutoff_end).map(|a| (loan, a.due_date)))
        .collect();
    candidates.sort_by_key(|(loan, due)| (loan.deduction_priority, *due));

    for (loan, _) in candidates {
        let Some(amortization) = loan.next_due(inputs.cutoff_end) else {
            continue;
        };
        let amount = round_currency(amortization.amount);
        let remaining = inputs.gross_pay - total;
        if amount > remaining {
            // Deferred: the amortization stays unpaid and surfaces again
            // next period.
            continue;
        }
        deductions.push(PayslipDeduction {
            type_code: "LOAN".to_string(),
            description: loan.description.clone(),
            amount,
            employer_share: None,
            source: DeductionSource::Loan,
            reference_id: Some(loan.id.to_string()),
            pre_tax: false,
        });
        loan_applications.push(LoanApplication {
            loan_id: loan.id,
            amortization_id: amortization.id,
            employee_id: loan.employee_id.clone(),
            amount,
        });
        total += amount;
    }

    AllocationResult {
        net_pay: round_currency(inputs.gross_pay - total).max(Decimal::ZERO),
        deductions,
        total_deductions: total,
        loan_applications,
    }
}
