//! Employee loans, their amortization schedules, and payment records.
//!
//! A loan is deducted through payroll one amortization at a time. Each
//! amortization is applied by at most one run; applying it produces a
//! [`LoanPayment`] and decrements the parent loan's running balances.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of a loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    /// Still being repaid.
    Active,
    /// Balance reached zero; no further deductions.
    FullyPaid,
}

/// One due-date-ordered installment of a loan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanAmortization {
    /// Unique identifier for the installment.
    pub id: Uuid,
    /// The date the installment falls due.
    pub due_date: NaiveDate,
    /// Total amount of the installment.
    pub amount: Decimal,
    /// Portion of the amount applied against principal.
    pub principal_portion: Decimal,
    /// Portion of the amount applied against interest.
    pub interest_portion: Decimal,
    /// Set exactly once, by exactly one payroll run.
    #[serde(default)]
    pub paid: bool,
    /// The run that applied this installment.
    #[serde(default)]
    pub paid_by_run: Option<Uuid>,
    /// The payment record the application produced.
    #[serde(default)]
    pub payment_id: Option<Uuid>,
}

/// An employee loan deducted through payroll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    /// Unique identifier for the loan.
    pub id: Uuid,
    /// The borrowing employee.
    pub employee_id: String,
    /// Display description (e.g., "SSS Salary Loan").
    pub description: String,
    /// Outstanding principal.
    pub principal_balance: Decimal,
    /// Outstanding interest.
    pub interest_balance: Decimal,
    /// Outstanding total (principal plus interest).
    pub total_balance: Decimal,
    /// Lower numbers deduct first when several loans compete for net pay.
    pub deduction_priority: i32,
    /// Lifecycle state.
    pub status: LoanStatus,
    /// Installment schedule.
    pub amortizations: Vec<LoanAmortization>,
}

impl Loan {
    /// The earliest unpaid amortization due on or before `cutoff_end`.
    pub fn next_due(&self, cutoff_end: NaiveDate) -> Option<&LoanAmortization> {
        self.amortizations
            .iter()
            .filter(|a| !a.paid && a.due_date <= cutoff_end)
            .min_by_key(|a| a.due_date)
    }
}

/// Payment record produced when a run applies an amortization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanPayment {
    /// Unique identifier for the payment.
    pub id: Uuid,
    /// The loan the payment belongs to.
    pub loan_id: Uuid,
    /// The amortization the payment settled.
    pub amortization_id: Uuid,
    /// The run that produced the payment.
    pub run_id: Uuid,
    /// The borrowing employee.
    pub employee_id: String,
    /// Amount paid.
    pub amount: Decimal,
    /// When the payment was recorded.
    pub paid_at: DateTime<Utc>,
}
