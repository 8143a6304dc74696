//! Payroll runs, their six pipeline steps, scope filters, and totals.
//!
//! A run and its six process steps move in lockstep: every transition
//! updates both the run status and the owning step slot atomically, so the
//! pair can never drift apart.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::employee::Employee;

/// The kind of payroll run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunType {
    /// Ordinary per-period run.
    Regular,
    /// Thirteenth-month bonus run, anchored to a calendar year.
    ThirteenthMonth,
    /// Mid-year bonus run.
    MidYearBonus,
}

impl RunType {
    /// Whether the run is a bonus variant rather than a regular period run.
    pub fn is_bonus(&self) -> bool {
        !matches!(self, RunType::Regular)
    }
}

/// Pipeline status of a payroll run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Created; awaiting validation.
    Draft,
    /// Validation passed; awaiting calculation.
    Validating,
    /// Calculation in flight.
    Processing,
    /// Calculation finished; awaiting review.
    Computed,
    /// Review complete; awaiting payslip generation.
    ForReview,
    /// Payslips generated; awaiting close.
    ForPayment,
    /// Closed. The only terminal status.
    Paid,
}

impl RunStatus {
    /// The lowercase wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Draft => "draft",
            RunStatus::Validating => "validating",
            RunStatus::Processing => "processing",
            RunStatus::Computed => "computed",
            RunStatus::ForReview => "for_review",
            RunStatus::ForPayment => "for_payment",
            RunStatus::Paid => "paid",
        }
    }

    /// Whether the run has reached its terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Paid)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a single pipeline step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Not reached yet.
    Pending,
    /// Currently executing.
    InProgress,
    /// Finished successfully.
    Completed,
    /// Finished with errors; diagnostic notes attached.
    Failed,
}

/// Identifies one of the six pipeline steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Step 1: run creation.
    Create,
    /// Step 2: data completeness validation.
    Validate,
    /// Step 3: payslip calculation.
    Calculate,
    /// Step 4: review and manual adjustment.
    Review,
    /// Step 5: payslip generation (output freeze).
    GeneratePayslips,
    /// Step 6: close and period lock.
    Close,
}

impl Step {
    /// All six steps in pipeline order.
    pub const ALL: [Step; 6] = [
        Step::Create,
        Step::Validate,
        Step::Calculate,
        Step::Review,
        Step::GeneratePayslips,
        Step::Close,
    ];

    /// The step's 1-based number.
    pub fn number(self) -> u8 {
        match self {
            Step::Create => 1,
            Step::Validate => 2,
            Step::Calculate => 3,
            Step::Review => 4,
            Step::GeneratePayslips => 5,
            Step::Close => 6,
        }
    }

    /// Display name recorded on the step row.
    pub fn name(self) -> &'static str {
        match self {
            Step::Create => "Create",
            Step::Validate => "Validate",
            Step::Calculate => "Calculate",
            Step::Review => "Review",
            Step::GeneratePayslips => "Generate Payslips",
            Step::Close => "Close",
        }
    }

    fn index(self) -> usize {
        (self.number() - 1) as usize
    }
}

/// One of the six pipeline steps tracked on a run.
///
/// Steps are created once with the run and only ever updated, never
/// re-created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessStep {
    /// 1-based step number.
    pub number: u8,
    /// Display name.
    pub name: String,
    /// Current status.
    pub status: StepStatus,
    /// When the step completed or failed.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    /// Free-form diagnostic notes (validation errors, calculation trace).
    #[serde(default)]
    pub notes: Option<String>,
}

impl ProcessStep {
    fn pending(step: Step) -> Self {
        Self {
            number: step.number(),
            name: step.name().to_string(),
            status: StepStatus::Pending,
            completed_at: None,
            notes: None,
        }
    }

    /// Marks the step completed at `at`, keeping any notes already set.
    pub fn complete(&mut self, at: DateTime<Utc>) {
        self.status = StepStatus::Completed;
        self.completed_at = Some(at);
    }

    /// Marks the step failed at `at` with diagnostic notes.
    pub fn fail(&mut self, at: DateTime<Utc>, notes: String) {
        self.status = StepStatus::Failed;
        self.completed_at = Some(at);
        self.notes = Some(notes);
    }

    /// Resets the step to pending, clearing its timestamp and notes.
    pub fn reset(&mut self) {
        self.status = StepStatus::Pending;
        self.completed_at = None;
        self.notes = None;
    }
}

/// Optional employee filters applied when a run is created.
///
/// Empty filter sets match every active employee of the company.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunScope {
    /// Restrict to these departments when non-empty.
    #[serde(default)]
    pub department_ids: Vec<String>,
    /// Restrict to these branches when non-empty.
    #[serde(default)]
    pub branch_ids: Vec<String>,
    /// Restrict to these employees when non-empty.
    #[serde(default)]
    pub employee_ids: Vec<String>,
}

impl RunScope {
    /// Whether an employee falls inside this scope.
    pub fn matches(&self, employee: &Employee) -> bool {
        if !self.employee_ids.is_empty() && !self.employee_ids.contains(&employee.id) {
            return false;
        }
        if !self.department_ids.is_empty() {
            match &employee.department_id {
                Some(dept) if self.department_ids.contains(dept) => {}
                _ => return false,
            }
        }
        if !self.branch_ids.is_empty() {
            match &employee.branch_id {
                Some(branch) if self.branch_ids.contains(branch) => {}
                _ => return false,
            }
        }
        true
    }
}

/// Run-level aggregates accumulated across a run's payslips.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunTotals {
    /// Sum of payslip gross pay.
    pub gross_pay: Decimal,
    /// Sum of payslip deductions.
    pub total_deductions: Decimal,
    /// Sum of payslip net pay.
    pub net_pay: Decimal,
    /// Sum of employer statutory shares.
    pub employer_share: Decimal,
    /// Gross pay plus employer statutory shares.
    pub employer_cost: Decimal,
}

/// One execution of the payroll pipeline against a pay period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollRun {
    /// Unique identifier.
    pub id: Uuid,
    /// Generated run number, `RUN-<year>-<5-digit-seq>`.
    pub run_number: String,
    /// The owning company.
    pub company_id: String,
    /// The pay period the run is anchored to.
    pub period_id: String,
    /// Regular or bonus variant.
    pub run_type: RunType,
    /// Pipeline status.
    pub status: RunStatus,
    /// 1-based number of the step the pipeline is positioned at.
    pub current_step: u8,
    /// The six step slots, created with the run.
    pub steps: [ProcessStep; 6],
    /// Employee filters.
    pub scope: RunScope,
    /// Aggregates across the run's payslips.
    pub totals: RunTotals,
    /// Calendar year, which bonus runs compute over.
    pub year: i32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl PayrollRun {
    /// Creates a run in DRAFT with step 1 completed and the pipeline
    /// positioned at step 2.
    pub fn new(
        id: Uuid,
        run_number: String,
        company_id: String,
        period_id: String,
        run_type: RunType,
        scope: RunScope,
        year: i32,
        created_at: DateTime<Utc>,
    ) -> Self {
        let mut steps = Step::ALL.map(ProcessStep::pending);
        steps[Step::Create.index()].complete(created_at);
        Self {
            id,
            run_number,
            company_id,
            period_id,
            run_type,
            status: RunStatus::Draft,
            current_step: Step::Validate.number(),
            steps,
            scope,
            totals: RunTotals::default(),
            year,
            created_at,
        }
    }

    /// Borrow the slot for `step`.
    pub fn step(&self, step: Step) -> &ProcessStep {
        &self.steps[step.index()]
    }

    /// Mutably borrow the slot for `step`.
    pub fn step_mut(&mut self, step: Step) -> &mut ProcessStep {
        &mut self.steps[step.index()]
    }

    /// The sequence suffix of the run number (e.g., "00004").
    pub fn run_suffix(&self) -> &str {
        self.run_number
            .rsplit('-')
            .next()
            .unwrap_or(&self.run_number)
    }
}

/// A manual correction captured during review and re-applied verbatim by
/// the next calculation pass of the same run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentEntry {
    /// Unique identifier.
    pub id: Uuid,
    /// The run the adjustment belongs to.
    pub run_id: Uuid,
    /// The employee the adjustment targets.
    pub employee_id: String,
    /// Display description shown on the payslip line.
    pub description: String,
    /// Adjustment amount.
    pub amount: Decimal,
    /// Earning when true, deduction when false.
    pub earning: bool,
    /// Deduction adjustments reduce the taxable base when set.
    #[serde(default)]
    pub pre_tax: bool,
}
