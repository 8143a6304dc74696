//! Run pipeline orchestration.
//!
//! A [`PayrollEngine`] owns the record store, the effective-dated
//! configuration, and the two seams every operation passes through:
//! authorization and auditing. Operations drive a run through six steps,
//!
//! 1. create, 2. validate, 3. calculate, 4. review, 5. generate
//! payslips, 6. close,
//!
//! with statuses DRAFT, VALIDATING, PROCESSING, COMPUTED, FOR_REVIEW,
//! FOR_PAYMENT, and PAID. Recalculation is allowed until a run is
//! released for payment; closing is idempotent; reopening walks a
//! released or paid run back to review. Concurrent requests on the same
//! run are resolved by compare-and-set status updates, so exactly one
//! caller wins any contested transition.

mod access;
mod audit;
mod compute;
mod store;

pub use access::{permissions, AllowAll, Authorizer, DenyAll};
pub use audit::{AuditEntry, AuditSink, MemoryAuditSink};
pub use store::{CalculationCommit, EngineStore};

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::calculation::{employee_rates, statutory_contributions, StatutoryDiagnostics};
use crate::config::PayrollConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AdjustmentEntry, LoanPayment, PayPeriod, PayrollRun, Payslip, PeriodStatus, RunScope,
    RunStatus, RunTotals, RunType, Step, StepStatus,
};
use crate::rounding::round_currency;
use compute::{compute_employee, ComputeContext, EmployeeInputs};

/// Parameters for creating a payroll run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRunInput {
    /// The owning company.
    pub company_id: String,
    /// The pay period the run is anchored to. Bonus runs compute over
    /// the period's calendar year.
    pub period_id: String,
    /// Regular or bonus variant.
    pub run_type: RunType,
    /// Optional employee filters; empty filters match everyone.
    #[serde(default)]
    pub scope: RunScope,
}

/// Parameters for recording a manual adjustment during review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustmentInput {
    /// The employee the adjustment belongs to.
    pub employee_id: String,
    /// Payslip line description.
    pub description: String,
    /// Line amount; rounded to currency precision on entry.
    pub amount: Decimal,
    /// True for an earning line, false for a deduction line.
    pub earning: bool,
    /// Whether a deduction line reduces the taxable base.
    #[serde(default)]
    pub pre_tax: bool,
}

/// Outcome of the data completeness check.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    /// Blocking problems; the run stays where it was when non-empty.
    pub errors: Vec<String>,
    /// Non-blocking findings, also recorded on the step notes.
    pub warnings: Vec<String>,
    /// Number of employees the run will process.
    pub employee_count: usize,
    /// Counter totals from a dry statutory pass over the population.
    pub diagnostics: StatutoryDiagnostics,
}

impl ValidationReport {
    /// True when validation found no blocking problems.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Outcome of a calculation pass.
#[derive(Debug, Clone, Serialize)]
pub struct CalculationSummary {
    /// Payslips produced.
    pub processed_count: usize,
    /// Employees gated out by the run type.
    pub skipped_count: usize,
    /// Run-level aggregates, also stored on the run.
    pub totals: RunTotals,
    /// Per-scheme applied/skipped/missing counters.
    pub diagnostics: StatutoryDiagnostics,
}

/// Outcome of a close request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseOutcome {
    /// This request performed the close.
    Closed,
    /// The run was already paid; nothing changed.
    AlreadyClosed,
}

/// The payroll run engine: store, configuration, and operation seams.
pub struct PayrollEngine {
    store: EngineStore,
    config: PayrollConfig,
    authorizer: Arc<dyn Authorizer>,
    audit: Arc<dyn AuditSink>,
}

impl PayrollEngine {
    /// Creates an engine that grants all permissions and audits to an
    /// in-memory sink.
    pub fn new(config: PayrollConfig) -> Self {
        Self::with_seams(config, Arc::new(AllowAll), Arc::new(MemoryAuditSink::new()))
    }

    /// Creates an engine with explicit authorization and audit seams.
    pub fn with_seams(
        config: PayrollConfig,
        authorizer: Arc<dyn Authorizer>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            store: EngineStore::new(),
            config,
            authorizer,
            audit,
        }
    }

    /// The record store, for seeding and inspection.
    pub fn store(&self) -> &EngineStore {
        &self.store
    }

    fn authorize(
        &self,
        actor_id: &str,
        permission: &'static str,
        company_id: &str,
    ) -> EngineResult<()> {
        if self.authorizer.can(actor_id, permission, company_id) {
            Ok(())
        } else {
            Err(EngineError::PermissionDenied {
                actor_id: actor_id.to_string(),
                permission: permission.to_string(),
            })
        }
    }

    fn audit_run(&self, run_id: Uuid, action: &str, actor_id: &str, changes: serde_json::Value) {
        self.audit.record(AuditEntry {
            table: "payroll_runs".to_string(),
            record_id: run_id.to_string(),
            action: action.to_string(),
            actor_id: actor_id.to_string(),
            reason: None,
            changes,
            at: Utc::now(),
        });
    }

    /// Creates a run against a pay period.
    ///
    /// Guards, in order: the period must exist; a regular run needs the
    /// period open; the period must have no other non-terminal run; at
    /// least one employee must match the scope.
    pub fn create_run(&self, actor_id: &str, input: CreateRunInput) -> EngineResult<PayrollRun> {
        self.authorize(actor_id, permissions::RUN_CREATE, &input.company_id)?;
        let period =
            self.store
                .period(&input.period_id)
                .ok_or_else(|| EngineError::PeriodNotFound {
                    period_id: input.period_id.clone(),
                })?;
        let require_open = input.run_type == RunType::Regular;
        if require_open && period.status != PeriodStatus::Open {
            return Err(EngineError::PeriodLocked {
                period_id: period.id,
            });
        }
        if let Some(existing) = self.store.active_run_for(&period.id) {
            return Err(EngineError::ActiveRunExists {
                period_id: period.id,
                run_number: existing.run_number,
            });
        }
        let (window_start, window_end) = eligibility_window(input.run_type, &period);
        let eligible =
            self.store
                .employees_in_scope(&input.company_id, &input.scope, window_start, window_end);
        if eligible.is_empty() {
            return Err(EngineError::NoEligibleEmployees {
                period_id: period.id,
            });
        }

        let run = self.store.create_run(
            &input.company_id,
            &period.id,
            input.run_type,
            input.scope,
            require_open,
            Utc::now(),
        )?;
        info!(
            run_number = %run.run_number,
            period_id = %run.period_id,
            eligible = eligible.len(),
            "payroll run created"
        );
        self.audit_run(
            run.id,
            "create",
            actor_id,
            json!({
                "run_number": run.run_number,
                "period_id": run.period_id,
                "run_type": run.run_type,
                "status": run.status.as_str(),
            }),
        );
        Ok(run)
    }

    /// Checks data completeness ahead of calculation.
    ///
    /// Returns the report in both outcomes: blocking errors leave the
    /// status untouched and mark step 2 failed; a clean pass moves the
    /// run to VALIDATING with warnings recorded on the step notes.
    pub fn validate_run(&self, actor_id: &str, run_id: Uuid) -> EngineResult<ValidationReport> {
        let run = self
            .store
            .run(run_id)
            .ok_or(EngineError::RunNotFound { run_id })?;
        self.authorize(actor_id, permissions::RUN_VALIDATE, &run.company_id)?;
        if !matches!(run.status, RunStatus::Draft | RunStatus::Validating) {
            return Err(EngineError::InvalidTransition {
                run_number: run.run_number,
                status: run.status,
                action: "validate",
            });
        }

        let mut report = ValidationReport {
            errors: Vec::new(),
            warnings: Vec::new(),
            employee_count: 0,
            diagnostics: StatutoryDiagnostics::default(),
        };

        let period =
            self.store
                .period(&run.period_id)
                .ok_or_else(|| EngineError::PeriodNotFound {
                    period_id: run.period_id.clone(),
                })?;
        let pattern = self.store.pattern(&period.pattern_id);
        if pattern.is_none() {
            report
                .errors
                .push(format!("pay period pattern '{}' not found", period.pattern_id));
        }

        let (window_start, window_end) = eligibility_window(run.run_type, &period);
        let employees =
            self.store
                .employees_in_scope(&run.company_id, &run.scope, window_start, window_end);
        report.employee_count = employees.len();
        if employees.is_empty() {
            report
                .errors
                .push("no eligible employees match the run scope".to_string());
        }

        let tables = self.config.tables_for(period.cutoff_end);
        match tables {
            None => report.warnings.push(format!(
                "no statutory tables effective on or before {}; contributions and tax will compute as zero",
                period.cutoff_end
            )),
            Some(t) => {
                if t.sss.is_empty() {
                    report.warnings.push("SSS bracket table is empty".to_string());
                }
                if t.philhealth.is_none() {
                    report
                        .warnings
                        .push("PhilHealth premium table is missing".to_string());
                }
                if t.pagibig.is_empty() {
                    report
                        .warnings
                        .push("Pag-IBIG bracket table is empty".to_string());
                }
                if t.annual_tax.is_empty() && t.period_tax.is_empty() {
                    report
                        .warnings
                        .push("no withholding tax tables; tax will compute as zero".to_string());
                }
            }
        }

        // Dry statutory pass over the population, counting which schemes
        // would apply, skip, or miss their tables.
        if let Some(pattern) = &pattern {
            if !run.run_type.is_bonus() {
                for employee in &employees {
                    let rates = employee_rates(employee, pattern.frequency);
                    statutory_contributions(
                        tables,
                        rates.monthly_base,
                        &pattern.schedule,
                        pattern.frequency,
                        period.half,
                        &mut report.diagnostics,
                    );
                }
            }
        }

        let now = Utc::now();
        if report.errors.is_empty() {
            if self
                .store
                .update_run_status(
                    run_id,
                    &[RunStatus::Draft, RunStatus::Validating],
                    RunStatus::Validating,
                )
                .is_none()
            {
                return Err(EngineError::TransitionConflict {
                    run_number: run.run_number,
                    action: "validate",
                });
            }
            let notes = if report.warnings.is_empty() {
                None
            } else {
                Some(report.warnings.join("; "))
            };
            self.store.with_run_mut(run_id, |r| {
                let step = r.step_mut(Step::Validate);
                step.complete(now);
                step.notes = notes;
                r.current_step = Step::Calculate.number();
            })?;
            info!(
                run_number = %run.run_number,
                employees = report.employee_count,
                warnings = report.warnings.len(),
                "run validated"
            );
            self.audit_run(
                run_id,
                "validate",
                actor_id,
                json!({
                    "employee_count": report.employee_count,
                    "warnings": report.warnings,
                    "status": RunStatus::Validating.as_str(),
                }),
            );
        } else {
            self.store.with_run_mut(run_id, |r| {
                r.step_mut(Step::Validate).fail(now, report.errors.join("; "));
            })?;
            warn!(
                run_number = %run.run_number,
                errors = report.errors.len(),
                "validation failed"
            );
        }
        Ok(report)
    }

    /// Calculates (or recalculates) every payslip of a run.
    ///
    /// Allowed from VALIDATING, COMPUTED, or FOR_REVIEW once validation
    /// has passed. The run holds PROCESSING for the duration; prior
    /// payslips and loan payments of the run are replaced in one commit.
    /// On failure the run falls back to VALIDATING with step 3 failed.
    pub fn calculate_run(&self, actor_id: &str, run_id: Uuid) -> EngineResult<CalculationSummary> {
        const RECALCULABLE: [RunStatus; 3] = [
            RunStatus::Validating,
            RunStatus::Computed,
            RunStatus::ForReview,
        ];

        let run = self
            .store
            .run(run_id)
            .ok_or(EngineError::RunNotFound { run_id })?;
        self.authorize(actor_id, permissions::RUN_CALCULATE, &run.company_id)?;
        if !RECALCULABLE.contains(&run.status)
            || run.step(Step::Validate).status != StepStatus::Completed
        {
            return Err(EngineError::InvalidTransition {
                run_number: run.run_number,
                status: run.status,
                action: "calculate",
            });
        }
        if self
            .store
            .update_run_status(run_id, &RECALCULABLE, RunStatus::Processing)
            .is_none()
        {
            return Err(EngineError::TransitionConflict {
                run_number: run.run_number,
                action: "calculate",
            });
        }
        self.store.with_run_mut(run_id, |r| {
            r.step_mut(Step::Calculate).status = StepStatus::InProgress;
        })?;

        match self.calculate_inner(&run) {
            Ok((summary, payments)) => {
                let now = Utc::now();
                let notes = format!(
                    "{} payslips computed, {} skipped",
                    summary.processed_count, summary.skipped_count
                );
                let totals = summary.totals.clone();
                self.store.with_run_mut(run_id, |r| {
                    let step = r.step_mut(Step::Calculate);
                    step.complete(now);
                    step.notes = Some(notes);
                    r.step_mut(Step::Review).reset();
                    r.step_mut(Step::GeneratePayslips).reset();
                    r.step_mut(Step::Close).reset();
                    r.current_step = Step::Review.number();
                    r.totals = totals;
                })?;
                if self
                    .store
                    .update_run_status(run_id, &[RunStatus::Processing], RunStatus::Computed)
                    .is_none()
                {
                    return Err(EngineError::TransitionConflict {
                        run_number: run.run_number,
                        action: "calculate",
                    });
                }
                info!(
                    run_number = %run.run_number,
                    processed = summary.processed_count,
                    skipped = summary.skipped_count,
                    "run calculated"
                );
                self.audit_run(
                    run_id,
                    "calculate",
                    actor_id,
                    json!({
                        "processed": summary.processed_count,
                        "skipped": summary.skipped_count,
                        "gross_pay": summary.totals.gross_pay,
                        "net_pay": summary.totals.net_pay,
                    }),
                );
                for payment in &payments {
                    self.audit.record(AuditEntry {
                        table: "loan_payments".to_string(),
                        record_id: payment.id.to_string(),
                        action: "create".to_string(),
                        actor_id: actor_id.to_string(),
                        reason: None,
                        changes: json!({
                            "loan_id": payment.loan_id,
                            "employee_id": payment.employee_id,
                            "amount": payment.amount,
                            "run_id": payment.run_id,
                        }),
                        at: Utc::now(),
                    });
                }
                Ok(summary)
            }
            Err(error) => {
                let now = Utc::now();
                self.store.with_run_mut(run_id, |r| {
                    r.step_mut(Step::Calculate).fail(now, error.to_string());
                    r.step_mut(Step::Review).reset();
                    r.step_mut(Step::GeneratePayslips).reset();
                    r.step_mut(Step::Close).reset();
                    r.current_step = Step::Calculate.number();
                })?;
                self.store
                    .update_run_status(run_id, &[RunStatus::Processing], RunStatus::Validating);
                warn!(run_number = %run.run_number, error = %error, "calculation failed");
                Err(error)
            }
        }
    }

    fn calculate_inner(
        &self,
        run: &PayrollRun,
    ) -> EngineResult<(CalculationSummary, Vec<LoanPayment>)> {
        let period =
            self.store
                .period(&run.period_id)
                .ok_or_else(|| EngineError::PeriodNotFound {
                    period_id: run.period_id.clone(),
                })?;
        let pattern = self.store.pattern(&period.pattern_id).ok_or_else(|| {
            EngineError::CalculationFailed {
                run_number: run.run_number.clone(),
                message: format!("pay period pattern '{}' not found", period.pattern_id),
            }
        })?;
        let tables = self.config.tables_for(period.cutoff_end);
        let (window_start, window_end) = eligibility_window(run.run_type, &period);
        let employees =
            self.store
                .employees_in_scope(&run.company_id, &run.scope, window_start, window_end);
        let holidays = self
            .store
            .holidays_in(period.cutoff_start, period.cutoff_end);
        let adjustments = self.store.adjustments_for_run(run.id);

        let ctx = ComputeContext {
            run,
            period: &period,
            pattern: &pattern,
            tables,
            attendance_policy: &self.config.company().attendance,
            holidays: &holidays,
        };
        let mut diagnostics = StatutoryDiagnostics::default();
        let mut payslips = Vec::with_capacity(employees.len());
        let mut applications = Vec::new();
        let mut skipped = 0usize;
        for employee in &employees {
            let inputs = EmployeeInputs {
                attendance: self.store.attendance_for(
                    &employee.id,
                    period.cutoff_start,
                    period.cutoff_end,
                ),
                leaves: self.store.leaves_for(&employee.id),
                overtime: self.store.overtime_for(&employee.id),
                loans: self.store.loans_for(&employee.id),
                adjustments: adjustments
                    .iter()
                    .filter(|a| a.employee_id == employee.id)
                    .cloned()
                    .collect(),
                ytd: self.store.ytd_for(&employee.id, run.year),
            };
            match compute_employee(&ctx, employee, &inputs, &mut diagnostics) {
                Some(slip) => {
                    applications.extend(slip.loan_applications);
                    payslips.push(slip.payslip);
                }
                None => skipped += 1,
            }
        }

        let totals = run_totals(&payslips);
        let processed_count = payslips.len();
        let codes: Vec<String> = payslips
            .iter()
            .flat_map(|s| {
                s.earnings
                    .iter()
                    .map(|e| e.type_code.clone())
                    .chain(s.deductions.iter().map(|d| d.type_code.clone()))
            })
            .collect();

        let payments = self.store.commit_calculation(CalculationCommit {
            run_id: run.id,
            run_number: run.run_number.clone(),
            payslips,
            loan_applications: applications,
            paid_at: Utc::now(),
        })?;
        self.store.ensure_type_codes(&run.company_id, codes);

        Ok((
            CalculationSummary {
                processed_count,
                skipped_count: skipped,
                totals,
                diagnostics,
            },
            payments,
        ))
    }

    /// Marks review complete, moving COMPUTED to FOR_REVIEW.
    pub fn complete_review(&self, actor_id: &str, run_id: Uuid) -> EngineResult<PayrollRun> {
        self.advance_step(
            actor_id,
            run_id,
            permissions::RUN_REVIEW,
            RunStatus::Computed,
            RunStatus::ForReview,
            Step::Review,
            "complete review",
        )
    }

    /// Releases payslips for payment, moving FOR_REVIEW to FOR_PAYMENT.
    /// Amounts are frozen from here until a reopen.
    pub fn generate_payslips(&self, actor_id: &str, run_id: Uuid) -> EngineResult<PayrollRun> {
        self.advance_step(
            actor_id,
            run_id,
            permissions::RUN_GENERATE,
            RunStatus::ForReview,
            RunStatus::ForPayment,
            Step::GeneratePayslips,
            "generate payslips",
        )
    }

    fn advance_step(
        &self,
        actor_id: &str,
        run_id: Uuid,
        permission: &'static str,
        from: RunStatus,
        to: RunStatus,
        step: Step,
        action: &'static str,
    ) -> EngineResult<PayrollRun> {
        let run = self
            .store
            .run(run_id)
            .ok_or(EngineError::RunNotFound { run_id })?;
        self.authorize(actor_id, permission, &run.company_id)?;
        if run.status != from {
            return Err(EngineError::InvalidTransition {
                run_number: run.run_number,
                status: run.status,
                action,
            });
        }
        if self.store.update_run_status(run_id, &[from], to).is_none() {
            return Err(EngineError::TransitionConflict {
                run_number: run.run_number,
                action,
            });
        }
        let now = Utc::now();
        self.store.with_run_mut(run_id, |r| {
            r.step_mut(step).complete(now);
            r.current_step = (step.number() + 1).min(Step::Close.number());
        })?;
        info!(run_number = %run.run_number, status = to.as_str(), "run advanced");
        self.audit_run(
            run_id,
            action,
            actor_id,
            json!({"from": from.as_str(), "to": to.as_str()}),
        );
        self.store
            .run(run_id)
            .ok_or(EngineError::RunNotFound { run_id })
    }

    /// Closes a run as paid. Idempotent: a run already paid reports
    /// [`CloseOutcome::AlreadyClosed`] without a second audit entry.
    /// Closing a regular run locks its pay period.
    pub fn close_run(&self, actor_id: &str, run_id: Uuid) -> EngineResult<CloseOutcome> {
        let run = self
            .store
            .run(run_id)
            .ok_or(EngineError::RunNotFound { run_id })?;
        self.authorize(actor_id, permissions::RUN_CLOSE, &run.company_id)?;
        if run.status == RunStatus::Paid {
            return Ok(CloseOutcome::AlreadyClosed);
        }
        if run.status != RunStatus::ForPayment {
            return Err(EngineError::InvalidTransition {
                run_number: run.run_number,
                status: run.status,
                action: "close",
            });
        }
        if self
            .store
            .update_run_status(run_id, &[RunStatus::ForPayment], RunStatus::Paid)
            .is_none()
        {
            // Lost the race. If the winner closed the run this request
            // still succeeded from the caller's point of view.
            let current = self
                .store
                .run(run_id)
                .ok_or(EngineError::RunNotFound { run_id })?;
            if current.status == RunStatus::Paid {
                return Ok(CloseOutcome::AlreadyClosed);
            }
            return Err(EngineError::TransitionConflict {
                run_number: run.run_number,
                action: "close",
            });
        }

        let now = Utc::now();
        self.store.with_run_mut(run_id, |r| {
            r.step_mut(Step::Close).complete(now);
            r.current_step = Step::Close.number();
        })?;
        if run.run_type == RunType::Regular {
            self.store
                .update_period_status(&run.period_id, PeriodStatus::Open, PeriodStatus::Locked);
        }
        info!(run_number = %run.run_number, "run closed");
        self.audit_run(
            run_id,
            "close",
            actor_id,
            json!({
                "run_number": run.run_number,
                "status": RunStatus::Paid.as_str(),
            }),
        );
        Ok(CloseOutcome::Closed)
    }

    /// Walks a released or paid run back to FOR_REVIEW, resetting steps
    /// 5 and 6. Reopening a paid regular run unlocks its pay period.
    pub fn reopen_run(&self, actor_id: &str, run_id: Uuid) -> EngineResult<PayrollRun> {
        let run = self
            .store
            .run(run_id)
            .ok_or(EngineError::RunNotFound { run_id })?;
        self.authorize(actor_id, permissions::RUN_REOPEN, &run.company_id)?;
        if !matches!(run.status, RunStatus::ForPayment | RunStatus::Paid) {
            return Err(EngineError::InvalidTransition {
                run_number: run.run_number,
                status: run.status,
                action: "reopen",
            });
        }
        let previous = self
            .store
            .update_run_status(
                run_id,
                &[RunStatus::ForPayment, RunStatus::Paid],
                RunStatus::ForReview,
            )
            .ok_or_else(|| EngineError::TransitionConflict {
                run_number: run.run_number.clone(),
                action: "reopen",
            })?;
        self.store.with_run_mut(run_id, |r| {
            r.step_mut(Step::GeneratePayslips).reset();
            r.step_mut(Step::Close).reset();
            r.current_step = Step::GeneratePayslips.number();
        })?;
        if previous == RunStatus::Paid && run.run_type == RunType::Regular {
            self.store
                .update_period_status(&run.period_id, PeriodStatus::Locked, PeriodStatus::Open);
        }
        info!(run_number = %run.run_number, from = previous.as_str(), "run reopened");
        self.audit_run(
            run_id,
            "reopen",
            actor_id,
            json!({
                "from": previous.as_str(),
                "to": RunStatus::ForReview.as_str(),
            }),
        );
        self.store
            .run(run_id)
            .ok_or(EngineError::RunNotFound { run_id })
    }

    /// Records a manual adjustment against a run in COMPUTED or
    /// FOR_REVIEW. The adjustment takes effect on the next calculation.
    pub fn add_adjustment(
        &self,
        actor_id: &str,
        run_id: Uuid,
        input: AdjustmentInput,
    ) -> EngineResult<AdjustmentEntry> {
        let run = self
            .store
            .run(run_id)
            .ok_or(EngineError::RunNotFound { run_id })?;
        self.authorize(actor_id, permissions::RUN_ADJUST, &run.company_id)?;
        if !matches!(run.status, RunStatus::Computed | RunStatus::ForReview) {
            return Err(EngineError::InvalidTransition {
                run_number: run.run_number,
                status: run.status,
                action: "add adjustment",
            });
        }
        let employee =
            self.store
                .employee(&input.employee_id)
                .ok_or_else(|| EngineError::EmployeeNotFound {
                    employee_id: input.employee_id.clone(),
                })?;
        if employee.company_id != run.company_id || !run.scope.matches(&employee) {
            return Err(EngineError::EmployeeNotFound {
                employee_id: input.employee_id,
            });
        }

        let entry = AdjustmentEntry {
            id: Uuid::new_v4(),
            run_id,
            employee_id: input.employee_id,
            description: input.description,
            amount: round_currency(input.amount),
            earning: input.earning,
            pre_tax: input.pre_tax,
        };
        self.store.insert_adjustment(entry.clone());
        info!(
            run_number = %run.run_number,
            employee_id = %entry.employee_id,
            amount = %entry.amount,
            earning = entry.earning,
            "adjustment recorded"
        );
        self.audit.record(AuditEntry {
            table: "payroll_adjustments".to_string(),
            record_id: entry.id.to_string(),
            action: "create".to_string(),
            actor_id: actor_id.to_string(),
            reason: None,
            changes: json!({
                "run_id": run_id,
                "employee_id": entry.employee_id,
                "description": entry.description,
                "amount": entry.amount,
                "earning": entry.earning,
            }),
            at: Utc::now(),
        });
        Ok(entry)
    }

    /// Fetches a run.
    pub fn get_run(&self, run_id: Uuid) -> EngineResult<PayrollRun> {
        self.store
            .run(run_id)
            .ok_or(EngineError::RunNotFound { run_id })
    }

    /// Fetches a run's payslips, sorted by slip number.
    pub fn payslips_for_run(&self, run_id: Uuid) -> EngineResult<Vec<Payslip>> {
        self.get_run(run_id)?;
        Ok(self.store.payslips_for_run(run_id))
    }
}

/// Bonus runs pick up everyone employed during the period's calendar
/// year; regular runs use the cutoff window.
fn eligibility_window(run_type: RunType, period: &PayPeriod) -> (NaiveDate, NaiveDate) {
    if run_type.is_bonus() {
        let start = NaiveDate::from_ymd_opt(period.year, 1, 1);
        let end = NaiveDate::from_ymd_opt(period.year, 12, 31);
        if let (Some(start), Some(end)) = (start, end) {
            return (start, end);
        }
    }
    (period.cutoff_start, period.cutoff_end)
}

fn run_totals(payslips: &[Payslip]) -> RunTotals {
    let mut totals = RunTotals::default();
    for slip in payslips {
        totals.gross_pay += slip.gross_pay;
        totals.total_deductions += slip.total_deductions;
        totals.net_pay += slip.net_pay;
        totals.employer_share += slip.employer_share_total();
    }
    totals.employer_cost = totals.gross_pay + totals.employer_share;
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        AttendanceDeductionBasis, AttendancePolicy, CompanyPolicy, HolidayPolicy, OvertimePolicy,
        PagIbigBracket, PhilHealthTable, SssBracket, StatutoryTableSet, TaxBracket,
    };
    use crate::models::{
        AttendanceDay, ContributionSchedule, Employee, Holiday, HolidayKind, PayBasis,
        PayFrequency, PayPeriodPattern, PeriodHalf, WorkSchedule,
    };
    use chrono::Weekday;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn test_tables() -> StatutoryTableSet {
        StatutoryTableSet {
            effective_date: date(2025, 1, 1),
            sss: vec![SssBracket {
                min_salary: Decimal::ZERO,
                max_salary: None,
                employee_share: dec("1500"),
                employer_share: dec("3000"),
            }],
            philhealth: Some(PhilHealthTable {
                monthly_floor: dec("10000"),
                monthly_ceiling: dec("100000"),
                premium_rate: dec("0.05"),
                employee_pct: dec("0.5"),
                employer_pct: dec("0.5"),
            }),
            pagibig: vec![PagIbigBracket {
                min_salary: Decimal::ZERO,
                max_salary: None,
                employee_share: dec("200"),
                employer_share: dec("200"),
            }],
            annual_tax: vec![
                TaxBracket {
                    over: Decimal::ZERO,
                    up_to: Some(dec("250000")),
                    base_tax: Decimal::ZERO,
                    rate: Decimal::ZERO,
                },
                TaxBracket {
                    over: dec("250000"),
                    up_to: None,
                    base_tax: Decimal::ZERO,
                    rate: dec("0.15"),
                },
            ],
            period_tax: vec![],
            overtime: OvertimePolicy {
                regular: dec("1.25"),
                rest_day: dec("1.69"),
                regular_holiday: dec("2.60"),
                special_holiday: dec("1.69"),
                rest_day_holiday: dec("3.38"),
            },
            holiday: HolidayPolicy {
                regular_multiplier: dec("2.0"),
                special_multiplier: dec("1.3"),
            },
            night_diff_rate: dec("0.10"),
            bonus_exclusion_ceiling: dec("90000"),
            substituted_filing_rate: dec("0.08"),
        }
    }

    fn test_config() -> PayrollConfig {
        PayrollConfig::new(
            CompanyPolicy {
                company_id: "PH-ACME".to_string(),
                company_name: "Acme Manufacturing (PH)".to_string(),
                attendance: AttendancePolicy {
                    deduction_basis: AttendanceDeductionBasis::PerMinute,
                },
            },
            vec![test_tables()],
        )
    }

    fn test_employee(id: &str) -> Employee {
        Employee {
            id: id.to_string(),
            company_id: "PH-ACME".to_string(),
            department_id: None,
            branch_id: None,
            pay_basis: PayBasis::Monthly {
                monthly_salary: dec("30000"),
            },
            hire_date: date(2020, 1, 1),
            separation_date: None,
            has_thirteenth_month: true,
            overtime_eligible: true,
            night_diff_eligible: false,
            substituted_filing: false,
            schedule: WorkSchedule {
                rest_days: vec![Weekday::Sat, Weekday::Sun],
                hours_per_day: None,
            },
            recurring_earnings: Vec::new(),
            recurring_deductions: Vec::new(),
            active: true,
        }
    }

    /// Engine over one semi-monthly period (Jan 1-15, 2025) with one
    /// employee in full attendance.
    fn seeded_engine() -> (PayrollEngine, Arc<MemoryAuditSink>) {
        let sink = Arc::new(MemoryAuditSink::new());
        let engine = PayrollEngine::with_seams(test_config(), Arc::new(AllowAll), sink.clone());
        engine.store().insert_pattern(PayPeriodPattern {
            id: "PAT-SM".to_string(),
            company_id: "PH-ACME".to_string(),
            frequency: PayFrequency::SemiMonthly,
            schedule: ContributionSchedule::default(),
        });
        engine.store().insert_period(PayPeriod {
            id: "2025-01-A".to_string(),
            pattern_id: "PAT-SM".to_string(),
            cutoff_start: date(2025, 1, 1),
            cutoff_end: date(2025, 1, 15),
            year: 2025,
            half: PeriodHalf::First,
            working_days: None,
            status: PeriodStatus::Open,
        });
        engine.store().insert_holiday(Holiday {
            date: date(2025, 1, 1),
            name: "New Year's Day".to_string(),
            kind: HolidayKind::Regular,
        });
        engine.store().insert_employee(test_employee("EMP-0100"));
        for day in [2, 3, 6, 7, 8, 9, 10, 13, 14, 15] {
            engine.store().insert_attendance(AttendanceDay {
                employee_id: "EMP-0100".to_string(),
                date: date(2025, 1, day),
                tardiness_mins: Decimal::ZERO,
                undertime_mins: Decimal::ZERO,
                hours_worked: dec("8"),
                night_diff_hours: Decimal::ZERO,
                remarks: None,
            });
        }
        (engine, sink)
    }

    fn regular_input() -> CreateRunInput {
        CreateRunInput {
            company_id: "PH-ACME".to_string(),
            period_id: "2025-01-A".to_string(),
            run_type: RunType::Regular,
            scope: RunScope::default(),
        }
    }

    #[test]
    fn test_create_run_starts_at_step_two() {
        let (engine, sink) = seeded_engine();
        let run = engine.create_run("system", regular_input()).unwrap();

        assert_eq!(run.run_number, "RUN-2025-00001");
        assert_eq!(run.status, RunStatus::Draft);
        assert_eq!(run.current_step, 2);
        assert_eq!(run.step(Step::Create).status, StepStatus::Completed);
        assert_eq!(run.step(Step::Validate).status, StepStatus::Pending);
        assert_eq!(sink.count_for("create"), 1);
    }

    #[test]
    fn test_create_run_guards_in_order() {
        let (engine, _) = seeded_engine();

        let missing = engine.create_run(
            "system",
            CreateRunInput {
                period_id: "2025-02-A".to_string(),
                ..regular_input()
            },
        );
        assert!(matches!(missing, Err(EngineError::PeriodNotFound { .. })));

        let nobody = engine.create_run(
            "system",
            CreateRunInput {
                scope: RunScope {
                    employee_ids: vec!["EMP-9999".to_string()],
                    ..RunScope::default()
                },
                ..regular_input()
            },
        );
        assert!(matches!(nobody, Err(EngineError::NoEligibleEmployees { .. })));

        let first = engine.create_run("system", regular_input()).unwrap();
        let duplicate = engine.create_run("system", regular_input());
        match duplicate {
            Err(EngineError::ActiveRunExists { run_number, .. }) => {
                assert_eq!(run_number, first.run_number);
            }
            other => panic!("expected ActiveRunExists, got {other:?}"),
        }
    }

    #[test]
    fn test_regular_run_needs_open_period_but_bonus_does_not() {
        let (engine, _) = seeded_engine();
        engine
            .store()
            .update_period_status("2025-01-A", PeriodStatus::Open, PeriodStatus::Locked);

        let locked = engine.create_run("system", regular_input());
        assert!(matches!(locked, Err(EngineError::PeriodLocked { .. })));

        let bonus = engine.create_run(
            "system",
            CreateRunInput {
                run_type: RunType::ThirteenthMonth,
                ..regular_input()
            },
        );
        assert!(bonus.is_ok());
    }

    #[test]
    fn test_validate_moves_run_to_validating() {
        let (engine, _) = seeded_engine();
        let run = engine.create_run("system", regular_input()).unwrap();

        let report = engine.validate_run("system", run.id).unwrap();
        assert!(report.is_valid());
        assert_eq!(report.employee_count, 1);
        assert!(report.warnings.is_empty());
        assert_eq!(report.diagnostics.sss_applied, 1);

        let run = engine.get_run(run.id).unwrap();
        assert_eq!(run.status, RunStatus::Validating);
        assert_eq!(run.step(Step::Validate).status, StepStatus::Completed);
        assert_eq!(run.current_step, 3);
    }

    #[test]
    fn test_validate_failure_marks_step_and_keeps_status() {
        let (engine, _) = seeded_engine();
        let run = engine.create_run("system", regular_input()).unwrap();

        // The only employee deactivates between create and validate.
        let mut employee = test_employee("EMP-0100");
        employee.active = false;
        engine.store().insert_employee(employee);

        let report = engine.validate_run("system", run.id).unwrap();
        assert!(!report.is_valid());
        assert_eq!(report.employee_count, 0);

        let run = engine.get_run(run.id).unwrap();
        assert_eq!(run.status, RunStatus::Draft);
        assert_eq!(run.step(Step::Validate).status, StepStatus::Failed);
        assert!(run.step(Step::Validate).notes.is_some());
    }

    #[test]
    fn test_calculate_requires_completed_validation() {
        let (engine, _) = seeded_engine();
        let run = engine.create_run("system", regular_input()).unwrap();
        let err = engine.calculate_run("system", run.id).unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition { .. }));
    }

    #[test]
    fn test_calculate_produces_payslips_and_totals() {
        let (engine, _) = seeded_engine();
        let run = engine.create_run("system", regular_input()).unwrap();
        engine.validate_run("system", run.id).unwrap();

        let summary = engine.calculate_run("system", run.id).unwrap();
        assert_eq!(summary.processed_count, 1);
        assert_eq!(summary.skipped_count, 0);
        assert_eq!(summary.totals.gross_pay, dec("15000.00"));
        assert_eq!(summary.totals.net_pay, dec("12550.00"));
        assert_eq!(summary.totals.employer_share, dec("3950.00"));
        assert_eq!(summary.totals.employer_cost, dec("18950.00"));

        let run = engine.get_run(run.id).unwrap();
        assert_eq!(run.status, RunStatus::Computed);
        assert_eq!(run.current_step, 4);
        assert_eq!(run.totals, summary.totals);

        let slips = engine.payslips_for_run(run.id).unwrap();
        assert_eq!(slips.len(), 1);
        assert_eq!(slips[0].slip_number, "PSL-00001-EMP-0100");

        // Emitted type codes land in the company's pay item registry.
        let codes = engine.store().registered_type_codes("PH-ACME");
        assert!(codes.contains(&"BASIC".to_string()));
        assert!(codes.contains(&"SSS".to_string()));
    }

    #[test]
    fn test_close_is_idempotent_with_single_audit_entry() {
        let (engine, sink) = seeded_engine();
        let run = engine.create_run("system", regular_input()).unwrap();
        engine.validate_run("system", run.id).unwrap();
        engine.calculate_run("system", run.id).unwrap();
        engine.complete_review("system", run.id).unwrap();
        engine.generate_payslips("system", run.id).unwrap();

        assert_eq!(engine.close_run("system", run.id).unwrap(), CloseOutcome::Closed);
        assert_eq!(
            engine.close_run("system", run.id).unwrap(),
            CloseOutcome::AlreadyClosed
        );
        assert_eq!(sink.count_for("close"), 1);

        let run = engine.get_run(run.id).unwrap();
        assert_eq!(run.status, RunStatus::Paid);
        assert_eq!(run.step(Step::Close).status, StepStatus::Completed);
        // Closing a regular run locks its period.
        let period = engine.store().period("2025-01-A").unwrap();
        assert_eq!(period.status, PeriodStatus::Locked);
    }

    #[test]
    fn test_reopen_paid_run_unlocks_period() {
        let (engine, _) = seeded_engine();
        let run = engine.create_run("system", regular_input()).unwrap();
        engine.validate_run("system", run.id).unwrap();
        engine.calculate_run("system", run.id).unwrap();
        engine.complete_review("system", run.id).unwrap();
        engine.generate_payslips("system", run.id).unwrap();
        engine.close_run("system", run.id).unwrap();

        let reopened = engine.reopen_run("system", run.id).unwrap();
        assert_eq!(reopened.status, RunStatus::ForReview);
        assert_eq!(reopened.current_step, 5);
        assert_eq!(
            reopened.step(Step::GeneratePayslips).status,
            StepStatus::Pending
        );
        assert_eq!(reopened.step(Step::Close).status, StepStatus::Pending);

        let period = engine.store().period("2025-01-A").unwrap();
        assert_eq!(period.status, PeriodStatus::Open);

        // A reopened run cannot close again without regenerating.
        let err = engine.close_run("system", run.id).unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition { .. }));
    }

    #[test]
    fn test_adjustment_gating_and_recalculation() {
        let (engine, _) = seeded_engine();
        let run = engine.create_run("system", regular_input()).unwrap();

        // Too early: the run has not been calculated yet.
        let early = engine.add_adjustment(
            "system",
            run.id,
            AdjustmentInput {
                employee_id: "EMP-0100".to_string(),
                description: "Referral incentive".to_string(),
                amount: dec("1000"),
                earning: true,
                pre_tax: false,
            },
        );
        assert!(matches!(early, Err(EngineError::InvalidTransition { .. })));

        engine.validate_run("system", run.id).unwrap();
        engine.calculate_run("system", run.id).unwrap();

        let unknown = engine.add_adjustment(
            "system",
            run.id,
            AdjustmentInput {
                employee_id: "EMP-9999".to_string(),
                description: "Referral incentive".to_string(),
                amount: dec("1000"),
                earning: true,
                pre_tax: false,
            },
        );
        assert!(matches!(unknown, Err(EngineError::EmployeeNotFound { .. })));

        engine
            .add_adjustment(
                "system",
                run.id,
                AdjustmentInput {
                    employee_id: "EMP-0100".to_string(),
                    description: "Referral incentive".to_string(),
                    amount: dec("1000"),
                    earning: true,
                    pre_tax: false,
                },
            )
            .unwrap();

        // The adjustment lands on the next calculation pass.
        let summary = engine.calculate_run("system", run.id).unwrap();
        assert_eq!(summary.totals.gross_pay, dec("16000.00"));
        let slips = engine.payslips_for_run(run.id).unwrap();
        assert!(slips[0]
            .earnings
            .iter()
            .any(|e| e.type_code == "ADJUSTMENT"));
    }

    #[test]
    fn test_deny_all_blocks_operations() {
        let sink = Arc::new(MemoryAuditSink::new());
        let engine = PayrollEngine::with_seams(test_config(), Arc::new(DenyAll), sink);
        let err = engine.create_run("auditor", regular_input()).unwrap_err();
        match err {
            EngineError::PermissionDenied { permission, .. } => {
                assert_eq!(permission, permissions::RUN_CREATE);
            }
            other => panic!("expected PermissionDenied, got {other:?}"),
        }
    }
}
