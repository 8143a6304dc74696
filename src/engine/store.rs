//! In-memory record store backing the engine.
//!
//! All tables live behind one mutex so that multi-table operations
//! (guarded run creation, the calculation commit) are atomic. Methods
//! take `&self` and lock internally; callers never hold the lock across
//! calls. Status updates use compare-and-set so concurrent requests on
//! the same run resolve to exactly one winner.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::calculation::LoanApplication;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AdjustmentEntry, AttendanceDay, DeductionSource, Employee, Holiday, LeaveRequest, Loan,
    LoanPayment, LoanStatus, OvertimeRequest, PayPeriod, PayPeriodPattern, PayrollRun,
    Payslip, PeriodStatus, RunScope, RunStatus, RunType, YtdSnapshot,
};

/// Everything [`EngineStore::commit_calculation`] writes in one atomic unit.
#[derive(Debug)]
pub struct CalculationCommit {
    /// The run the payslips belong to.
    pub run_id: Uuid,
    /// Run number, used in error messages.
    pub run_number: String,
    /// Freshly computed payslips, replacing any prior set for the run.
    pub payslips: Vec<Payslip>,
    /// Loan amortizations the calculation decided to settle.
    pub loan_applications: Vec<LoanApplication>,
    /// Timestamp stamped onto the created loan payments.
    pub paid_at: DateTime<Utc>,
}

#[derive(Default)]
struct StoreInner {
    patterns: HashMap<String, PayPeriodPattern>,
    periods: HashMap<String, PayPeriod>,
    holidays: Vec<Holiday>,
    employees: HashMap<String, Employee>,
    attendance: Vec<AttendanceDay>,
    leaves: Vec<LeaveRequest>,
    overtime: Vec<OvertimeRequest>,
    loans: HashMap<Uuid, Loan>,
    loan_payments: Vec<LoanPayment>,
    runs: HashMap<Uuid, PayrollRun>,
    payslips: Vec<Payslip>,
    adjustments: Vec<AdjustmentEntry>,
    type_codes: HashMap<String, BTreeSet<String>>,
    run_seq: HashMap<i32, u32>,
}

/// Thread-safe store for periods, employees, runs, payslips, and loans.
#[derive(Default)]
pub struct EngineStore {
    inner: Mutex<StoreInner>,
}

impl EngineStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ---- seeding ----

    /// Registers a pay period pattern, replacing any with the same id.
    pub fn insert_pattern(&self, pattern: PayPeriodPattern) {
        self.guard().patterns.insert(pattern.id.clone(), pattern);
    }

    /// Registers a pay period, replacing any with the same id.
    pub fn insert_period(&self, period: PayPeriod) {
        self.guard().periods.insert(period.id.clone(), period);
    }

    /// Registers a holiday.
    pub fn insert_holiday(&self, holiday: Holiday) {
        self.guard().holidays.push(holiday);
    }

    /// Registers an employee, replacing any with the same id.
    pub fn insert_employee(&self, employee: Employee) {
        self.guard().employees.insert(employee.id.clone(), employee);
    }

    /// Records one attendance day.
    pub fn insert_attendance(&self, day: AttendanceDay) {
        self.guard().attendance.push(day);
    }

    /// Records a leave request.
    pub fn insert_leave(&self, leave: LeaveRequest) {
        self.guard().leaves.push(leave);
    }

    /// Records an overtime request.
    pub fn insert_overtime(&self, request: OvertimeRequest) {
        self.guard().overtime.push(request);
    }

    /// Registers a loan, replacing any with the same id.
    pub fn insert_loan(&self, loan: Loan) {
        self.guard().loans.insert(loan.id, loan);
    }

    // ---- lookups ----

    /// Returns the pattern with the given id.
    pub fn pattern(&self, pattern_id: &str) -> Option<PayPeriodPattern> {
        self.guard().patterns.get(pattern_id).cloned()
    }

    /// Returns the period with the given id.
    pub fn period(&self, period_id: &str) -> Option<PayPeriod> {
        self.guard().periods.get(period_id).cloned()
    }

    /// Holidays falling inside the inclusive date window.
    pub fn holidays_in(&self, start: NaiveDate, end: NaiveDate) -> Vec<Holiday> {
        self.guard()
            .holidays
            .iter()
            .filter(|h| h.date >= start && h.date <= end)
            .cloned()
            .collect()
    }

    /// Returns the employee with the given id.
    pub fn employee(&self, employee_id: &str) -> Option<Employee> {
        self.guard().employees.get(employee_id).cloned()
    }

    /// Active employees of the company that match the scope and were
    /// employed at some point inside the window, sorted by id for
    /// deterministic processing order.
    pub fn employees_in_scope(
        &self,
        company_id: &str,
        scope: &RunScope,
        window_start: NaiveDate,
        window_end: NaiveDate,
    ) -> Vec<Employee> {
        let mut matched: Vec<Employee> = self
            .guard()
            .employees
            .values()
            .filter(|e| {
                e.company_id == company_id
                    && e.active
                    && e.employed_during(window_start, window_end)
                    && scope.matches(e)
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.id.cmp(&b.id));
        matched
    }

    /// Attendance rows for one employee inside the inclusive window.
    pub fn attendance_for(
        &self,
        employee_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<AttendanceDay> {
        self.guard()
            .attendance
            .iter()
            .filter(|a| a.employee_id == employee_id && a.date >= start && a.date <= end)
            .cloned()
            .collect()
    }

    /// All leave requests filed by one employee.
    pub fn leaves_for(&self, employee_id: &str) -> Vec<LeaveRequest> {
        self.guard()
            .leaves
            .iter()
            .filter(|l| l.employee_id == employee_id)
            .cloned()
            .collect()
    }

    /// All overtime requests filed by one employee.
    pub fn overtime_for(&self, employee_id: &str) -> Vec<OvertimeRequest> {
        self.guard()
            .overtime
            .iter()
            .filter(|o| o.employee_id == employee_id)
            .cloned()
            .collect()
    }

    /// All loans held by one employee.
    pub fn loans_for(&self, employee_id: &str) -> Vec<Loan> {
        self.guard()
            .loans
            .values()
            .filter(|l| l.employee_id == employee_id)
            .cloned()
            .collect()
    }

    /// Loan payments recorded by one run.
    pub fn loan_payments_for_run(&self, run_id: Uuid) -> Vec<LoanPayment> {
        self.guard()
            .loan_payments
            .iter()
            .filter(|p| p.run_id == run_id)
            .cloned()
            .collect()
    }

    /// Returns the loan with the given id.
    pub fn loan(&self, loan_id: Uuid) -> Option<Loan> {
        self.guard().loans.get(&loan_id).cloned()
    }

    // ---- runs ----

    /// The non-terminal run anchored to a period, if one exists.
    pub fn active_run_for(&self, period_id: &str) -> Option<PayrollRun> {
        self.guard()
            .runs
            .values()
            .find(|r| r.period_id == period_id && !r.status.is_terminal())
            .cloned()
    }

    /// Creates a run under the store lock. Re-checks the period guards so
    /// that two concurrent creates for the same period cannot both pass:
    /// the period must exist, must be open when `require_open_period` is
    /// set, and must have no other non-terminal run. Run numbers come from
    /// a per-year sequence and are never reused.
    pub fn create_run(
        &self,
        company_id: &str,
        period_id: &str,
        run_type: RunType,
        scope: RunScope,
        require_open_period: bool,
        created_at: DateTime<Utc>,
    ) -> EngineResult<PayrollRun> {
        let mut inner = self.guard();
        let period = inner
            .periods
            .get(period_id)
            .ok_or_else(|| EngineError::PeriodNotFound {
                period_id: period_id.to_string(),
            })?;
        if require_open_period && period.status != PeriodStatus::Open {
            return Err(EngineError::PeriodLocked {
                period_id: period_id.to_string(),
            });
        }
        let year = period.year;
        if let Some(existing) = inner
            .runs
            .values()
            .find(|r| r.period_id == period_id && !r.status.is_terminal())
        {
            return Err(EngineError::ActiveRunExists {
                period_id: period_id.to_string(),
                run_number: existing.run_number.clone(),
            });
        }
        let seq = inner.run_seq.entry(year).or_insert(0);
        *seq += 1;
        let run_number = format!("RUN-{year}-{seq:05}");
        let run = PayrollRun::new(
            Uuid::new_v4(),
            run_number,
            company_id.to_string(),
            period_id.to_string(),
            run_type,
            scope,
            year,
            created_at,
        );
        inner.runs.insert(run.id, run.clone());
        Ok(run)
    }

    /// Returns the run with the given id.
    pub fn run(&self, run_id: Uuid) -> Option<PayrollRun> {
        self.guard().runs.get(&run_id).cloned()
    }

    /// Compare-and-set on a run's status. Succeeds only when the current
    /// status is one of `expected`; returns the previous status on
    /// success, `None` when the run is missing or the status moved.
    pub fn update_run_status(
        &self,
        run_id: Uuid,
        expected: &[RunStatus],
        new_status: RunStatus,
    ) -> Option<RunStatus> {
        let mut inner = self.guard();
        let run = inner.runs.get_mut(&run_id)?;
        if !expected.contains(&run.status) {
            return None;
        }
        let previous = run.status;
        run.status = new_status;
        Some(previous)
    }

    /// Mutates a run in place under the store lock.
    pub fn with_run_mut<F>(&self, run_id: Uuid, apply: F) -> EngineResult<()>
    where
        F: FnOnce(&mut PayrollRun),
    {
        let mut inner = self.guard();
        match inner.runs.get_mut(&run_id) {
            Some(run) => {
                apply(run);
                Ok(())
            }
            None => Err(EngineError::RunNotFound { run_id }),
        }
    }

    /// Compare-and-set on a period's status.
    pub fn update_period_status(
        &self,
        period_id: &str,
        expected: PeriodStatus,
        new_status: PeriodStatus,
    ) -> bool {
        let mut inner = self.guard();
        match inner.periods.get_mut(period_id) {
            Some(period) if period.status == expected => {
                period.status = new_status;
                true
            }
            _ => false,
        }
    }

    // ---- payslips and adjustments ----

    /// Payslips belonging to a run, sorted by slip number.
    pub fn payslips_for_run(&self, run_id: Uuid) -> Vec<Payslip> {
        let mut slips: Vec<Payslip> = self
            .guard()
            .payslips
            .iter()
            .filter(|s| s.run_id == run_id)
            .cloned()
            .collect();
        slips.sort_by(|a, b| a.slip_number.cmp(&b.slip_number));
        slips
    }

    /// Records a manual adjustment.
    pub fn insert_adjustment(&self, entry: AdjustmentEntry) {
        self.guard().adjustments.push(entry);
    }

    /// Adjustments recorded against a run.
    pub fn adjustments_for_run(&self, run_id: Uuid) -> Vec<AdjustmentEntry> {
        self.guard()
            .adjustments
            .iter()
            .filter(|a| a.run_id == run_id)
            .cloned()
            .collect()
    }

    // ---- pay item registry ----

    /// Registers earning and deduction type codes for a company the first
    /// time a calculation emits them.
    pub fn ensure_type_codes<I>(&self, company_id: &str, codes: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.guard()
            .type_codes
            .entry(company_id.to_string())
            .or_default()
            .extend(codes);
    }

    /// Type codes registered for a company, sorted.
    pub fn registered_type_codes(&self, company_id: &str) -> Vec<String> {
        self.guard()
            .type_codes
            .get(company_id)
            .map(|codes| codes.iter().cloned().collect())
            .unwrap_or_default()
    }

    // ---- year-to-date ----

    /// Folds the employee's payslips from paid runs of the given year into
    /// a year-to-date snapshot. Basic pay accrues from regular runs only;
    /// bonus-run gross accrues as bonus pay. Pre-tax deductions exclude
    /// the mandatory contributions, which are tracked on their own fields.
    pub fn ytd_for(&self, employee_id: &str, year: i32) -> YtdSnapshot {
        let inner = self.guard();
        let mut ytd = YtdSnapshot::default();
        for slip in inner.payslips.iter().filter(|s| s.employee_id == employee_id) {
            let Some(run) = inner.runs.get(&slip.run_id) else {
                continue;
            };
            if run.year != year || run.status != RunStatus::Paid {
                continue;
            }
            ytd.gross_pay += slip.gross_pay;
            ytd.tax_withheld += slip.tax_withheld;
            ytd.sss_employee += slip.sss_employee;
            ytd.philhealth_employee += slip.philhealth_employee;
            ytd.pagibig_employee += slip.pagibig_employee;
            if run.run_type.is_bonus() {
                ytd.bonus_pay += slip.gross_pay;
            } else {
                ytd.regular_basic_pay += slip.basic_pay;
            }
            ytd.pre_tax_deductions += slip
                .deductions
                .iter()
                .filter(|d| d.pre_tax && d.source != DeductionSource::Government)
                .map(|d| d.amount)
                .sum::<Decimal>();
        }
        ytd
    }

    // ---- calculation commit ----

    /// Replaces a run's payslips and loan payments in one atomic unit.
    ///
    /// Loan applications are checked before anything is touched: an
    /// amortization already settled by a different run fails the whole
    /// commit and leaves the store unchanged. On success the run's prior
    /// payments are reversed (amortizations unmarked, balances restored),
    /// its prior payslips deleted, and the new payslips and payments
    /// written. Returns the created payments.
    pub fn commit_calculation(
        &self,
        commit: CalculationCommit,
    ) -> EngineResult<Vec<LoanPayment>> {
        let mut inner = self.guard();

        // Amortizations this run settled previously are reversed below,
        // so they count as available for re-application.
        let own_amortizations: HashSet<Uuid> = inner
            .loan_payments
            .iter()
            .filter(|p| p.run_id == commit.run_id)
            .map(|p| p.amortization_id)
            .collect();

        for application in &commit.loan_applications {
            let loan = inner.loans.get(&application.loan_id).ok_or_else(|| {
                EngineError::CalculationFailed {
                    run_number: commit.run_number.clone(),
                    message: format!("loan '{}' no longer exists", application.loan_id),
                }
            })?;
            let amortization = loan
                .amortizations
                .iter()
                .find(|a| a.id == application.amortization_id)
                .ok_or_else(|| EngineError::CalculationFailed {
                    run_number: commit.run_number.clone(),
                    message: format!(
                        "amortization '{}' no longer exists on loan '{}'",
                        application.amortization_id, application.loan_id
                    ),
                })?;
            if amortization.paid && !own_amortizations.contains(&amortization.id) {
                return Err(EngineError::CalculationFailed {
                    run_number: commit.run_number.clone(),
                    message: format!(
                        "amortization '{}' was already settled by another run",
                        amortization.id
                    ),
                });
            }
        }

        // Everything below is infallible; the commit cannot half-apply.
        let reversed: Vec<LoanPayment> = inner
            .loan_payments
            .iter()
            .filter(|p| p.run_id == commit.run_id)
            .cloned()
            .collect();
        inner.loan_payments.retain(|p| p.run_id != commit.run_id);
        for payment in reversed {
            if let Some(loan) = inner.loans.get_mut(&payment.loan_id) {
                if let Some(amortization) = loan
                    .amortizations
                    .iter_mut()
                    .find(|a| a.id == payment.amortization_id)
                {
                    amortization.paid = false;
                    amortization.paid_by_run = None;
                    amortization.payment_id = None;
                    loan.principal_balance += amortization.principal_portion;
                    loan.interest_balance += amortization.interest_portion;
                    loan.total_balance += amortization.amount;
                    loan.status = LoanStatus::Active;
                }
            }
        }

        inner.payslips.retain(|s| s.run_id != commit.run_id);
        inner.payslips.extend(commit.payslips);

        let mut payments = Vec::with_capacity(commit.loan_applications.len());
        for application in commit.loan_applications {
            let Some(loan) = inner.loans.get_mut(&application.loan_id) else {
                continue;
            };
            let payment = LoanPayment {
                id: Uuid::new_v4(),
                loan_id: application.loan_id,
                amortization_id: application.amortization_id,
                run_id: commit.run_id,
                employee_id: application.employee_id,
                amount: application.amount,
                paid_at: commit.paid_at,
            };
            if let Some(amortization) = loan
                .amortizations
                .iter_mut()
                .find(|a| a.id == application.amortization_id)
            {
                amortization.paid = true;
                amortization.paid_by_run = Some(commit.run_id);
                amortization.payment_id = Some(payment.id);
                loan.principal_balance =
                    (loan.principal_balance - amortization.principal_portion).max(Decimal::ZERO);
                loan.interest_balance =
                    (loan.interest_balance - amortization.interest_portion).max(Decimal::ZERO);
                loan.total_balance =
                    (loan.total_balance - amortization.amount).max(Decimal::ZERO);
                if loan.total_balance == Decimal::ZERO {
                    loan.status = LoanStatus::FullyPaid;
                }
            }
            inner.loan_payments.push(payment.clone());
            payments.push(payment);
        }

        Ok(payments)
    }
}
