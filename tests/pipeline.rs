//! End-to-end pipeline tests for the Payroll Run Calculation Engine.
//!
//! These tests drive the engine with the shipped `config/ph2025` data set
//! and cover the scenarios that cross module boundaries:
//! - Recalculation idempotence (amounts identical across passes)
//! - Conservation of gross and net across payslip lines
//! - Loan capacity gating and payment reversal on recalculation
//! - Contribution timing policies over semi-monthly halves
//! - Absence deductions against the derived daily rate
//! - Year-to-date accumulation across closed runs
//! - Concurrent close requests resolving to a single transition

use chrono::{Datelike, NaiveDate, Weekday};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;

use payroll_engine::config::ConfigLoader;
use payroll_engine::engine::{
    AdjustmentInput, AllowAll, CloseOutcome, CreateRunInput, MemoryAuditSink, PayrollEngine,
};
use payroll_engine::models::{
    AttendanceDay, ContributionSchedule, ContributionTiming, Employee, Holiday, HolidayKind,
    Loan, LoanAmortization, LoanStatus, PayBasis, PayFrequency, PayPeriod, PayPeriodPattern,
    PeriodHalf, PeriodStatus, RunScope, RunType, WorkSchedule,
};
use uuid::Uuid;

// =============================================================================
// Test Helpers
// =============================================================================

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn create_engine() -> (PayrollEngine, Arc<MemoryAuditSink>) {
    let config = ConfigLoader::load("./config/ph2025").expect("Failed to load config");
    let sink = Arc::new(MemoryAuditSink::new());
    let engine =
        PayrollEngine::with_seams(config.config().clone(), Arc::new(AllowAll), sink.clone());
    (engine, sink)
}

fn seed_pattern(engine: &PayrollEngine, schedule: ContributionSchedule) {
    engine.store().insert_pattern(PayPeriodPattern {
        id: "PAT-SM".to_string(),
        company_id: "PH-ACME".to_string(),
        frequency: PayFrequency::SemiMonthly,
        schedule,
    });
}

fn seed_period(engine: &PayrollEngine, id: &str, start: NaiveDate, end: NaiveDate, half: PeriodHalf) {
    engine.store().insert_period(PayPeriod {
        id: id.to_string(),
        pattern_id: "PAT-SM".to_string(),
        cutoff_start: start,
        cutoff_end: end,
        year: start.year(),
        half,
        working_days: None,
        status: PeriodStatus::Open,
    });
}

fn monthly_employee(id: &str, monthly_salary: &str) -> Employee {
    Employee {
        id: id.to_string(),
        company_id: "PH-ACME".to_string(),
        department_id: None,
        branch_id: None,
        pay_basis: PayBasis::Monthly {
            monthly_salary: dec(monthly_salary),
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

fn seed_attendance(engine: &PayrollEngine, employee_id: &str, days: &[u32]) {
    for day in days {
        engine.store().insert_attendance(AttendanceDay {
            employee_id: employee_id.to_string(),
            date: date(2025, 1, *day),
            tardiness_mins: Decimal::ZERO,
            undertime_mins: Decimal::ZERO,
            hours_worked: dec("8"),
            night_diff_hours: Decimal::ZERO,
            remarks: None,
        });
    }
}

/// Working days of Jan 1-15, 2025, excluding the New Year holiday.
const FIRST_HALF_WORKDAYS: [u32; 10] = [2, 3, 6, 7, 8, 9, 10, 13, 14, 15];

/// Engine seeded with the standard first-half scenario: one 30000/month
/// employee in full attendance, Jan 1 a regular holiday.
fn seeded_engine(schedule: ContributionSchedule) -> (PayrollEngine, Arc<MemoryAuditSink>) {
    let (engine, sink) = create_engine();
    seed_pattern(&engine, schedule);
    seed_period(&engine, "2025-01-A", date(2025, 1, 1), date(2025, 1, 15), PeriodHalf::First);
    engine.store().insert_holiday(Holiday {
        date: date(2025, 1, 1),
        name: "New Year's Day".to_string(),
        kind: HolidayKind::Regular,
    });
    engine
        .store()
        .insert_employee(monthly_employee("EMP-0100", "30000"));
    seed_attendance(&engine, "EMP-0100", &FIRST_HALF_WORKDAYS);
    (engine, sink)
}

fn regular_input(period_id: &str) -> CreateRunInput {
    CreateRunInput {
        company_id: "PH-ACME".to_string(),
        period_id: period_id.to_string(),
        run_type: RunType::Regular,
        scope: RunScope::default(),
    }
}

fn loan(employee_id: &str, amount: &str, due: NaiveDate) -> Loan {
    Loan {
        id: Uuid::new_v4(),
        employee_id: employee_id.to_string(),
        description: "SSS Salary Loan".to_string(),
        principal_balance: dec(amount) * dec("3"),
        interest_balance: Decimal::ZERO,
        total_balance: dec(amount) * dec("3"),
        deduction_priority: 1,
        status: LoanStatus::Active,
        amortizations: (0..3)
            .map(|i| LoanAmortization {
                id: Uuid::new_v4(),
                due_date: due + chrono::Months::new(i),
                amount: dec(amount),
                principal_portion: dec(amount),
                interest_portion: Decimal::ZERO,
                paid: false,
                paid_by_run: None,
                payment_id: None,
            })
            .collect(),
    }
}

// =============================================================================
// Standard semi-monthly scenario
// =============================================================================

#[test]
fn test_standard_semi_monthly_slip() {
    let (engine, _) = seeded_engine(ContributionSchedule::default());
    let run = engine.create_run("system", regular_input("2025-01-A")).unwrap();
    engine.validate_run("system", run.id).unwrap();
    let summary = engine.calculate_run("system", run.id).unwrap();

    assert_eq!(summary.processed_count, 1);
    assert_eq!(summary.totals.gross_pay, dec("15000.00"));
    assert_eq!(summary.totals.net_pay, dec("12550.00"));

    let slips = engine.payslips_for_run(run.id).unwrap();
    let slip = &slips[0];
    assert_eq!(slip.slip_number, "PSL-00001-EMP-0100");
    // 30000 x 12 / 365, at 4 dp.
    assert_eq!(slip.daily_rate, dec("986.3014"));
    assert_eq!(slip.basic_pay, dec("15000.00"));
    assert_eq!(slip.sss_employee, dec("1500.00"));
    assert_eq!(slip.philhealth_employee, dec("750.00"));
    assert_eq!(slip.pagibig_employee, dec("200.00"));
    // Cumulative annual taxable is far inside the zero-rate bracket.
    assert_eq!(slip.tax_withheld, dec("0.00"));
    assert_eq!(slip.net_pay, dec("12550.00"));
    assert_eq!(summary.diagnostics.sss_applied, 1);
    assert_eq!(summary.diagnostics.tax_applied, 1);
}

#[test]
fn test_unpaid_absences_deduct_at_daily_rate() {
    let (engine, _) = create_engine();
    seed_pattern(&engine, ContributionSchedule::default());
    seed_period(&engine, "2025-01-A", date(2025, 1, 1), date(2025, 1, 15), PeriodHalf::First);
    engine.store().insert_holiday(Holiday {
        date: date(2025, 1, 1),
        name: "New Year's Day".to_string(),
        kind: HolidayKind::Regular,
    });
    // 30416.6667 monthly gives a clean 1000.0000 daily rate.
    engine
        .store()
        .insert_employee(monthly_employee("EMP-0200", "30416.6667"));
    // Present on every working day except Jan 14 and 15.
    seed_attendance(&engine, "EMP-0200", &[2, 3, 6, 7, 8, 9, 10, 13]);

    let run = engine.create_run("system", regular_input("2025-01-A")).unwrap();
    engine.validate_run("system", run.id).unwrap();
    engine.calculate_run("system", run.id).unwrap();

    let slips = engine.payslips_for_run(run.id).unwrap();
    let slip = &slips[0];
    assert_eq!(slip.daily_rate, dec("1000.0000"));
    assert_eq!(slip.unpaid_absences, dec("2"));
    // 15208.33 period base less 2 x 1000.
    assert_eq!(slip.basic_pay, dec("13208.33"));
    assert_eq!(slip.gross_pay, dec("13208.33"));
    assert_eq!(slip.sss_employee, dec("1500.00"));
    assert_eq!(slip.philhealth_employee, dec("760.42"));
    assert_eq!(slip.pagibig_employee, dec("200.00"));
    assert_eq!(slip.net_pay, dec("10747.91"));
}

// =============================================================================
// Recalculation idempotence and conservation
// =============================================================================

#[test]
fn test_recalculation_reproduces_identical_amounts() {
    let (engine, _) = seeded_engine(ContributionSchedule::default());
    engine
        .store()
        .insert_loan(loan("EMP-0100", "2000", date(2025, 1, 15)));

    let run = engine.create_run("system", regular_input("2025-01-A")).unwrap();
    engine.validate_run("system", run.id).unwrap();

    engine.calculate_run("system", run.id).unwrap();
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

    let first = engine.calculate_run("system", run.id).unwrap();
    let first_slips = engine.payslips_for_run(run.id).unwrap();
    let second = engine.calculate_run("system", run.id).unwrap();
    let second_slips = engine.payslips_for_run(run.id).unwrap();

    assert_eq!(first.totals, second.totals);
    assert_eq!(first_slips.len(), second_slips.len());
    for (a, b) in first_slips.iter().zip(second_slips.iter()) {
        // Slip identifiers are regenerated; everything payable must not be.
        assert_eq!(a.slip_number, b.slip_number);
        assert_eq!(a.gross_pay, b.gross_pay);
        assert_eq!(a.total_deductions, b.total_deductions);
        assert_eq!(a.net_pay, b.net_pay);
        assert_eq!(a.earnings, b.earnings);
        assert_eq!(a.deductions, b.deductions);
        assert_eq!(a.ytd, b.ytd);
    }
}

#[test]
fn test_gross_and_net_conserve_across_lines() {
    let (engine, _) = seeded_engine(ContributionSchedule::default());
    engine
        .store()
        .insert_loan(loan("EMP-0100", "2000", date(2025, 1, 15)));

    let run = engine.create_run("system", regular_input("2025-01-A")).unwrap();
    engine.validate_run("system", run.id).unwrap();
    engine.calculate_run("system", run.id).unwrap();
    engine
        .add_adjustment(
            "system",
            run.id,
            AdjustmentInput {
                employee_id: "EMP-0100".to_string(),
                description: "Equipment charge".to_string(),
                amount: dec("500"),
                earning: false,
                pre_tax: false,
            },
        )
        .unwrap();
    engine.calculate_run("system", run.id).unwrap();

    let slips = engine.payslips_for_run(run.id).unwrap();
    for slip in &slips {
        let earned: Decimal = slip.earnings.iter().map(|e| e.amount).sum();
        let deducted: Decimal = slip.deductions.iter().map(|d| d.amount).sum();
        assert_eq!(slip.gross_pay, earned);
        assert_eq!(slip.total_deductions, deducted);
        assert_eq!(slip.net_pay, slip.gross_pay - slip.total_deductions);
        assert!(slip.net_pay >= Decimal::ZERO);
    }
}

// =============================================================================
// Loans
// =============================================================================

#[test]
fn test_loan_applies_once_across_recalculations() {
    let (engine, _) = seeded_engine(ContributionSchedule::default());
    let employee_loan = loan("EMP-0100", "2000", date(2025, 1, 15));
    let loan_id = employee_loan.id;
    engine.store().insert_loan(employee_loan);

    let run = engine.create_run("system", regular_input("2025-01-A")).unwrap();
    engine.validate_run("system", run.id).unwrap();
    engine.calculate_run("system", run.id).unwrap();
    engine.calculate_run("system", run.id).unwrap();

    // The second pass reversed the first pass's payment before reapplying.
    let payments = engine.store().loan_payments_for_run(run.id);
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].amount, dec("2000.00"));

    let updated = engine.store().loan(loan_id).unwrap();
    assert_eq!(updated.total_balance, dec("4000"));
    assert_eq!(
        updated.amortizations.iter().filter(|a| a.paid).count(),
        1
    );

    let slips = engine.payslips_for_run(run.id).unwrap();
    assert_eq!(slips[0].net_pay, dec("10550.00"));
}

#[test]
fn test_oversized_loan_defers_and_net_stays_positive() {
    let (engine, _) = seeded_engine(ContributionSchedule::default());
    // Remaining capacity after statutory lines is 12550; this cannot fit.
    engine
        .store()
        .insert_loan(loan("EMP-0100", "13000", date(2025, 1, 15)));

    let run = engine.create_run("system", regular_input("2025-01-A")).unwrap();
    engine.validate_run("system", run.id).unwrap();
    engine.calculate_run("system", run.id).unwrap();

    assert!(engine.store().loan_payments_for_run(run.id).is_empty());
    let slips = engine.payslips_for_run(run.id).unwrap();
    assert!(slips[0].deductions.iter().all(|d| d.type_code != "LOAN"));
    assert_eq!(slips[0].net_pay, dec("12550.00"));
}

// =============================================================================
// Contribution timing
// =============================================================================

#[test]
fn test_second_half_sss_skips_the_first_cutoff() {
    let schedule = ContributionSchedule {
        sss: ContributionTiming::SecondHalf,
        ..ContributionSchedule::default()
    };
    let (engine, _) = seeded_engine(schedule);

    let run = engine.create_run("system", regular_input("2025-01-A")).unwrap();
    engine.validate_run("system", run.id).unwrap();
    let summary = engine.calculate_run("system", run.id).unwrap();

    assert_eq!(summary.diagnostics.sss_skipped_by_timing, 1);
    assert_eq!(summary.diagnostics.sss_applied, 0);
    assert_eq!(summary.diagnostics.philhealth_applied, 1);

    let slips = engine.payslips_for_run(run.id).unwrap();
    let slip = &slips[0];
    assert_eq!(slip.sss_employee, Decimal::ZERO);
    assert!(slip.deductions.iter().all(|d| d.type_code != "SSS"));
    // 15000 less PhilHealth 750 and Pag-IBIG 200, no tax due.
    assert_eq!(slip.net_pay, dec("14050.00"));
}

#[test]
fn test_disabled_timing_produces_no_statutory_or_tax_lines() {
    let schedule = ContributionSchedule {
        sss: ContributionTiming::Disabled,
        philhealth: ContributionTiming::Disabled,
        pagibig: ContributionTiming::Disabled,
        withholding_tax: ContributionTiming::Disabled,
    };
    let (engine, _) = seeded_engine(schedule);

    let run = engine.create_run("system", regular_input("2025-01-A")).unwrap();
    engine.validate_run("system", run.id).unwrap();
    let summary = engine.calculate_run("system", run.id).unwrap();

    assert_eq!(summary.diagnostics.sss_skipped_by_timing, 1);
    assert_eq!(summary.diagnostics.tax_skipped_by_timing, 1);

    let slips = engine.payslips_for_run(run.id).unwrap();
    assert!(slips[0].deductions.is_empty());
    assert_eq!(slips[0].net_pay, dec("15000.00"));
}

// =============================================================================
// Cross-run accumulation
// =============================================================================

#[test]
fn test_ytd_accumulates_across_closed_runs() {
    let (engine, _) = seeded_engine(ContributionSchedule::default());
    seed_period(&engine, "2025-01-B", date(2025, 1, 16), date(2025, 1, 31), PeriodHalf::Second);
    for day in [16, 17, 20, 21, 22, 23, 24, 27, 28, 29, 30, 31] {
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

    let first = engine.create_run("system", regular_input("2025-01-A")).unwrap();
    engine.validate_run("system", first.id).unwrap();
    engine.calculate_run("system", first.id).unwrap();
    engine.complete_review("system", first.id).unwrap();
    engine.generate_payslips("system", first.id).unwrap();
    engine.close_run("system", first.id).unwrap();

    // Closing the first run locked the period; the second period is its
    // own window and cuts the next sequential run.
    let second = engine.create_run("system", regular_input("2025-01-B")).unwrap();
    assert_eq!(second.run_number, "RUN-2025-00002");
    engine.validate_run("system", second.id).unwrap();
    engine.calculate_run("system", second.id).unwrap();

    let slips = engine.payslips_for_run(second.id).unwrap();
    let slip = &slips[0];
    assert_eq!(slip.slip_number, "PSL-00002-EMP-0100");
    // First half folded into the snapshot before this period was added.
    assert_eq!(slip.ytd.gross_pay, dec("30000.00"));
    assert_eq!(slip.ytd.sss_employee, dec("3000.00"));
}

// =============================================================================
// Concurrency
// =============================================================================

#[test]
fn test_concurrent_close_transitions_exactly_once() {
    let (engine, sink) = seeded_engine(ContributionSchedule::default());
    let run = engine.create_run("system", regular_input("2025-01-A")).unwrap();
    engine.validate_run("system", run.id).unwrap();
    engine.calculate_run("system", run.id).unwrap();
    engine.complete_review("system", run.id).unwrap();
    engine.generate_payslips("system", run.id).unwrap();

    let engine = Arc::new(engine);
    let run_id = run.id;
    let handles: Vec<_> = (0..2)
        .map(|_| {
            let engine = engine.clone();
            std::thread::spawn(move || engine.close_run("system", run_id))
        })
        .collect();
    let outcomes: Vec<CloseOutcome> = handles
        .into_iter()
        .map(|h| h.join().unwrap().unwrap())
        .collect();

    assert_eq!(
        outcomes
            .iter()
            .filter(|o| **o == CloseOutcome::Closed)
            .count(),
        1
    );
    assert_eq!(sink.count_for("close"), 1);
}
