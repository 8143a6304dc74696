//! Per-employee payslip composition.
//!
//! Pulls the calculation modules together in payslip order: earnings
//! first, then the taxable base, then deductions in precedence order.
//! Everything here is pure over its inputs; the engine gathers records
//! from the store and commits the results.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::calculation::{
    allocate_deductions, basic_pay, bonus_earning, employee_rates, holiday_premium_earnings,
    night_diff_earning, overtime_earnings, recurring_deduction_lines, recurring_earnings,
    statutory_contributions, summarize_attendance, withholding_tax, AllocationResult,
    AttendanceSummary, BasicPayResult, DeductionInputs, LoanApplication, StatutoryDiagnostics,
    StatutoryResult, TaxBasis,
};
use crate::config::{AttendancePolicy, StatutoryTableSet};
use crate::models::{
    slip_number, AdjustmentEntry, AttendanceDay, ContributionTiming, DeductionSource, Employee,
    Holiday, LeaveRequest, Loan, OvertimeRequest, PayBasis, PayPeriod, PayPeriodPattern,
    PayrollRun, Payslip, PayslipDeduction, PayslipEarning, YtdSnapshot,
};
use crate::rounding::round_currency;

/// Shared inputs for one calculation pass over a run.
pub(crate) struct ComputeContext<'a> {
    pub run: &'a PayrollRun,
    pub period: &'a PayPeriod,
    pub pattern: &'a PayPeriodPattern,
    pub tables: Option<&'a StatutoryTableSet>,
    pub attendance_policy: &'a AttendancePolicy,
    pub holidays: &'a [Holiday],
}

/// Records gathered for one employee before composition.
pub(crate) struct EmployeeInputs {
    pub attendance: Vec<AttendanceDay>,
    pub leaves: Vec<LeaveRequest>,
    pub overtime: Vec<OvertimeRequest>,
    pub loans: Vec<Loan>,
    pub adjustments: Vec<AdjustmentEntry>,
    pub ytd: YtdSnapshot,
}

/// One composed payslip plus the loan amortizations it decided to settle.
pub(crate) struct EmployeeSlip {
    pub payslip: Payslip,
    pub loan_applications: Vec<LoanApplication>,
}

/// Composes one employee's payslip, or `None` when the run type gates
/// the employee out (a thirteenth-month run and an unentitled employee).
pub(crate) fn compute_employee(
    ctx: &ComputeContext<'_>,
    employee: &Employee,
    inputs: &EmployeeInputs,
    diagnostics: &mut StatutoryDiagnostics,
) -> Option<EmployeeSlip> {
    let frequency = ctx.pattern.frequency;
    let half = ctx.period.half;
    let is_bonus = ctx.run.run_type.is_bonus();
    let rates = employee_rates(employee, frequency);

    // Bonus runs pay a single computed amount; the attendance ledger
    // only drives regular cutoffs.
    let summary = if is_bonus {
        AttendanceSummary::default()
    } else {
        summarize_attendance(
            employee,
            ctx.period.cutoff_start,
            ctx.period.cutoff_end,
            &inputs.attendance,
            &inputs.leaves,
            ctx.holidays,
        )
    };

    let mut earnings: Vec<PayslipEarning> = Vec::new();
    let mut basic = BasicPayResult {
        basic_pay: Decimal::ZERO,
        absence_deduction: Decimal::ZERO,
    };
    let mut bonus_pay = Decimal::ZERO;
    let mut overtime_hours = Decimal::ZERO;

    if is_bonus {
        let line = bonus_earning(
            ctx.run.run_type,
            employee,
            inputs.ytd.regular_basic_pay,
            ctx.run.year,
        )?;
        bonus_pay = line.amount;
        earnings.push(line);
    } else {
        basic = basic_pay(employee, &rates, &summary);
        let (quantity, rate) = match employee.pay_basis {
            PayBasis::Daily { .. } => (Some(summary.payable_days), Some(rates.daily_rate)),
            PayBasis::Monthly { .. } => (None, None),
        };
        earnings.push(PayslipEarning {
            type_code: "BASIC".to_string(),
            description: "Basic Pay".to_string(),
            quantity,
            rate,
            amount: basic.basic_pay,
        });
        if let Some(tables) = ctx.tables {
            earnings.extend(holiday_premium_earnings(
                &summary,
                rates.daily_rate,
                &tables.holiday,
            ));
            earnings.extend(night_diff_earning(
                employee,
                &summary,
                rates.hourly_rate,
                tables.night_diff_rate,
            ));
            let overtime_lines = overtime_earnings(
                employee,
                ctx.period.cutoff_start,
                ctx.period.cutoff_end,
                &inputs.overtime,
                ctx.holidays,
                rates.hourly_rate,
                &tables.overtime,
            );
            overtime_hours = overtime_lines.iter().filter_map(|l| l.quantity).sum();
            earnings.extend(overtime_lines);
        }
        earnings.extend(recurring_earnings(employee, frequency, half, &summary));
    }

    for adjustment in inputs.adjustments.iter().filter(|a| a.earning) {
        earnings.push(PayslipEarning {
            type_code: "ADJUSTMENT".to_string(),
            description: adjustment.description.clone(),
            quantity: None,
            rate: None,
            amount: round_currency(adjustment.amount),
        });
    }

    let gross_pay = round_currency(earnings.iter().map(|e| e.amount).sum());

    let statutory = if is_bonus {
        StatutoryResult::default()
    } else {
        statutory_contributions(
            ctx.tables,
            rates.monthly_base,
            &ctx.pattern.schedule,
            frequency,
            half,
            diagnostics,
        )
    };

    let recurring = if is_bonus {
        Vec::new()
    } else {
        recurring_deduction_lines(employee, frequency, half)
    };
    let adjustment_deductions: Vec<PayslipDeduction> = inputs
        .adjustments
        .iter()
        .filter(|a| !a.earning)
        .map(|a| PayslipDeduction {
            type_code: "ADJUSTMENT".to_string(),
            description: a.description.clone(),
            amount: round_currency(a.amount),
            employer_share: None,
            source: DeductionSource::Adjustment,
            reference_id: Some(a.id.to_string()),
            pre_tax: a.pre_tax,
        })
        .collect();
    let pre_tax_deductions: Decimal = recurring
        .iter()
        .chain(adjustment_deductions.iter())
        .filter(|d| d.pre_tax)
        .map(|d| d.amount)
        .sum();

    let basis = TaxBasis {
        gross_pay,
        mandatory_deductions: statutory.employee_total(),
        pre_tax_deductions,
        bonus_pay,
        ytd: inputs.ytd.clone(),
    };
    let tax_withheld = if is_bonus {
        // Bonus pay is withheld through the annualized (or substituted)
        // path only; the per-period table is sized for salary cutoffs.
        match ctx.tables {
            Some(t) if employee.substituted_filing || !t.annual_tax.is_empty() => withholding_tax(
                ctx.tables,
                employee,
                ContributionTiming::EveryPeriod,
                frequency,
                half,
                &basis,
                diagnostics,
            ),
            _ => Decimal::ZERO,
        }
    } else {
        withholding_tax(
            ctx.tables,
            employee,
            ctx.pattern.schedule.withholding_tax,
            frequency,
            half,
            &basis,
            diagnostics,
        )
    };

    let AllocationResult {
        deductions,
        total_deductions,
        net_pay,
        loan_applications,
    } = allocate_deductions(DeductionInputs {
        gross_pay,
        hourly_rate: rates.hourly_rate,
        tardiness_mins: summary.tardiness_mins,
        undertime_mins: summary.undertime_mins,
        attendance_policy: ctx.attendance_policy,
        statutory: &statutory,
        tax_withheld,
        recurring,
        adjustments: adjustment_deductions,
        loans: &inputs.loans,
        cutoff_end: ctx.period.cutoff_end,
    });

    let ytd = YtdSnapshot {
        gross_pay: inputs.ytd.gross_pay + gross_pay,
        regular_basic_pay: inputs.ytd.regular_basic_pay
            + if is_bonus { Decimal::ZERO } else { basic.basic_pay },
        bonus_pay: inputs.ytd.bonus_pay + bonus_pay,
        tax_withheld: inputs.ytd.tax_withheld + tax_withheld,
        sss_employee: inputs.ytd.sss_employee + statutory.sss.employee,
        philhealth_employee: inputs.ytd.philhealth_employee + statutory.philhealth.employee,
        pagibig_employee: inputs.ytd.pagibig_employee + statutory.pagibig.employee,
        pre_tax_deductions: inputs.ytd.pre_tax_deductions + pre_tax_deductions,
    };

    let payslip = Payslip {
        id: Uuid::new_v4(),
        slip_number: slip_number(&ctx.run.run_number, &employee.id),
        run_id: ctx.run.id,
        employee_id: employee.id.clone(),
        daily_rate: rates.daily_rate,
        hourly_rate: rates.hourly_rate,
        working_days: summary.working_days,
        payable_days: summary.payable_days,
        unpaid_absences: summary.unpaid_absences,
        tardiness_mins: summary.tardiness_mins,
        undertime_mins: summary.undertime_mins,
        hours_worked: summary.hours_worked,
        overtime_hours,
        night_diff_hours: summary.night_diff_hours,
        basic_pay: basic.basic_pay,
        gross_pay,
        total_deductions,
        net_pay,
        sss_employee: statutory.sss.employee,
        philhealth_employee: statutory.philhealth.employee,
        pagibig_employee: statutory.pagibig.employee,
        tax_withheld,
        sss_employer: statutory.sss.employer,
        philhealth_employer: statutory.philhealth.employer,
        pagibig_employer: statutory.pagibig.employer,
        ytd,
        earnings,
        deductions,
    };

    Some(EmployeeSlip {
        payslip,
        loan_applications,
    })
}
