//! Statutory contribution computation: SSS, PhilHealth, and Pag-IBIG.
//!
//! Contributions are looked up from the effective table set by the
//! employee's monthly base salary and gated by the pattern's timing
//! schedule. Missing tables and unmatched brackets are never errors: the
//! contribution computes as zero and the diagnostics counters record why.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::calculation::timing::timing_applies;
use crate::config::StatutoryTableSet;
use crate::models::{ContributionSchedule, ContributionTiming, PayFrequency, PeriodHalf};
use crate::rounding::round_currency;

/// Employee and employer shares of one statutory item.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ContributionShares {
    /// Share withheld from the employee.
    pub employee: Decimal,
    /// Share funded by the employer.
    pub employer: Decimal,
}

impl ContributionShares {
    /// Whether both shares are zero.
    pub fn is_zero(&self) -> bool {
        self.employee == Decimal::ZERO && self.employer == Decimal::ZERO
    }
}

/// Counters describing what the statutory and tax passes did, and why
/// items that produced nothing produced nothing.
///
/// Accumulated across every employee of a calculation pass and surfaced in
/// the calculate summary and validation report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatutoryDiagnostics {
    /// SSS contributions computed from a bracket.
    pub sss_applied: u32,
    /// SSS skipped by the timing schedule.
    pub sss_skipped_by_timing: u32,
    /// SSS due but no bracket (or no table set) matched the salary.
    pub sss_no_bracket: u32,
    /// PhilHealth premiums computed.
    pub philhealth_applied: u32,
    /// PhilHealth skipped by the timing schedule.
    pub philhealth_skipped_by_timing: u32,
    /// PhilHealth due but no premium table was configured.
    pub philhealth_no_table: u32,
    /// Pag-IBIG contributions computed from a bracket.
    pub pagibig_applied: u32,
    /// Pag-IBIG skipped by the timing schedule.
    pub pagibig_skipped_by_timing: u32,
    /// Pag-IBIG due but no bracket (or no table set) matched the salary.
    pub pagibig_no_bracket: u32,
    /// Withholding tax computed.
    pub tax_applied: u32,
    /// Withholding tax skipped by the timing schedule.
    pub tax_skipped_by_timing: u32,
    /// Withholding tax due but no bracket table covered the income.
    pub tax_no_bracket: u32,
}

/// The three mandatory contribution shares for one employee and period.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatutoryResult {
    /// Social Security System shares.
    pub sss: ContributionShares,
    /// PhilHealth shares.
    pub philhealth: ContributionShares,
    /// Pag-IBIG (HDMF) shares.
    pub pagibig: ContributionShares,
}

impl StatutoryResult {
    /// Total withheld from the employee across the three items.
    pub fn employee_total(&self) -> Decimal {
        self.sss.employee + self.philhealth.employee + self.pagibig.employee
    }

    /// Total funded by the employer across the three items.
    pub fn employer_total(&self) -> Decimal {
        self.sss.employer + self.philhealth.employer + self.pagibig.employer
    }
}

/// Computes the statutory contribution shares for one employee.
///
/// `monthly_salary` is the monthly base (daily-rated staff are converted
/// upstream). `tables` is the effective table set for the cutoff, absent
/// when no set covers it.
pub fn statutory_contributions(
    tables: Option<&StatutoryTableSet>,
    monthly_salary: Decimal,
    schedule: &ContributionSchedule,
    frequency: PayFrequency,
    half: PeriodHalf,
    diagnostics: &mut StatutoryDiagnostics,
) -> StatutoryResult {
    StatutoryResult {
        sss: sss_shares(tables, monthly_salary, schedule.sss, frequency, half, diagnostics),
        philhealth: philhealth_shares(
            tables,
            monthly_salary,
            schedule.philhealth,
            frequency,
            half,
            diagnostics,
        ),
        pagibig: pagibig_shares(
            tables,
            monthly_salary,
            schedule.pagibig,
            frequency,
            half,
            diagnostics,
        ),
    }
}

fn sss_shares(
    tables: Option<&StatutoryTableSet>,
    monthly_salary: Decimal,
    timing: ContributionTiming,
    frequency: PayFrequency,
    half: PeriodHalf,
    diagnostics: &mut StatutoryDiagnostics,
) -> ContributionShares {
    if !timing_applies(timing, frequency, half) {
        diagnostics.sss_skipped_by_timing += 1;
        return ContributionShares::default();
    }
    match tables.and_then(|t| t.sss_bracket_for(monthly_salary)) {
        Some(bracket) => {
            diagnostics.sss_applied += 1;
            ContributionShares {
                employee: round_currency(bracket.employee_share),
                employer: round_currency(bracket.employer_share),
            }
        }
        None => {
            diagnostics.sss_no_bracket += 1;
            ContributionShares::default()
        }
    }
}

fn philhealth_shares(
    tables: Option<&StatutoryTableSet>,
    monthly_salary: Decimal,
    timing: ContributionTiming,
    frequency: PayFrequency,
    half: PeriodHalf,
    diagnostics: &mut StatutoryDiagnostics,
) -> ContributionShares {
    if !timing_applies(timing, frequency, half) {
        diagnostics.philhealth_skipped_by_timing += 1;
        return ContributionShares::default();
    }
    match tables.and_then(|t| t.philhealth.as_ref()) {
        Some(table) => {
            diagnostics.philhealth_applied += 1;
            let clamped = monthly_salary
                .max(table.monthly_floor)
                .min(table.monthly_ceiling);
            let premium = clamped * table.premium_rate;
            ContributionShares {
                employee: round_currency(premium * table.employee_pct),
                employer: round_currency(premium * table.employer_pct),
            }
        }
        None => {
            diagnostics.philhealth_no_table += 1;
            ContributionShares::default()
        }
    }
}

fn pagibig_shares(
    tables: Option<&StatutoryTableSet>,
    monthly_salary: Decimal,
    timing: ContributionTiming,
    frequency: PayFrequency,
    half: PeriodHalf,
    diagnostics: &mut StatutoryDiagnostics,
) -> ContributionShares {
    if !timing_applies(timing, frequency, half) {
        diagnostics.pagibig_skipped_by_timing += 1;
        return ContributionShares::default();
    }
    match tables.and_then(|t| t.pagibig_bracket_for(monthly_salary)) {
        Some(bracket) => {
            diagnostics.pagibig_applied += 1;
            ContributionShares {
                employee: round_currency(bracket.employee_share),
                employer: round_currency(bracket.employer_share),
            }
        }
        None => {
            diagnostics.pagibig_no_bracket += 1;
            ContributionShares::default()
        }
    }
}
