//! Withholding tax computation.
//!
//! Three paths, in precedence order: substituted-filing employees withhold
//! a flat rate of the period's taxable base; everyone else goes through
//! the annualized cumulative method when an annual bracket table exists;
//! otherwise a per-period bracket table is applied to the unprojected
//! base. The annualized method taxes actual cumulative income, so
//! withholding self-corrects across the year and never goes negative.

use rust_decimal::Decimal;

use crate::calculation::statutory::StatutoryDiagnostics;
use crate::calculation::timing::timing_applies;
use crate::config::{StatutoryTableSet, TaxBracket};
use crate::models::{ContributionTiming, Employee, PayFrequency, PeriodHalf, YtdSnapshot};
use crate::rounding::round_currency;

/// The period amounts the withholding computation works from.
#[derive(Debug, Clone, Default)]
pub struct TaxBasis {
    /// Gross pay of the period being computed.
    pub gross_pay: Decimal,
    /// Mandatory employee contribution shares of the period.
    pub mandatory_deductions: Decimal,
    /// Pre-tax recurring and adjustment deductions of the period.
    pub pre_tax_deductions: Decimal,
    /// Bonus earnings of the period, subject to the exclusion ceiling.
    pub bonus_pay: Decimal,
    /// Year-to-date figures from prior paid runs.
    pub ytd: YtdSnapshot,
}

impl TaxBasis {
    /// The period's taxable base, floored at zero.
    pub fn taxable_now(&self) -> Decimal {
        (self.gross_pay - self.mandatory_deductions - self.pre_tax_deductions)
            .max(Decimal::ZERO)
    }
}

/// Progressive bracket lookup: `baseTax + (income - over) x rate` for the
/// bracket whose range covers `income`, `None` when no bracket does.
pub fn bracket_tax(brackets: &[TaxBracket], income: Decimal) -> Option<Decimal> {
    brackets
        .iter()
        .find(|b| b.over <= income && b.up_to.is_none_or(|cap| income <= cap))
        .map(|b| b.base_tax + (income - b.over) * b.rate)
}

/// Computes the withholding tax for one employee and period.
pub fn withholding_tax(
    tables: Option<&StatutoryTableSet>,
    employee: &Employee,
    timing: ContributionTiming,
    frequency: PayFrequency,
    half: PeriodHalf,
    basis: &TaxBasis,
    diagnostics: &mut StatutoryDiagnostics,
) -> Decimal {
    if !timing_applies(timing, frequency, half) {
        diagnostics.tax_skipped_by_timing += 1;
        return Decimal::ZERO;
    }
    let Some(tables) = tables else {
        diagnostics.tax_no_bracket += 1;
        return Decimal::ZERO;
    };

    if employee.substituted_filing {
        diagnostics.tax_applied += 1;
        return round_currency(basis.taxable_now() * tables.substituted_filing_rate);
    }

    if !tables.annual_tax.is_empty() {
        return annualized_withholding(tables, basis, diagnostics);
    }

    match bracket_tax(&tables.period_tax, basis.taxable_now()) {
        Some(due) => {
            diagnostics.tax_applied += 1;
            round_currency(due)
        }
        None => {
            diagnostics.tax_no_bracket += 1;
            Decimal::ZERO
        }
    }
}

/// Annualized cumulative withholding: tax the year's actual taxable income
/// to date through the annual table, then withhold the portion not yet
/// withheld.
fn annualized_withholding(
    tables: &StatutoryTableSet,
    basis: &TaxBasis,
    diagnostics: &mut StatutoryDiagnostics,
) -> Decimal {
    let gross = basis.ytd.gross_pay + basis.gross_pay;
    let bonus = basis.ytd.bonus_pay + basis.bonus_pay;
    let excluded_bonus = bonus.min(tables.bonus_exclusion_ceiling);
    let mandatory = basis.ytd.mandatory_employee_total() + basis.mandatory_deductions;
    let pre_tax = basis.ytd.pre_tax_deductions + basis.pre_tax_deductions;

    let taxable = (gross - excluded_bonus - mandatory - pre_tax).max(Decimal::ZERO);
    match bracket_tax(&tables.annual_tax, taxable) {
        Some(annual_due) => {
            diagnostics.tax_applied += 1;
            (round_currency(annual_due) - basis.ytd.tax_withheld).max(Decimal::ZERO)
        }
        None => {
            diagnostics.tax_no_bracket += 1;
            Decimal::ZERO
        }
    }
}
