//! Configuration types for statutory tables and company payroll policy.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files. Statutory tables are
//! versioned by effective date; the engine fetches the set in force at a
//! period's cutoff end on every calculation, never caching across runs.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::models::OvertimeKind;

/// Basis for tardiness/undertime deduction amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceDeductionBasis {
    /// Minutes deduct at the per-minute share of the hourly rate.
    PerMinute,
    /// Minutes are recorded but never deducted.
    None,
}

/// Company policy for attendance-derived pay deductions.
#[derive(Debug, Clone, Deserialize)]
pub struct AttendancePolicy {
    /// How tardiness and undertime minutes turn into deductions.
    pub deduction_basis: AttendanceDeductionBasis,
}

/// Company identity and policy, from `company.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct CompanyPolicy {
    /// The company identifier runs and employees are keyed by.
    pub company_id: String,
    /// Display name.
    pub company_name: String,
    /// Attendance deduction policy.
    pub attendance: AttendancePolicy,
}

/// One salary-range row of the SSS contribution table.
///
/// Shares are read directly from the bracket; nothing is recomputed from
/// a rate.
#[derive(Debug, Clone, Deserialize)]
pub struct SssBracket {
    /// Lower bound of the monthly salary range (inclusive).
    pub min_salary: Decimal,
    /// Upper bound of the range (inclusive); absent on the top bracket.
    #[serde(default)]
    pub max_salary: Option<Decimal>,
    /// Employee share for this range.
    pub employee_share: Decimal,
    /// Employer share for this range.
    pub employer_share: Decimal,
}

/// PhilHealth premium parameters.
///
/// Compensation is clamped to `[monthly_floor, monthly_ceiling]`, multiplied
/// by the premium rate, then split employee/employer by percentage.
#[derive(Debug, Clone, Deserialize)]
pub struct PhilHealthTable {
    /// Minimum compensation used to compute the premium.
    pub monthly_floor: Decimal,
    /// Maximum compensation used to compute the premium.
    pub monthly_ceiling: Decimal,
    /// Premium rate applied to the clamped compensation.
    pub premium_rate: Decimal,
    /// Employee fraction of the premium.
    pub employee_pct: Decimal,
    /// Employer fraction of the premium.
    pub employer_pct: Decimal,
}

/// One salary-range row of the Pag-IBIG contribution table.
#[derive(Debug, Clone, Deserialize)]
pub struct PagIbigBracket {
    /// Lower bound of the monthly salary range (inclusive).
    pub min_salary: Decimal,
    /// Upper bound of the range (inclusive); absent on the top bracket.
    #[serde(default)]
    pub max_salary: Option<Decimal>,
    /// Employee share for this range.
    pub employee_share: Decimal,
    /// Employer share for this range.
    pub employer_share: Decimal,
}

/// One progressive tax bracket row.
///
/// Tax on income inside the row is `base_tax + (income - over) * rate`.
#[derive(Debug, Clone, Deserialize)]
pub struct TaxBracket {
    /// Income threshold the row starts above.
    pub over: Decimal,
    /// Upper bound of the row; absent on the top bracket.
    #[serde(default)]
    pub up_to: Option<Decimal>,
    /// Tax due on income up to `over`.
    pub base_tax: Decimal,
    /// Marginal rate applied to income above `over`.
    pub rate: Decimal,
}

/// Pay multipliers per overtime classification.
#[derive(Debug, Clone, Deserialize)]
pub struct OvertimePolicy {
    /// Ordinary working day overtime.
    pub regular: Decimal,
    /// Rest day overtime.
    pub rest_day: Decimal,
    /// Regular holiday overtime.
    pub regular_holiday: Decimal,
    /// Special non-working day overtime.
    pub special_holiday: Decimal,
    /// Rest day that is also a holiday.
    pub rest_day_holiday: Decimal,
}

impl OvertimePolicy {
    /// The hourly multiplier for one overtime classification.
    pub fn multiplier_for(&self, kind: OvertimeKind) -> Decimal {
        match kind {
            OvertimeKind::Regular => self.regular,
            OvertimeKind::RestDay => self.rest_day,
            OvertimeKind::RegularHoliday => self.regular_holiday,
            OvertimeKind::SpecialHoliday => self.special_holiday,
            OvertimeKind::RestDayHoliday => self.rest_day_holiday,
        }
    }
}

/// Premium-day pay multipliers for employees present on a holiday.
///
/// Premium pay accrues as `daily_rate * (multiplier - 1)`; the base day is
/// already covered by the payable-day count.
#[derive(Debug, Clone, Deserialize)]
pub struct HolidayPolicy {
    /// Multiplier for regular holidays.
    pub regular_multiplier: Decimal,
    /// Multiplier for special non-working days.
    pub special_multiplier: Decimal,
}

/// One effective-dated set of statutory tables and rate policies.
#[derive(Debug, Clone, Deserialize)]
pub struct StatutoryTableSet {
    /// The date this set takes effect.
    pub effective_date: NaiveDate,
    /// SSS contribution brackets.
    #[serde(default)]
    pub sss: Vec<SssBracket>,
    /// PhilHealth premium parameters.
    #[serde(default)]
    pub philhealth: Option<PhilHealthTable>,
    /// Pag-IBIG contribution brackets.
    #[serde(default)]
    pub pagibig: Vec<PagIbigBracket>,
    /// Annual tax brackets for the annualized projection method.
    #[serde(default)]
    pub annual_tax: Vec<TaxBracket>,
    /// Per-period tax brackets, the fallback when no annual table exists.
    #[serde(default)]
    pub period_tax: Vec<TaxBracket>,
    /// Overtime multipliers.
    pub overtime: OvertimePolicy,
    /// Holiday premium multipliers.
    pub holiday: HolidayPolicy,
    /// Night-differential rate applied to the hourly rate.
    pub night_diff_rate: Decimal,
    /// Statutory ceiling on the bonus/de-minimis tax exclusion.
    pub bonus_exclusion_ceiling: Decimal,
    /// Flat withholding rate for substituted-filing employees.
    pub substituted_filing_rate: Decimal,
}

impl StatutoryTableSet {
    /// The SSS bracket covering a monthly base salary, if any.
    pub fn sss_bracket_for(&self, monthly_salary: Decimal) -> Option<&SssBracket> {
        self.sss.iter().find(|b| {
            b.min_salary <= monthly_salary
                && b.max_salary.is_none_or(|max| monthly_salary <= max)
        })
    }

    /// The Pag-IBIG bracket covering a monthly base salary, if any.
    pub fn pagibig_bracket_for(&self, monthly_salary: Decimal) -> Option<&PagIbigBracket> {
        self.pagibig.iter().find(|b| {
            b.min_salary <= monthly_salary
                && b.max_salary.is_none_or(|max| monthly_salary <= max)
        })
    }
}

/// The complete payroll configuration loaded from YAML files.
#[derive(Debug, Clone)]
pub struct PayrollConfig {
    /// Company identity and policy.
    company: CompanyPolicy,
    /// Statutory table sets by effective date (sorted oldest first).
    tables: Vec<StatutoryTableSet>,
}

impl PayrollConfig {
    /// Creates a new PayrollConfig from its component parts.
    pub fn new(company: CompanyPolicy, tables: Vec<StatutoryTableSet>) -> Self {
        let mut sorted_tables = tables;
        sorted_tables.sort_by(|a, b| a.effective_date.cmp(&b.effective_date));
        Self {
            company,
            tables: sorted_tables,
        }
    }

    /// Returns the company policy.
    pub fn company(&self) -> &CompanyPolicy {
        &self.company
    }

    /// Returns all statutory table sets.
    pub fn tables(&self) -> &[StatutoryTableSet] {
        &self.tables
    }

    /// The most recent table set effective on or before `date`, if any.
    pub fn tables_for(&self, date: NaiveDate) -> Option<&StatutoryTableSet> {
        self.tables.iter().rev().find(|t| t.effective_date <= date)
    }
}
