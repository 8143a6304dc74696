//! Configuration loading and management for the Payroll Run Calculation Engine.
//!
//! This module provides functionality to load company payroll configuration
//! from YAML files, including attendance policy and the effective-dated
//! statutory tables (SSS, PhilHealth, Pag-IBIG, tax brackets, overtime and
//! holiday multipliers).
//!
//! # Example
//!
//! ```no_run
//! use payroll_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/ph2025").unwrap();
//! println!("Loaded company: {}", config.config().company().company_name);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    AttendanceDeductionBasis, AttendancePolicy, CompanyPolicy, HolidayPolicy, OvertimePolicy,
    PagIbigBracket, PayrollConfig, PhilHealthTable, SssBracket, StatutoryTableSet, TaxBracket,
};
