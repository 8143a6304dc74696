//! Payroll Run Calculation Engine
//!
//! This crate turns a pay period's raw inputs (attendance, approved leave and
//! overtime, recurring earnings/deductions, loans, statutory tables, tax
//! brackets) into a finalized set of per-employee payslips, and drives each
//! payroll run through a fixed six-step approval pipeline with guarded
//! transitions and a bounded reopen path.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod rounding;
