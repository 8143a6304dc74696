//! Error types for the Payroll Run Calculation Engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while driving a payroll run
//! through its pipeline.

use thiserror::Error;
use uuid::Uuid;

use crate::models::RunStatus;

/// The main error type for the Payroll Run Calculation Engine.
///
/// All operations in the engine return this error type, making it easy
/// to handle errors consistently throughout the application.
///
/// # Example
///
/// ```
/// use payroll_engine::error::EngineError;
///
/// let error = EngineError::ConfigNotFound {
///     path: "/missing/file.yaml".to_string(),
/// };
/// assert_eq!(error.to_string(), "Configuration file not found: /missing/file.yaml");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// The caller does not hold the permission a transition requires.
    #[error("Actor '{actor_id}' does not hold permission '{permission}'")]
    PermissionDenied {
        /// The caller that was rejected.
        actor_id: String,
        /// The permission that was missing.
        permission: String,
    },

    /// The referenced pay period does not exist.
    #[error("Pay period not found: {period_id}")]
    PeriodNotFound {
        /// The pay period identifier.
        period_id: String,
    },

    /// The pay period has already been locked by a closed run.
    #[error("Pay period '{period_id}' is locked")]
    PeriodLocked {
        /// The pay period identifier.
        period_id: String,
    },

    /// The referenced payroll run does not exist.
    #[error("Payroll run not found: {run_id}")]
    RunNotFound {
        /// The payroll run identifier.
        run_id: Uuid,
    },

    /// A non-terminal run already exists for the pay period.
    #[error("An active run already exists for period '{period_id}': {run_number}")]
    ActiveRunExists {
        /// The pay period identifier.
        period_id: String,
        /// The run number of the existing active run.
        run_number: String,
    },

    /// No employees matched the run's scope filters.
    #[error("No eligible employees match the run scope for period '{period_id}'")]
    NoEligibleEmployees {
        /// The pay period identifier.
        period_id: String,
    },

    /// The referenced employee does not exist or is outside the run scope.
    #[error("Employee not found: {employee_id}")]
    EmployeeNotFound {
        /// The employee identifier.
        employee_id: String,
    },

    /// The run's current status does not allow the attempted action.
    #[error("Run '{run_number}' cannot {action}: current status is {status}")]
    InvalidTransition {
        /// The run number.
        run_number: String,
        /// The run's current status.
        status: RunStatus,
        /// The action that was attempted.
        action: &'static str,
    },

    /// Another caller transitioned the run first.
    #[error("Run '{run_number}' is no longer eligible to {action}: modified by another request")]
    TransitionConflict {
        /// The run number.
        run_number: String,
        /// The action that was attempted.
        action: &'static str,
    },

    /// The calculate step failed; the run was rolled back.
    #[error("Calculation failed for run '{run_number}': {message}")]
    CalculationFailed {
        /// The run number.
        run_number: String,
        /// A description of the failure.
        message: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
