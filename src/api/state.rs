//! Application state for the Payroll Run Calculation Engine API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use crate::engine::PayrollEngine;

/// Shared application state.
///
/// Contains resources that are shared across all request handlers; every
/// handler drives the same engine instance.
#[derive(Clone)]
pub struct AppState {
    /// The payroll engine the handlers operate on.
    engine: Arc<PayrollEngine>,
}

impl AppState {
    /// Creates a new application state around the given engine.
    pub fn new(engine: PayrollEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    /// Returns a reference to the engine.
    pub fn engine(&self) -> &PayrollEngine {
        &self.engine
    }
}
