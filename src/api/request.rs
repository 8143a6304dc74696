//! Request types for the Payroll Run Calculation Engine API.
//!
//! This module defines the JSON request structures for the endpoints
//! that carry a body: run creation and manual adjustments.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::engine::{AdjustmentInput, CreateRunInput};
use crate::models::{RunScope, RunType};

/// Request body for `POST /runs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRunRequest {
    /// The company the run belongs to.
    pub company_id: String,
    /// The pay period the run is anchored to.
    pub period_id: String,
    /// Regular or bonus variant.
    pub run_type: RunType,
    /// Optional employee filters; empty filters match everyone.
    #[serde(default)]
    pub scope: RunScope,
}

/// Request body for `POST /runs/{id}/adjustments`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustmentRequest {
    /// The employee the adjustment targets.
    pub employee_id: String,
    /// Display description shown on the payslip line.
    pub description: String,
    /// Adjustment amount.
    pub amount: Decimal,
    /// True for an earning line, false for a deduction line.
    pub earning: bool,
    /// Whether a deduction line reduces the taxable base.
    #[serde(default)]
    pub pre_tax: bool,
}

impl From<CreateRunRequest> for CreateRunInput {
    fn from(req: CreateRunRequest) -> Self {
        CreateRunInput {
            company_id: req.company_id,
            period_id: req.period_id,
            run_type: req.run_type,
            scope: req.scope,
        }
    }
}

impl From<AdjustmentRequest> for AdjustmentInput {
    fn from(req: AdjustmentRequest) -> Self {
        AdjustmentInput {
            employee_id: req.employee_id,
            description: req.description,
            amount: req.amount,
            earning: req.earning,
            pre_tax: req.pre_tax,
        }
    }
}
