//! HTTP API module for the Payroll Run Calculation Engine.
//!
//! This module exposes the run pipeline operations (create, validate,
//! calculate, review, generate, close, reopen, adjust) as REST endpoints
//! over an axum router. The actor identity is read from the `X-Actor-Id`
//! header and defaults to "system".

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{AdjustmentRequest, CreateRunRequest};
pub use response::{ApiError, CloseResponse, RunCreated};
pub use state::AppState;
