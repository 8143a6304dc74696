//! HTTP request handlers for the Payroll Run Calculation Engine API.
//!
//! This module contains the handler functions for all API endpoints.
//! Each handler resolves the acting user from the `X-Actor-Id` header,
//! delegates to the engine, and maps engine errors onto HTTP statuses.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, warn};
use uuid::Uuid;

use super::request::{AdjustmentRequest, CreateRunRequest};
use super::response::{ApiError, ApiErrorResponse, CloseResponse, RunCreated};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/runs", post(create_run_handler))
        .route("/runs/:id", get(get_run_handler))
        .route("/runs/:id/validate", post(validate_handler))
        .route("/runs/:id/calculate", post(calculate_handler))
        .route("/runs/:id/complete-review", post(complete_review_handler))
        .route("/runs/:id/generate-payslips", post(generate_payslips_handler))
        .route("/runs/:id/close", post(close_handler))
        .route("/runs/:id/reopen", post(reopen_handler))
        .route("/runs/:id/adjustments", post(add_adjustment_handler))
        .route("/runs/:id/payslips", get(payslips_handler))
        .with_state(state)
}

/// Resolves the acting user from the `X-Actor-Id` header.
fn actor_from(headers: &HeaderMap) -> String {
    headers
        .get("x-actor-id")
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .unwrap_or("system")
        .to_string()
}

/// Maps a JSON extraction rejection onto an error body.
fn rejection_error(rejection: JsonRejection, correlation_id: Uuid) -> ApiError {
    match rejection {
        JsonRejection::JsonDataError(err) => {
            // The body text carries the detailed error from serde.
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::new("VALIDATION_ERROR", body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    }
}

fn ok_json<T: serde::Serialize>(status: StatusCode, body: T) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        Json(body),
    )
        .into_response()
}

/// Handler for POST /runs.
async fn create_run_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CreateRunRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            let error = rejection_error(rejection, correlation_id);
            return (StatusCode::BAD_REQUEST, Json(error)).into_response();
        }
    };
    let actor = actor_from(&headers);
    info!(
        correlation_id = %correlation_id,
        actor = %actor,
        period_id = %request.period_id,
        "Processing run creation"
    );

    match state.engine().create_run(&actor, request.into()) {
        Ok(run) => ok_json(
            StatusCode::CREATED,
            RunCreated {
                run_id: run.id,
                run_number: run.run_number,
                status: run.status,
                current_step: run.current_step,
            },
        ),
        Err(err) => {
            warn!(correlation_id = %correlation_id, error = %err, "Run creation failed");
            ApiErrorResponse::from(err).into_response()
        }
    }
}

/// Handler for GET /runs/{id}.
async fn get_run_handler(State(state): State<AppState>, Path(run_id): Path<Uuid>) -> Response {
    match state.engine().get_run(run_id) {
        Ok(run) => ok_json(StatusCode::OK, run),
        Err(err) => ApiErrorResponse::from(err).into_response(),
    }
}

/// Handler for POST /runs/{id}/validate.
async fn validate_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(run_id): Path<Uuid>,
) -> Response {
    let actor = actor_from(&headers);
    match state.engine().validate_run(&actor, run_id) {
        Ok(report) => ok_json(StatusCode::OK, report),
        Err(err) => ApiErrorResponse::from(err).into_response(),
    }
}

/// Handler for POST /runs/{id}/calculate.
async fn calculate_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(run_id): Path<Uuid>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let actor = actor_from(&headers);
    match state.engine().calculate_run(&actor, run_id) {
        Ok(summary) => {
            info!(
                correlation_id = %correlation_id,
                run_id = %run_id,
                processed = summary.processed_count,
                gross_pay = %summary.totals.gross_pay,
                "Calculation completed successfully"
            );
            ok_json(StatusCode::OK, summary)
        }
        Err(err) => {
            warn!(correlation_id = %correlation_id, error = %err, "Calculation failed");
            ApiErrorResponse::from(err).into_response()
        }
    }
}

/// Handler for POST /runs/{id}/complete-review.
async fn complete_review_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(run_id): Path<Uuid>,
) -> Response {
    let actor = actor_from(&headers);
    match state.engine().complete_review(&actor, run_id) {
        Ok(run) => ok_json(StatusCode::OK, run),
        Err(err) => ApiErrorResponse::from(err).into_response(),
    }
}

/// Handler for POST /runs/{id}/generate-payslips.
async fn generate_payslips_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(run_id): Path<Uuid>,
) -> Response {
    let actor = actor_from(&headers);
    match state.engine().generate_payslips(&actor, run_id) {
        Ok(run) => ok_json(StatusCode::OK, run),
        Err(err) => ApiErrorResponse::from(err).into_response(),
    }
}

/// Handler for POST /runs/{id}/close.
async fn close_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(run_id): Path<Uuid>,
) -> Response {
    let actor = actor_from(&headers);
    match state.engine().close_run(&actor, run_id) {
        Ok(outcome) => ok_json(StatusCode::OK, CloseResponse { outcome }),
        Err(err) => ApiErrorResponse::from(err).into_response(),
    }
}

/// Handler for POST /runs/{id}/reopen.
async fn reopen_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(run_id): Path<Uuid>,
) -> Response {
    let actor = actor_from(&headers);
    match state.engine().reopen_run(&actor, run_id) {
        Ok(run) => ok_json(StatusCode::OK, run),
        Err(err) => ApiErrorResponse::from(err).into_response(),
    }
}

/// Handler for POST /runs/{id}/adjustments.
async fn add_adjustment_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(run_id): Path<Uuid>,
    payload: Result<Json<AdjustmentRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            let error = rejection_error(rejection, correlation_id);
            return (StatusCode::BAD_REQUEST, Json(error)).into_response();
        }
    };
    let actor = actor_from(&headers);
    match state.engine().add_adjustment(&actor, run_id, request.into()) {
        Ok(entry) => ok_json(StatusCode::CREATED, entry),
        Err(err) => ApiErrorResponse::from(err).into_response(),
    }
}

/// Handler for GET /runs/{id}/payslips.
async fn payslips_handler(State(state): State<AppState>, Path(run_id): Path<Uuid>) -> Response {
    match state.engine().payslips_for_run(run_id) {
        Ok(slips) => ok_json(StatusCode::OK, slips),
        Err(err) => ApiErrorResponse::from(err).into_response(),
    }
}
