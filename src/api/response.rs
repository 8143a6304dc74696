//! Response types for the Payroll Run Calculation Engine API.
//!
//! This module defines the error response structures, the mapping from
//! engine errors to HTTP status codes, and the small success bodies that
//! are not domain types themselves.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::CloseOutcome;
use crate::error::EngineError;
use crate::models::RunStatus;

/// Response body for a successfully created run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunCreated {
    /// Identifier of the new run.
    pub run_id: Uuid,
    /// Generated run number.
    pub run_number: String,
    /// Initial pipeline status.
    pub status: RunStatus,
    /// The step the pipeline is positioned at.
    pub current_step: u8,
}

/// Response body for a close request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseResponse {
    /// Whether this request performed the close or found it done.
    pub outcome: CloseOutcome,
}

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// API error with HTTP status code.
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        let message = error.to_string();
        match error {
            EngineError::ConfigNotFound { .. } | EngineError::ConfigParseError { .. } => {
                ApiErrorResponse {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    error: ApiError::with_details("CONFIG_ERROR", "Configuration error", message),
                }
            }
            EngineError::PermissionDenied { .. } => ApiErrorResponse {
                status: StatusCode::FORBIDDEN,
                error: ApiError::new("PERMISSION_DENIED", message),
            },
            EngineError::PeriodNotFound { .. } => ApiErrorResponse {
                status: StatusCode::NOT_FOUND,
                error: ApiError::new("PERIOD_NOT_FOUND", message),
            },
            EngineError::PeriodLocked { .. } => ApiErrorResponse {
                status: StatusCode::CONFLICT,
                error: ApiError::new("PERIOD_LOCKED", message),
            },
            EngineError::RunNotFound { .. } => ApiErrorResponse {
                status: StatusCode::NOT_FOUND,
                error: ApiError::new("RUN_NOT_FOUND", message),
            },
            EngineError::ActiveRunExists { ref run_number, .. } => ApiErrorResponse {
                status: StatusCode::CONFLICT,
                error: ApiError::with_details(
                    "ACTIVE_RUN_EXISTS",
                    message.clone(),
                    format!("Run '{run_number}' must be closed before a new run can be created"),
                ),
            },
            EngineError::NoEligibleEmployees { .. } => ApiErrorResponse {
                status: StatusCode::BAD_REQUEST,
                error: ApiError::new("NO_ELIGIBLE_EMPLOYEES", message),
            },
            EngineError::EmployeeNotFound { .. } => ApiErrorResponse {
                status: StatusCode::NOT_FOUND,
                error: ApiError::new("EMPLOYEE_NOT_FOUND", message),
            },
            EngineError::InvalidTransition { .. } => ApiErrorResponse {
                status: StatusCode::CONFLICT,
                error: ApiError::new("INVALID_TRANSITION", message),
            },
            EngineError::TransitionConflict { .. } => ApiErrorResponse {
                status: StatusCode::CONFLICT,
                error: ApiError::new("TRANSITION_CONFLICT", message),
            },
            EngineError::CalculationFailed { .. } => ApiErrorResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: ApiError::new("CALCULATION_FAILED", message),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_serialization() {
        let error = ApiError::new("TEST_ERROR", "Test message");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"code\":\"TEST_ERROR\""));
        assert!(json.contains("\"message\":\"Test message\""));
        assert!(!json.contains("details")); // Should be skipped when None
    }

    #[test]
    fn test_api_error_with_details_serialization() {
        let error = ApiError::with_details("TEST_ERROR", "Test message", "Some details");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"details\":\"Some details\""));
    }

    #[test]
    fn test_run_not_found_maps_to_404() {
        let engine_error = EngineError::RunNotFound {
            run_id: Uuid::nil(),
        };
        let api_error: ApiErrorResponse = engine_error.into();
        assert_eq!(api_error.status, StatusCode::NOT_FOUND);
        assert_eq!(api_error.error.code, "RUN_NOT_FOUND");
    }

    #[test]
    fn test_active_run_exists_maps_to_409_and_names_the_run() {
        let engine_error = EngineError::ActiveRunExists {
            period_id: "2025-01-A".to_string(),
            run_number: "RUN-2025-00004".to_string(),
        };
        let api_error: ApiErrorResponse = engine_error.into();
        assert_eq!(api_error.status, StatusCode::CONFLICT);
        assert_eq!(api_error.error.code, "ACTIVE_RUN_EXISTS");
        assert!(api_error.error.message.contains("RUN-2025-00004"));
        assert!(api_error.error.details.unwrap().contains("RUN-2025-00004"));
    }

    #[test]
    fn test_transition_conflict_maps_to_409() {
        let engine_error = EngineError::TransitionConflict {
            run_number: "RUN-2025-00001".to_string(),
            action: "close",
        };
        let api_error: ApiErrorResponse = engine_error.into();
        assert_eq!(api_error.status, StatusCode::CONFLICT);
        assert_eq!(api_error.error.code, "TRANSITION_CONFLICT");
    }

    #[test]
    fn test_permission_denied_maps_to_403() {
        let engine_error = EngineError::PermissionDenied {
            actor_id: "auditor".to_string(),
            permission: "payroll.run.close".to_string(),
        };
        let api_error: ApiErrorResponse = engine_error.into();
        assert_eq!(api_error.status, StatusCode::FORBIDDEN);
        assert_eq!(api_error.error.code, "PERMISSION_DENIED");
    }
}
