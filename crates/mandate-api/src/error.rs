//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps engine and state-machine errors to HTTP status codes and JSON
//! error bodies with a machine-readable code. Internal error details are
//! never exposed to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use mandate_engine::{EngineError, ErrorClass};

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "CONFLICT").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details, present only for client errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`].
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Request body could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Authentication failure (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Conflict with current resource state (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// An upstream dependency (signing provider, artifact storage)
    /// failed (502).
    #[error("upstream failure: {0}")]
    Upstream(String),

    /// The signing flow started at the provider but did not complete
    /// binding or persisting; requires resume or intervention (502).
    #[error("submission incomplete: {0}")]
    PartialSubmission(String),

    /// A required subsystem is not configured (503).
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Internal server error (500). Message is logged, not returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status and machine-readable code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::Upstream(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            Self::PartialSubmission(_) => (StatusCode::BAD_GATEWAY, "PARTIAL_SUBMISSION"),
            Self::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Never expose internal error messages to clients.
        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        if matches!(&self, Self::Internal(_)) {
            tracing::error!(error = %self, "internal server error");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Map engine errors by their classification, preserving the
/// retry-relevant distinctions in the response code.
impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        let message = err.to_string();
        match err.class() {
            ErrorClass::Validation => Self::Validation(message),
            ErrorClass::Conflict => Self::Conflict(message),
            ErrorClass::NotFound => Self::NotFound(message),
            ErrorClass::Transient => Self::Upstream(message),
            ErrorClass::PartialCompletion => Self::PartialSubmission(message),
            ErrorClass::Unauthorized => Self::Unauthorized(message),
            ErrorClass::Malformed => Self::BadRequest(message),
            ErrorClass::Internal => Self::Internal(message),
        }
    }
}

/// Repository failures reuse the engine mapping (not-found, conflict,
/// storage).
impl From<mandate_engine::RepoError> for AppError {
    fn from(err: mandate_engine::RepoError) -> Self {
        Self::from(EngineError::from(err))
    }
}

/// Draft-guard and transition errors map to 409.
impl From<mandate_state::MandateError> for AppError {
    fn from(err: mandate_state::MandateError) -> Self {
        Self::Conflict(err.to_string())
    }
}

/// Domain validation errors map to 422.
impl From<mandate_core::ValidationError> for AppError {
    fn from(err: mandate_core::ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use mandate_engine::GatewayFailure;

    async fn response_parts(err: AppError) -> (StatusCode, ErrorBody) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        (status, body)
    }

    #[tokio::test]
    async fn not_found_maps_to_404() {
        let (status, body) = response_parts(AppError::NotFound("mandate 9".into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error.code, "NOT_FOUND");
        assert!(body.error.message.contains("mandate 9"));
    }

    #[tokio::test]
    async fn internal_hides_details() {
        let (status, body) =
            response_parts(AppError::Internal("db connection failed".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.error.message.contains("db connection"));
        assert_eq!(body.error.message, "An internal error occurred");
    }

    #[tokio::test]
    async fn partial_submission_has_distinct_code() {
        let engine_err = EngineError::PartialSubmission {
            id: 4,
            document_key: "D2".into(),
            detail: "signer registration failed".into(),
        };
        let (status, body) = response_parts(AppError::from(engine_err)).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body.error.code, "PARTIAL_SUBMISSION");
        assert!(body.error.message.contains("D2"));
    }

    #[test]
    fn engine_classes_map_to_expected_statuses() {
        let cases: Vec<(AppError, StatusCode)> = vec![
            (
                AppError::from(EngineError::NotFound { id: 1 }),
                StatusCode::NOT_FOUND,
            ),
            (
                AppError::from(EngineError::Concurrency { id: 1 }),
                StatusCode::CONFLICT,
            ),
            (
                AppError::from(EngineError::Gateway(GatewayFailure {
                    endpoint: "POST /documents".into(),
                    status: None,
                    message: "timeout".into(),
                })),
                StatusCode::BAD_GATEWAY,
            ),
            (
                AppError::from(EngineError::SignatureRejected("mismatch".into())),
                StatusCode::UNAUTHORIZED,
            ),
        ];
        for (err, expected) in cases {
            let (status, _) = err.status_and_code();
            assert_eq!(status, expected);
        }
    }

    #[test]
    fn state_error_maps_to_conflict() {
        let err = AppError::from(mandate_state::MandateError::AlreadySigned { id: 1 });
        let (status, code) = err.status_and_code();
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(code, "CONFLICT");
    }
}
