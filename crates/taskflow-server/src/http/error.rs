//! HTTP error boundary
//!
//! Every failure leaves as `{"status": "fail" | "error", "message": ...}`.
//! Client errors (4xx) carry `fail` and the domain message; server errors
//! carry `error` and a generic message, the cause goes to the log.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use taskflow_core::{ErrorKind, WorkflowError};

/// Error returned from handlers and extractors
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub WorkflowError);

/// Result alias for handlers
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// HTTP status for the wrapped error
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self.0.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Authentication => StatusCode::UNAUTHORIZED,
            ErrorKind::Authorization => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
            json!({ "status": "error", "message": "Something went wrong" })
        } else {
            json!({ "status": "fail", "message": self.0.to_string() })
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(WorkflowError::validation(rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self(WorkflowError::validation(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(WorkflowError::validation(rejection.body_text()))
    }
}
