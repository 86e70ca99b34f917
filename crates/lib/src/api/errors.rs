//! HTTP error mapping.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Errors returned by the HTTP handlers.
///
/// Rendered as `{"error": "<message>"}` with a status derived from the
/// library error's classification.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No usable acting identity on the request.
    #[error("{0}")]
    Unauthorized(String),

    /// The body, path or query string could not be decoded for the endpoint.
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Library(#[from] crate::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Library(err) => {
                if err.is_validation_error() {
                    StatusCode::BAD_REQUEST
                } else if err.is_permission_denied() {
                    StatusCode::FORBIDDEN
                } else if err.is_not_found() {
                    StatusCode::NOT_FOUND
                } else if err.is_conflict() {
                    StatusCode::CONFLICT
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self, "request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
