//! API error types and handling

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use procwatch_domain::DomainError;
use serde_json::json;
use thiserror::Error;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Invalid request: {0}")]
    BadRequest(String),
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

impl ApiError {
    fn status_and_type(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Domain(err) => match err {
                DomainError::ValidationError { .. } => (StatusCode::BAD_REQUEST, "validation_error"),
                DomainError::EntityNotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
                DomainError::Conflict { .. } => (StatusCode::BAD_REQUEST, "conflict"),
                DomainError::InvalidState { .. } => (StatusCode::BAD_REQUEST, "invalid_state"),
                DomainError::ConcurrencyConflict { .. } => (StatusCode::CONFLICT, "concurrency_conflict"),
                DomainError::Storage { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "server_error"),
            },
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.status_and_type();

        let message = if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
            "An unexpected error occurred".to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "success": false,
            "error": {
                "type": error_type,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_map_to_status_codes() {
        let cases = [
            (DomainError::validation("name", "required"), StatusCode::BAD_REQUEST),
            (DomainError::not_found("ProcessMonitor", "x"), StatusCode::NOT_FOUND),
            (
                DomainError::Conflict {
                    reason: "duplicate".to_string(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                DomainError::ConcurrencyConflict {
                    resource: "Alert".to_string(),
                },
                StatusCode::CONFLICT,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), expected);
        }
    }

    #[test]
    fn test_internal_detail_is_not_exposed() {
        let response = ApiError::Domain(DomainError::Storage {
            reason: "disk on fire".to_string(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
