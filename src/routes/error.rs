use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_valid::{ValidRejection, ValidationRejection};
use serde::{Deserialize, Serialize};

use crate::db::DbError;

/// Standard error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorInfo,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error classification (e.g. "not_found", "validation_error")
    #[serde(rename = "type")]
    pub error_type: String,
    /// Human-readable error message
    pub message: String,
    /// Machine-readable error code
    pub code: String,
}

impl ErrorResponse {
    pub fn new(
        error_type: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorInfo {
                error_type: error_type.into(),
                message: message.into(),
                code: code.into(),
            },
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Conflict(String),
    /// A lookup expected at most one rule but found several.
    NonUnique,
    Validation(String),
    /// The body is not JSON or does not deserialize into the expected shape.
    InvalidBody(JsonRejection),
    DatabaseRequired,
    Database(DbError),
}

impl From<ValidRejection<JsonRejection>> for ApiError {
    fn from(rejection: ValidRejection<JsonRejection>) -> Self {
        match rejection {
            ValidationRejection::Valid(errors) => ApiError::Validation(errors.to_string()),
            ValidationRejection::Inner(rejection) => ApiError::InvalidBody(rejection),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound => ApiError::NotFound("Retention rule not found".to_string()),
            DbError::Conflict(msg) => ApiError::Conflict(msg),
            DbError::NonUnique => ApiError::NonUnique,
            DbError::Validation(msg) => ApiError::Validation(msg),
            DbError::NotConfigured => ApiError::DatabaseRequired,
            _ => ApiError::Database(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, error_type) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, "not_found"),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, "conflict"),
            ApiError::NonUnique => (
                StatusCode::CONFLICT,
                "non_unique_result",
                DbError::NonUnique.to_string(),
                "conflict",
            ),
            ApiError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                msg,
                "validation_error",
            ),
            ApiError::InvalidBody(rejection) => (
                rejection.status(),
                "invalid_body",
                rejection.body_text(),
                "invalid_request_error",
            ),
            ApiError::DatabaseRequired => (
                StatusCode::SERVICE_UNAVAILABLE,
                "not_configured",
                "This endpoint requires a database. Configure the [database] section.".to_string(),
                "internal_error",
            ),
            ApiError::Database(err) => {
                tracing::error!(error = %err, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    "An internal database error occurred".to_string(),
                    "internal_error",
                )
            }
        };

        (status, Json(ErrorResponse::new(error_type, code, message))).into_response()
    }
}
