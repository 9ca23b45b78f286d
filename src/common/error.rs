// Error handling types for the API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{json, Value};
use std::fmt;
use tracing::error;

use super::envelope::send_error;
use super::validation::{FieldErrors, ValidationResult};

/// Generic body returned for failures that must not leak detail
pub const SOMETHING_WENT_WRONG: &str = "Something went wrong";

/// API error types
#[derive(Debug)]
pub enum ApiError {
    /// Missing, unknown or revoked bearer token
    Unauthorized(String),
    /// Authenticated but the role does not allow the action
    Forbidden(String),
    BadRequest(String),
    NotFound(String),
    /// Field-level validation failure, always rendered with its detail
    Validation { message: String, errors: FieldErrors },
    InvalidCredentials,
    InvalidOldPassword,
    InternalServer(String),
    DatabaseError(sqlx::Error),
}

impl ApiError {
    /// Validation failure using the auth endpoints' message
    pub fn validation(result: ValidationResult) -> Self {
        ApiError::Validation {
            message: "Validation Error.".to_string(),
            errors: result.into_field_errors(),
        }
    }

    /// Validation failure with a custom envelope message
    pub fn validation_with_message(message: &str, result: ValidationResult) -> Self {
        ApiError::Validation {
            message: message.to_string(),
            errors: result.into_field_errors(),
        }
    }

    pub fn unauthenticated() -> Self {
        ApiError::Unauthorized("Unauthenticated.".to_string())
    }

    pub fn forbidden() -> Self {
        ApiError::Forbidden("This action is unauthorized.".to_string())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ApiError::Validation { errors, .. } => {
                write!(f, "Validation Error: {} field(s) rejected", errors.len())
            }
            ApiError::InvalidCredentials => write!(f, "Invalid login details"),
            ApiError::InvalidOldPassword => write!(f, "Invalid old password"),
            ApiError::InternalServer(msg) => write!(f, "Internal Server Error: {}", msg),
            ApiError::DatabaseError(e) => write!(f, "Database Error: {}", e),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        ApiError::DatabaseError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, data): (StatusCode, String, Value) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, Value::Null),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, Value::Null),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, Value::Null),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, Value::Null),
            ApiError::Validation { message, errors } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                message,
                json!(errors),
            ),
            ApiError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Unauthorised.".to_string(),
                json!({ "error": "Invalid Login Details" }),
            ),
            ApiError::InvalidOldPassword => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "ERROR".to_string(),
                json!({ "error": "Invalid Old Password" }),
            ),
            ApiError::InternalServer(msg) => {
                error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error.".to_string(),
                    json!(SOMETHING_WENT_WRONG),
                )
            }
            ApiError::DatabaseError(e) => {
                error!(error = %e, "Database error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error.".to_string(),
                    json!(SOMETHING_WENT_WRONG),
                )
            }
        };

        send_error(&message, data, status)
    }
}
