//! Uniform `{success, message, data}` response envelope

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

#[derive(Serialize)]
struct SuccessBody<T: Serialize> {
    success: bool,
    message: String,
    data: T,
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

/// Successful API result. Renders as `{success: true, message, data}`.
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub status: StatusCode,
    pub message: String,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T, message: &str) -> Self {
        Self::with_status(data, message, StatusCode::OK)
    }

    pub fn created(data: T, message: &str) -> Self {
        Self::with_status(data, message, StatusCode::CREATED)
    }

    pub fn with_status(data: T, message: &str, status: StatusCode) -> Self {
        Self {
            status,
            message: message.to_string(),
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        send_response(self.data, &self.message, self.status)
    }
}

pub fn send_response<T: Serialize>(data: T, message: &str, code: StatusCode) -> Response {
    let body = SuccessBody {
        success: true,
        message: message.to_string(),
        data,
    };
    (code, Json(body)).into_response()
}

/// Error envelope. `data` is only attached when it carries something.
pub fn send_error(message: &str, errors: Value, code: StatusCode) -> Response {
    let body = ErrorBody {
        success: false,
        message: message.to_string(),
        data: if is_empty(&errors) { None } else { Some(errors) },
    };
    (code, Json(body)).into_response()
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
