// src/logging_middleware.rs
//! Middleware for logging request and response bodies in debug mode
//!
//! Only JSON and URL-encoded bodies are buffered and logged; uploads, pages
//! and files pass through untouched. Secrets are replaced before logging.

use axum::body::to_bytes;
use axum::{
    body::Body,
    extract::Request,
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use serde_json::Value;
use tracing::debug;

/// Largest body this middleware will buffer for logging
pub const MAX_LOGGED_BODY: usize = 8 * 1024 * 1024;

const REDACTED: &str = "[REDACTED]";

/// Field names whose values never reach the log
const SECRET_FIELDS: [&str; 4] = ["password", "old_password", "password_confirmation", "token"];

#[derive(Debug, Clone, Copy, PartialEq)]
enum LoggedBody {
    Json,
    Form,
}

fn loggable_kind(headers: &HeaderMap) -> Option<LoggedBody> {
    let content_type = headers.get(CONTENT_TYPE)?.to_str().ok()?;
    if content_type.starts_with("application/json") {
        Some(LoggedBody::Json)
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        Some(LoggedBody::Form)
    } else {
        None
    }
}

/// Replaces secret values anywhere in a JSON document
pub fn redact_json(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, inner) in map.iter_mut() {
                if SECRET_FIELDS.contains(&key.as_str()) {
                    *inner = Value::String(REDACTED.to_string());
                } else {
                    redact_json(inner);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact_json),
        _ => {}
    }
}

/// Replaces secret values in an `a=1&b=2` body
pub fn redact_form(body: &str) -> String {
    body.split('&')
        .map(|pair| {
            let key = pair.split('=').next().unwrap_or_default();
            let decoded = urlencoding::decode(key).map(|k| k.into_owned()).unwrap_or_default();
            if SECRET_FIELDS.contains(&decoded.as_str()) {
                format!("{}={}", key, REDACTED)
            } else {
                pair.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn render_body(kind: LoggedBody, bytes: &[u8]) -> Option<String> {
    let body_str = std::str::from_utf8(bytes).ok()?;
    match kind {
        LoggedBody::Json => match serde_json::from_str::<Value>(body_str) {
            Ok(mut json) => {
                redact_json(&mut json);
                Some(serde_json::to_string_pretty(&json).unwrap_or_default())
            }
            Err(_) => Some(body_str.to_string()),
        },
        LoggedBody::Form => Some(redact_form(body_str)),
    }
}

/// Middleware to log request and response bodies in debug mode
pub async fn log_request_response(request: Request, next: Next) -> Result<Response, StatusCode> {
    let request = match loggable_kind(request.headers()) {
        Some(kind) => {
            let (parts, body) = request.into_parts();
            let bytes = to_bytes(body, MAX_LOGGED_BODY)
                .await
                .map_err(|_| StatusCode::PAYLOAD_TOO_LARGE)?;

            if let Some(rendered) = render_body(kind, &bytes).filter(|_| !bytes.is_empty()) {
                debug!(
                    method = %parts.method,
                    uri = %parts.uri,
                    request_body = %rendered,
                    "📥 Request"
                );
            }

            Request::from_parts(parts, Body::from(bytes))
        }
        None => request,
    };

    let response = next.run(request).await;

    if loggable_kind(response.headers()) != Some(LoggedBody::Json) {
        return Ok(response);
    }

    let (parts, body) = response.into_parts();
    let bytes = to_bytes(body, usize::MAX)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if let Some(rendered) = render_body(LoggedBody::Json, &bytes).filter(|_| !bytes.is_empty()) {
        debug!(
            status = %parts.status,
            response_body = %rendered,
            "📤 Response"
        );
    }

    Ok(Response::from_parts(parts, Body::from(bytes)))
}
