//! Session cookie carrying the login token for the HTML pages

use axum::http::{header::COOKIE, HeaderMap, HeaderValue};
use tracing::error;

use crate::common::ApiError;

/// Cookie holding the same `<id>|<secret>` token the API returns
pub const TOKEN_COOKIE: &str = "catalog_token";

fn build(value: &str, max_age: Option<i64>, secure: bool) -> Result<HeaderValue, ApiError> {
    let secure_flag = if secure { " Secure;" } else { "" };
    let max_age = max_age
        .map(|seconds| format!("; Max-Age={}", seconds))
        .unwrap_or_default();
    let cookie = format!(
        "{}={}; HttpOnly;{} SameSite=Strict; Path=/{}",
        TOKEN_COOKIE, value, secure_flag, max_age
    );

    HeaderValue::from_str(&cookie).map_err(|e| {
        error!(error = %e, "Failed to build session cookie");
        ApiError::InternalServer(format!("Failed to create cookie: {}", e))
    })
}

/// `Set-Cookie` value for a freshly issued token
pub fn session_cookie(token: &str, secure: bool) -> Result<HeaderValue, ApiError> {
    build(token, None, secure)
}

/// `Set-Cookie` value that removes the session cookie
pub fn clear_cookie(secure: bool) -> Result<HeaderValue, ApiError> {
    build("", Some(0), secure)
}

/// Value of the named cookie from the request's `Cookie` headers
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key == name && !value.is_empty()).then(|| value.to_string())
        })
}
