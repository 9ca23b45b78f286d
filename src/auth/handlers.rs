//! Authentication handlers

use axum::{
    extract::Extension,
    http::header::SET_COOKIE,
    response::IntoResponse,
};
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::{error, info, warn};

use super::cookies::{clear_cookie, session_cookie};
use super::extractors::AuthedUser;
use super::models::{LoginResponse, User, USER_COLUMNS};
use super::password::{hash_password, verify_password};
use super::tokens::{issue_token, revoke_token, LOGIN_TOKEN_NAME};
use super::validators;
use crate::common::validation::field_text;
use crate::common::{safe_email_log, ApiError, ApiResponse, RequestInput, SharedState};

pub(crate) async fn find_user(pool: &SqlitePool, id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
}

async fn find_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE email = ?",
        USER_COLUMNS
    ))
    .bind(email)
    .fetch_optional(pool)
    .await
}

pub(crate) fn hash_or_internal(plain: &str) -> Result<String, ApiError> {
    hash_password(plain).map_err(|e| {
        error!(error = %e, "Password hashing failed");
        ApiError::InternalServer(format!("password hashing failed: {}", e))
    })
}

/// POST /api/register
///
/// Creates a regular account. Self-registration never grants the admin role.
pub async fn register(
    Extension(state_lock): Extension<SharedState>,
    input: RequestInput,
) -> Result<ApiResponse<User>, ApiError> {
    let state = state_lock.read().await.clone();
    let values = input.values();

    let result = validators::register_rules()
        .check_with_db(&values, &state.db)
        .await?;
    if !result.is_valid {
        return Err(ApiError::validation(result));
    }

    let name = field_text(&values, "name").unwrap_or_default();
    let email = field_text(&values, "email").unwrap_or_default();
    let password = values
        .get("password")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let password_hash = hash_or_internal(password)?;

    let inserted = sqlx::query("INSERT INTO users (name, email, password, is_admin) VALUES (?, ?, ?, 0)")
        .bind(&name)
        .bind(&email)
        .bind(&password_hash)
        .execute(&state.db)
        .await
        .map_err(|e| {
            error!(error = %e, email = %safe_email_log(&email), "Failed to create user");
            ApiError::DatabaseError(e)
        })?;

    let user = find_user(&state.db, inserted.last_insert_rowid())
        .await?
        .ok_or_else(|| ApiError::InternalServer("registered user vanished".to_string()))?;

    info!(
        user_id = user.id,
        email = %safe_email_log(&user.email),
        "User registered"
    );

    Ok(ApiResponse::created(user, "User registered successfully!"))
}

/// POST /api/login
///
/// Unknown email and wrong password produce the same 401. The token is also
/// set as an HttpOnly session cookie so the HTML pages work from a browser.
pub async fn login(
    Extension(state_lock): Extension<SharedState>,
    input: RequestInput,
) -> Result<impl IntoResponse, ApiError> {
    let state = state_lock.read().await.clone();
    let values = input.values();

    let result = validators::login_rules().check(&values);
    if !result.is_valid {
        return Err(ApiError::validation(result));
    }

    let email = field_text(&values, "email").unwrap_or_default();
    let password = values
        .get("password")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let user = match find_user_by_email(&state.db, &email).await? {
        Some(user) if verify_password(password, &user.password) => user,
        _ => {
            warn!(email = %safe_email_log(&email), "Login failed");
            return Err(ApiError::InvalidCredentials);
        }
    };

    let token = issue_token(&state.db, user.id, LOGIN_TOKEN_NAME)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = user.id, "Failed to issue token");
            ApiError::DatabaseError(e)
        })?;

    info!(user_id = user.id, email = %safe_email_log(&user.email), "User logged in");

    let cookie = session_cookie(&token, state.config.cookie_secure)?;

    Ok((
        [(SET_COOKIE, cookie)],
        ApiResponse::ok(
            LoginResponse {
                token,
                token_type: "Bearer",
                user,
            },
            "User login successfully.",
        ),
    ))
}

/// GET /api/logout
///
/// Revokes only the token used for this request and clears the session cookie.
pub async fn logout(
    Extension(state_lock): Extension<SharedState>,
    authed: AuthedUser,
) -> Result<impl IntoResponse, ApiError> {
    let state = state_lock.read().await.clone();

    revoke_token(&state.db, authed.token_id).await.map_err(|e| {
        error!(error = %e, user_id = authed.id, "Failed to revoke token");
        ApiError::DatabaseError(e)
    })?;

    info!(user_id = authed.id, token_id = authed.token_id, "User logged out");

    Ok((
        [(SET_COOKIE, clear_cookie(state.config.cookie_secure)?)],
        ApiResponse::ok(Value::Null, "You have been successfully logged out!"),
    ))
}

/// GET /api/profile
pub async fn profile(authed: AuthedUser) -> ApiResponse<User> {
    ApiResponse::ok(authed.user, "Success!")
}

/// POST /api/change-password
pub async fn change_password(
    Extension(state_lock): Extension<SharedState>,
    authed: AuthedUser,
    input: RequestInput,
) -> Result<ApiResponse<Value>, ApiError> {
    let state = state_lock.read().await.clone();
    let values = input.values();

    let result = validators::change_password_rules().check(&values);
    if !result.is_valid {
        return Err(ApiError::validation(result));
    }

    let old_password = values
        .get("old_password")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if !verify_password(old_password, &authed.user.password) {
        warn!(user_id = authed.id, "Password change rejected: old password mismatch");
        return Err(ApiError::InvalidOldPassword);
    }

    let new_password = values
        .get("password")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let password_hash = hash_or_internal(new_password)?;

    sqlx::query("UPDATE users SET password = ?, updated_at = datetime('now') WHERE id = ?")
        .bind(&password_hash)
        .bind(authed.id)
        .execute(&state.db)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = authed.id, "Failed to update password");
            ApiError::DatabaseError(e)
        })?;

    info!(user_id = authed.id, "Password changed");

    Ok(ApiResponse::ok(Value::Null, "Password Changed Successfully!"))
}

/// POST /api/profile-update
///
/// Returns the updated user.
pub async fn profile_update(
    Extension(state_lock): Extension<SharedState>,
    authed: AuthedUser,
    input: RequestInput,
) -> Result<ApiResponse<User>, ApiError> {
    let state = state_lock.read().await.clone();
    let values = input.values();

    let result = validators::profile_update_rules(authed.id)
        .check_with_db(&values, &state.db)
        .await?;
    if !result.is_valid {
        return Err(ApiError::validation(result));
    }

    sqlx::query(
        r#"
        UPDATE users
        SET name = ?, phone = ?, dob = ?, email = ?, updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(field_text(&values, "name"))
    .bind(field_text(&values, "phone"))
    .bind(field_text(&values, "dob"))
    .bind(field_text(&values, "email"))
    .bind(authed.id)
    .execute(&state.db)
    .await
    .map_err(|e| {
        error!(error = %e, user_id = authed.id, "Failed to update profile");
        ApiError::DatabaseError(e)
    })?;

    let user = find_user(&state.db, authed.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    info!(user_id = user.id, "Profile updated");

    Ok(ApiResponse::ok(user, "User Details Updated!"))
}
