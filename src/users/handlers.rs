//! Admin user management handlers
//!
//! Every handler requires a token whose owner may manage users. Persistence
//! failures are logged with the handler name and answered with the generic
//! 500 envelope.

use axum::extract::{Extension, Path};
use serde_json::{json, Value};
use tracing::{error, info};

use super::services::{UserError, UserRecord, UsersService};
use super::validators::{user_rules, USER_VALIDATION_MESSAGE};
use crate::auth::handlers::hash_or_internal;
use crate::auth::policy::{authorize, can_manage_users};
use crate::auth::{AuthedUser, User};
use crate::common::validation::field_text;
use crate::common::{safe_email_log, ApiError, ApiResponse, AppState, RequestInput, SharedState};

/// Logs unexpected failures with the handler that hit them
fn internal(place: &'static str) -> impl Fn(UserError) -> ApiError {
    move |e| {
        if let UserError::Database(err) = &e {
            error!(error = %err, handler = place, "User persistence failed");
        }
        e.into()
    }
}

async fn validated_record(
    state: &AppState,
    values: &Value,
    ignore_id: Option<i64>,
) -> Result<UserRecord, ApiError> {
    let result = user_rules(ignore_id)
        .check_with_db(values, &state.db)
        .await?;
    if !result.is_valid {
        return Err(ApiError::validation_with_message(
            USER_VALIDATION_MESSAGE,
            result,
        ));
    }

    let password = values
        .get("password")
        .and_then(Value::as_str)
        .unwrap_or_default();

    Ok(UserRecord {
        name: field_text(values, "name").unwrap_or_default(),
        email: field_text(values, "email").unwrap_or_default(),
        phone: field_text(values, "phone").unwrap_or_default(),
        dob: field_text(values, "dob").unwrap_or_default(),
        password_hash: hash_or_internal(password)?,
    })
}

/// GET /api/user
pub async fn index(
    Extension(state_lock): Extension<SharedState>,
    authed: AuthedUser,
) -> Result<ApiResponse<Vec<User>>, ApiError> {
    authorize(can_manage_users(&authed))?;
    let state = state_lock.read().await.clone();

    let users = UsersService::new(state.db.clone())
        .list()
        .await
        .map_err(internal("users::index"))?;

    Ok(ApiResponse::ok(users, "Success!"))
}

/// POST /api/user
pub async fn store(
    Extension(state_lock): Extension<SharedState>,
    authed: AuthedUser,
    input: RequestInput,
) -> Result<ApiResponse<Value>, ApiError> {
    authorize(can_manage_users(&authed))?;
    let state = state_lock.read().await.clone();
    let values = input.values();

    let record = validated_record(&state, &values, None).await?;
    let is_admin = state.config.is_admin_email(&record.email);

    let user = UsersService::new(state.db.clone())
        .create(&record, is_admin)
        .await
        .map_err(internal("users::store"))?;

    info!(
        admin_id = authed.id,
        user_id = user.id,
        email = %safe_email_log(&user.email),
        "Admin created user"
    );

    Ok(ApiResponse::ok(json!([]), "User Created Successfully!"))
}

/// GET /api/user/:id
pub async fn show(
    Extension(state_lock): Extension<SharedState>,
    authed: AuthedUser,
    Path(id): Path<i64>,
) -> Result<ApiResponse<User>, ApiError> {
    authorize(can_manage_users(&authed))?;
    let state = state_lock.read().await.clone();

    let user = UsersService::new(state.db.clone())
        .find(id)
        .await
        .map_err(internal("users::show"))?;

    Ok(ApiResponse::ok(user, "Success!"))
}

/// PUT /api/user/:id - Unknown ids are rejected before validation
pub async fn update(
    Extension(state_lock): Extension<SharedState>,
    authed: AuthedUser,
    Path(id): Path<i64>,
    input: RequestInput,
) -> Result<ApiResponse<Value>, ApiError> {
    authorize(can_manage_users(&authed))?;
    let state = state_lock.read().await.clone();
    let service = UsersService::new(state.db.clone());

    service.find(id).await.map_err(internal("users::update"))?;

    let values = input.values();
    let record = validated_record(&state, &values, Some(id)).await?;

    service
        .update(id, &record)
        .await
        .map_err(internal("users::update"))?;

    info!(admin_id = authed.id, user_id = id, "Admin updated user");

    Ok(ApiResponse::ok(json!([]), "Success!"))
}

/// DELETE /api/user/:id
pub async fn destroy(
    Extension(state_lock): Extension<SharedState>,
    authed: AuthedUser,
    Path(id): Path<i64>,
) -> Result<ApiResponse<Value>, ApiError> {
    authorize(can_manage_users(&authed))?;
    let state = state_lock.read().await.clone();

    UsersService::new(state.db.clone())
        .delete(id)
        .await
        .map_err(internal("users::destroy"))?;

    info!(admin_id = authed.id, user_id = id, "Admin deleted user");

    Ok(ApiResponse::ok(json!([]), "Deleted Successfully!"))
}
