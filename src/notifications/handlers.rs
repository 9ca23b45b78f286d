use axum::extract::Extension;
use tracing::error;

use super::models::Notification;
use super::services;
use crate::auth::AuthedUser;
use crate::common::{ApiError, ApiResponse, SharedState};

/// GET /api/notifications
pub async fn list_notifications(
    Extension(state_lock): Extension<SharedState>,
    authed: AuthedUser,
) -> Result<ApiResponse<Vec<Notification>>, ApiError> {
    let state = state_lock.read().await.clone();

    let notifications = services::list_for_user(&state.db, authed.id)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = authed.id, "Failed to list notifications");
            ApiError::DatabaseError(e)
        })?;

    Ok(ApiResponse::ok(notifications, "Notifications retrieved successfully."))
}
