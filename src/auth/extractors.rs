//! Authentication extractors for Axum

use async_trait::async_trait;
use axum::{
    extract::{Extension, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::{debug, error, warn};

use super::cookies::{cookie_value, TOKEN_COOKIE};
use super::models::User;
use super::tokens;
use crate::common::{safe_email_log, safe_token_log, ApiError, SharedState};

/// Authenticated user extractor
///
/// Resolves the bearer token (or the session cookie) against the token store
/// and loads its owner.
/// The role comes from the stored `is_admin` flag only.
#[derive(Debug, Clone)]
pub struct AuthedUser {
    pub id: i64,
    /// The token presented with this request
    pub token_id: i64,
    pub user: User,
    pub is_admin: bool,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Extension(state_lock): Extension<SharedState> =
            Extension::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::InternalServer("missing app state".to_string()))?;

        let app_state = state_lock.read().await.clone();

        // Authorization header first, then the session cookie set by login
        let token = match parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .map(|t| t.trim().to_string())
            .or_else(|| cookie_value(&parts.headers, TOKEN_COOKIE))
        {
            Some(t) => t,
            None => {
                debug!("Authentication failed: no Authorization header or session cookie");
                return Err(ApiError::unauthenticated());
            }
        };

        // Handle "Bearer <token>" format or raw token
        let bare_token = token.strip_prefix("Bearer ").unwrap_or(&token).trim();

        let resolved = tokens::resolve_token(&app_state.db, bare_token)
            .await
            .map_err(|e| {
                error!(error = %e, "Database error during token lookup in authentication");
                ApiError::DatabaseError(e)
            })?;

        match resolved {
            Some((token_id, user)) => {
                let is_admin = user.is_admin;
                debug!(
                    user_id = user.id,
                    email = %safe_email_log(&user.email),
                    is_admin = is_admin,
                    "User authentication successful via extractor"
                );
                Ok(AuthedUser {
                    id: user.id,
                    token_id,
                    user,
                    is_admin,
                })
            }
            None => {
                warn!(
                    token = %safe_token_log(bare_token),
                    "Authentication failed: unknown or revoked token"
                );
                Err(ApiError::unauthenticated())
            }
        }
    }
}
