//! Personal access tokens
//!
//! A token is handed out as `<id>|<secret>`. Only the SHA-256 digest of the
//! secret is stored, so a leaked database does not leak usable tokens.

use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use tracing::debug;

use super::models::{User, USER_COLUMNS};
use crate::common::generate_token_secret;

/// Name recorded for tokens issued by the login endpoint
pub const LOGIN_TOKEN_NAME: &str = "MyApp";

/// Hex-encoded SHA-256 of a token secret
pub fn digest(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

/// Split `<id>|<secret>` into its parts. A bare secret has no id.
fn split_token(token: &str) -> (Option<i64>, &str) {
    match token.split_once('|') {
        Some((id, secret)) => (id.parse::<i64>().ok(), secret),
        None => (None, token),
    }
}

/// Creates a token row and returns the plain-text token, shown only once
pub async fn issue_token(
    pool: &SqlitePool,
    user_id: i64,
    name: &str,
) -> Result<String, sqlx::Error> {
    let secret = generate_token_secret();

    let result = sqlx::query(
        "INSERT INTO personal_access_tokens (user_id, name, token) VALUES (?, ?, ?)",
    )
    .bind(user_id)
    .bind(name)
    .bind(digest(&secret))
    .execute(pool)
    .await?;

    Ok(format!("{}|{}", result.last_insert_rowid(), secret))
}

/// Looks up the token and its owner, touching `last_used_at`
///
/// Returns `None` for unknown, revoked or malformed tokens.
pub async fn resolve_token(
    pool: &SqlitePool,
    token: &str,
) -> Result<Option<(i64, User)>, sqlx::Error> {
    let (claimed_id, secret) = split_token(token);
    if secret.is_empty() {
        return Ok(None);
    }

    let row: Option<(i64, i64)> =
        sqlx::query_as("SELECT id, user_id FROM personal_access_tokens WHERE token = ?")
            .bind(digest(secret))
            .fetch_optional(pool)
            .await?;

    let Some((token_id, user_id)) = row else {
        return Ok(None);
    };

    if claimed_id.is_some_and(|id| id != token_id) {
        debug!(token_id = token_id, "Token id prefix does not match stored token");
        return Ok(None);
    }

    sqlx::query("UPDATE personal_access_tokens SET last_used_at = datetime('now') WHERE id = ?")
        .bind(token_id)
        .execute(pool)
        .await?;

    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE id = ?",
        USER_COLUMNS
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(user.map(|u| (token_id, u)))
}

/// Deletes a single token; other tokens of the same user stay valid
pub async fn revoke_token(pool: &SqlitePool, token_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM personal_access_tokens WHERE id = ?")
        .bind(token_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
