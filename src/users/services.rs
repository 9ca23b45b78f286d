use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{error, info};

use crate::auth::models::{User, USER_COLUMNS};
use crate::common::ApiError;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found")]
    NotFound,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<UserError> for ApiError {
    fn from(e: UserError) -> Self {
        match e {
            UserError::NotFound => ApiError::NotFound("User not found".to_string()),
            UserError::Database(e) => ApiError::DatabaseError(e),
        }
    }
}

/// Validated fields for an admin create or update. `password` is already hashed.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub dob: String,
    pub password_hash: String,
}

pub struct UsersService {
    db: SqlitePool,
}

impl UsersService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Result<Vec<User>, UserError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users ORDER BY id ASC",
            USER_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(users)
    }

    pub async fn find(&self, id: i64) -> Result<User, UserError> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(UserError::NotFound)
    }

    pub async fn create(&self, record: &UserRecord, is_admin: bool) -> Result<User, UserError> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO users (name, email, password, phone, dob, is_admin)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.name)
        .bind(&record.email)
        .bind(&record.password_hash)
        .bind(&record.phone)
        .bind(&record.dob)
        .bind(is_admin)
        .execute(&self.db)
        .await?;

        let user = self.find(inserted.last_insert_rowid()).await?;
        info!(user_id = user.id, "User created by admin");
        Ok(user)
    }

    pub async fn update(&self, id: i64, record: &UserRecord) -> Result<User, UserError> {
        let updated = sqlx::query(
            r#"
            UPDATE users
            SET name = ?, email = ?, password = ?, phone = ?, dob = ?, updated_at = datetime('now')
            WHERE id = ?
            "#,
        )
        .bind(&record.name)
        .bind(&record.email)
        .bind(&record.password_hash)
        .bind(&record.phone)
        .bind(&record.dob)
        .bind(id)
        .execute(&self.db)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(UserError::NotFound);
        }

        self.find(id).await
    }

    /// Sets the admin flag on the account with this email
    pub async fn promote_by_email(&self, email: &str) -> Result<User, UserError> {
        let id: Option<i64> =
            sqlx::query_scalar("SELECT id FROM users WHERE lower(email) = lower(?)")
                .bind(email.trim())
                .fetch_optional(&self.db)
                .await?;
        let id = id.ok_or(UserError::NotFound)?;

        sqlx::query("UPDATE users SET is_admin = 1, updated_at = datetime('now') WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;

        info!(user_id = id, "User promoted to admin");
        self.find(id).await
    }

    /// Hard delete. Tokens and notifications go in the same transaction.
    pub async fn delete(&self, id: i64) -> Result<(), UserError> {
        let mut tx = self.db.begin().await?;

        sqlx::query("DELETE FROM personal_access_tokens WHERE user_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM notifications WHERE user_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if deleted.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(UserError::NotFound);
        }

        tx.commit().await.map_err(|e| {
            error!(error = %e, user_id = id, "Failed to commit user deletion");
            UserError::Database(e)
        })?;

        info!(user_id = id, "User deleted");
        Ok(())
    }
}
