//! Authentication data models

use serde::Serialize;
use sqlx::FromRow;

/// User database model
///
/// The password hash is never serialized.
#[derive(FromRow, Serialize, Debug, Clone)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub phone: Option<String>,
    pub dob: Option<String>,
    pub is_admin: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Columns selected whenever a full `User` is loaded
pub const USER_COLUMNS: &str =
    "id, name, email, password, phone, dob, is_admin, created_at, updated_at";

/// Body of a successful login
#[derive(Serialize, Debug)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub user: User,
}
