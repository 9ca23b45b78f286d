//! Authentication routes

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

/// Creates and returns the authentication router
///
/// # Routes
/// - `POST /api/register` - Create an account
/// - `POST /api/login` - Issue a bearer token
/// - `GET /api/logout` - Revoke the presented token
/// - `GET /api/profile` - Current user
/// - `POST /api/change-password` - Replace the password after checking the old one
/// - `POST /api/profile-update` - Update name, phone, date of birth and email
pub fn auth_routes() -> Router {
    Router::new()
        .route("/api/register", post(handlers::register))
        .route("/api/login", post(handlers::login))
        .route("/api/logout", get(handlers::logout))
        .route("/api/profile", get(handlers::profile))
        .route("/api/change-password", post(handlers::change_password))
        .route("/api/profile-update", post(handlers::profile_update))
}
