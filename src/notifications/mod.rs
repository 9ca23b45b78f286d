//! # Notifications Module
//!
//! Database notifications addressed to users, written by background jobs.

pub mod handlers;
pub mod models;
pub mod services;


use axum::{routing::get, Router};

/// - `GET /api/notifications` - The caller's notifications, newest first
pub fn notification_routes() -> Router {
    Router::new().route("/api/notifications", get(handlers::list_notifications))
}
