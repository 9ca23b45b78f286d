use axum::{routing::get, Router};

use super::handlers;

/// Creates and returns the user management router (admin only)
///
/// # Routes
/// - `GET /api/user` - All users
/// - `POST /api/user` - Create a user
/// - `GET /api/user/:id` - One user
/// - `PUT|PATCH /api/user/:id` - Update a user
/// - `DELETE /api/user/:id` - Delete a user with its tokens and notifications
pub fn user_routes() -> Router {
    Router::new()
        .route("/api/user", get(handlers::index).post(handlers::store))
        .route(
            "/api/user/:id",
            get(handlers::show)
                .put(handlers::update)
                .patch(handlers::update)
                .delete(handlers::destroy),
        )
}
