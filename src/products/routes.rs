//! Product routes: JSON API, HTML pages and file endpoints

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{api, files, web};

/// Creates and returns the product router
///
/// # Routes
/// - `GET /api/products` - All products, newest first
/// - `POST /api/products` - Create (admin)
/// - `GET /api/products/:id` - One product
/// - `PUT|PATCH /api/products/:id` - Update (admin)
/// - `DELETE /api/products/:id` - Delete (admin)
/// - `POST /api/products/:id/publish` - Queue the publish job (admin)
/// - `GET /products` - Paginated HTML listing
/// - `GET /products/create`, `POST /products` - Create form (admin)
/// - `GET /products/:id/edit`, `PUT /products/:id` - Edit form (admin)
/// - `DELETE /products/:id` - Delete (admin)
/// - `POST /products/:id` - Form post with `_method` override
/// - `GET /photos/:key` - Stored product photo
/// - `GET /download` - Product specification PDF
pub fn product_routes() -> Router {
    Router::new()
        .route("/api/products", get(api::index).post(api::store))
        .route(
            "/api/products/:id",
            get(api::show)
                .put(api::update)
                .patch(api::update)
                .delete(api::destroy),
        )
        .route("/api/products/:id/publish", post(api::publish))
        .route("/products", get(web::index).post(web::store))
        .route("/products/create", get(web::create_form))
        .route("/products/:id/edit", get(web::edit_form))
        .route(
            "/products/:id",
            post(web::spoofed).put(web::update).delete(web::destroy),
        )
        .route("/photos/:key", get(files::serve_photo))
        .route("/download", get(files::download))
}
