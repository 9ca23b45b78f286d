//! HTML pages and form posts for products
//!
//! Validation failures redirect back to the form with the field errors
//! carried in the `errors` query parameter. Successful writes redirect to
//! the listing.

use axum::{
    extract::{Extension, Path, Query},
    http::{header::LOCATION, Method, StatusCode},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{error, info, warn};

use super::{create_product, delete_product, update_product};
use crate::auth::policy::{authorize, can_manage_products};
use crate::auth::AuthedUser;
use crate::common::{ApiError, FieldErrors, RequestInput, SharedState};
use crate::products::services::ProductsService;
use crate::products::views;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FormQuery {
    pub errors: Option<String>,
}

impl FormQuery {
    fn field_errors(&self) -> FieldErrors {
        self.errors
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default()
    }
}

/// 302 to `location`
fn redirect(location: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.to_string())]).into_response()
}

/// Sends validation failures back to `form`; other errors pass through
fn redirect_back_on_invalid(form: &str, err: ApiError) -> Result<Response, ApiError> {
    match err {
        ApiError::Validation { errors, .. } => {
            let encoded = serde_json::to_string(&errors).unwrap_or_default();
            Ok(redirect(&format!(
                "{}?errors={}",
                form,
                urlencoding::encode(&encoded)
            )))
        }
        other => Err(other),
    }
}

fn render_failed(e: handlebars::RenderError) -> ApiError {
    error!(error = %e, "Failed to render product page");
    ApiError::InternalServer(format!("template render failed: {}", e))
}

/// GET /products - 10 per page, ascending by id
pub async fn index(
    Extension(state_lock): Extension<SharedState>,
    authed: Option<AuthedUser>,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>, ApiError> {
    let state = state_lock.read().await.clone();

    let page = query
        .page
        .as_deref()
        .and_then(|p| p.trim().parse::<i64>().ok())
        .unwrap_or(1);

    let products = ProductsService::new(state.db.clone()).paginate(page).await?;
    let is_admin = authed.as_ref().is_some_and(can_manage_products);

    let html = views::render_index(&state.views, &products, is_admin).map_err(render_failed)?;
    Ok(Html(html))
}

/// GET /products/create (admin)
pub async fn create_form(
    Extension(state_lock): Extension<SharedState>,
    authed: AuthedUser,
    Query(query): Query<FormQuery>,
) -> Result<Html<String>, ApiError> {
    authorize(can_manage_products(&authed))?;
    let state = state_lock.read().await.clone();

    let html = views::render_create(&state.views, &query.field_errors()).map_err(render_failed)?;
    Ok(Html(html))
}

/// POST /products (admin)
pub async fn store(
    Extension(state_lock): Extension<SharedState>,
    authed: AuthedUser,
    input: RequestInput,
) -> Result<Response, ApiError> {
    authorize(can_manage_products(&authed))?;
    let state = state_lock.read().await.clone();

    match create_product(&state, input).await {
        Ok(product) => {
            info!(user_id = authed.id, product_id = product.id, "Product created via form");
            Ok(redirect("/products"))
        }
        Err(e) => redirect_back_on_invalid("/products/create", e),
    }
}

/// GET /products/:id/edit (admin)
pub async fn edit_form(
    Extension(state_lock): Extension<SharedState>,
    authed: AuthedUser,
    Path(id): Path<i64>,
    Query(query): Query<FormQuery>,
) -> Result<Html<String>, ApiError> {
    authorize(can_manage_products(&authed))?;
    let state = state_lock.read().await.clone();

    let product = ProductsService::new(state.db.clone()).find(id).await?;
    let html = views::render_edit(&state.views, &product, &query.field_errors())
        .map_err(render_failed)?;
    Ok(Html(html))
}

/// PUT /products/:id (admin)
pub async fn update(
    Extension(state_lock): Extension<SharedState>,
    authed: AuthedUser,
    Path(id): Path<i64>,
    input: RequestInput,
) -> Result<Response, ApiError> {
    authorize(can_manage_products(&authed))?;
    let state = state_lock.read().await.clone();

    match update_product(&state, id, input).await {
        Ok(_) => {
            info!(user_id = authed.id, product_id = id, "Product updated via form");
            Ok(redirect("/products"))
        }
        Err(e) => redirect_back_on_invalid(&format!("/products/{}/edit", id), e),
    }
}

/// DELETE /products/:id (admin)
pub async fn destroy(
    Extension(state_lock): Extension<SharedState>,
    authed: AuthedUser,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    authorize(can_manage_products(&authed))?;
    let state = state_lock.read().await.clone();

    delete_product(&state, id).await?;
    info!(user_id = authed.id, product_id = id, "Product deleted via form");

    Ok(redirect("/products"))
}

/// POST /products/:id - HTML forms name the real method in `_method`
pub async fn spoofed(
    state: Extension<SharedState>,
    authed: AuthedUser,
    path: Path<i64>,
    input: RequestInput,
) -> Result<Response, ApiError> {
    match input.method_override() {
        Some(Method::PUT) | Some(Method::PATCH) => update(state, authed, path, input).await,
        Some(Method::DELETE) => destroy(state, authed, path).await,
        other => {
            warn!(method = ?other, product_id = path.0, "Unsupported form method override");
            Ok(StatusCode::METHOD_NOT_ALLOWED.into_response())
        }
    }
}
