use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{json, Value};
use tracing::{error, info};

use super::{create_product, delete_product, update_product};
use crate::auth::policy::{authorize, can_manage_products};
use crate::auth::AuthedUser;
use crate::common::{ApiError, ApiResponse, RequestInput, SharedState};
use crate::products::models::ProductResource;
use crate::products::services::ProductsService;
use crate::queue::Job;

/// GET /api/products - All products, newest first
pub async fn index(
    Extension(state_lock): Extension<SharedState>,
) -> Result<ApiResponse<Vec<ProductResource>>, ApiError> {
    let state = state_lock.read().await.clone();

    let products = ProductsService::new(state.db.clone())
        .list_newest_first()
        .await?
        .into_iter()
        .map(ProductResource::from)
        .collect();

    Ok(ApiResponse::ok(products, "Products retrieved successfully."))
}

/// GET /api/products/:id
pub async fn show(
    Extension(state_lock): Extension<SharedState>,
    Path(id): Path<i64>,
) -> Result<ApiResponse<ProductResource>, ApiError> {
    let state = state_lock.read().await.clone();

    let product = ProductsService::new(state.db.clone()).find(id).await?;

    Ok(ApiResponse::ok(
        ProductResource::from(product),
        "Product retrieved successfully.",
    ))
}

/// POST /api/products (admin)
pub async fn store(
    Extension(state_lock): Extension<SharedState>,
    authed: AuthedUser,
    input: RequestInput,
) -> Result<ApiResponse<ProductResource>, ApiError> {
    authorize(can_manage_products(&authed))?;
    let state = state_lock.read().await.clone();

    let product = create_product(&state, input).await?;
    info!(user_id = authed.id, product_id = product.id, "Product created via API");

    Ok(ApiResponse::created(
        ProductResource::from(product),
        "Product created successfully.",
    ))
}

/// PUT /api/products/:id (admin)
pub async fn update(
    Extension(state_lock): Extension<SharedState>,
    authed: AuthedUser,
    Path(id): Path<i64>,
    input: RequestInput,
) -> Result<ApiResponse<ProductResource>, ApiError> {
    authorize(can_manage_products(&authed))?;
    let state = state_lock.read().await.clone();

    let product = update_product(&state, id, input).await?;
    info!(user_id = authed.id, product_id = id, "Product updated via API");

    Ok(ApiResponse::ok(
        ProductResource::from(product),
        "Product updated successfully.",
    ))
}

/// DELETE /api/products/:id (admin) - 204 with an empty body
pub async fn destroy(
    Extension(state_lock): Extension<SharedState>,
    authed: AuthedUser,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    authorize(can_manage_products(&authed))?;
    let state = state_lock.read().await.clone();

    delete_product(&state, id).await?;
    info!(user_id = authed.id, product_id = id, "Product deleted via API");

    Ok(StatusCode::NO_CONTENT.into_response())
}

/// POST /api/products/:id/publish (admin) - Queues the publish job
///
/// Answers 202 with the job id; publishing an already published product is a no-op.
pub async fn publish(
    Extension(state_lock): Extension<SharedState>,
    authed: AuthedUser,
    Path(id): Path<i64>,
) -> Result<ApiResponse<Value>, ApiError> {
    authorize(can_manage_products(&authed))?;
    let state = state_lock.read().await.clone();

    ProductsService::new(state.db.clone()).find(id).await?;

    let job_id = state
        .queue
        .dispatch(Job::ProductPublish { product_id: id })
        .map_err(|e| {
            error!(error = %e, product_id = id, "Failed to queue publish job");
            ApiError::InternalServer("Failed to queue publish job".to_string())
        })?;
    info!(user_id = authed.id, product_id = id, job_id = %job_id, "Product publish queued");

    Ok(ApiResponse::with_status(
        json!({ "job_id": job_id }),
        "Product publish queued.",
        StatusCode::ACCEPTED,
    ))
}
