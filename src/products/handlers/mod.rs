//! Product handlers
//!
//! `api` serves JSON under `/api/products`, `web` serves the HTML pages and
//! form posts, `files` serves the photo and download endpoints. Both
//! front-ends share the create/update/delete flow below.

pub mod api;
pub mod files;
pub mod web;

use tracing::{error, warn};

use super::models::Product;
use super::services::ProductsService;
use super::validators::{product_input, validate_product};
use crate::common::{ApiError, AppState, RequestInput};
use crate::queue::Job;
use crate::services::storage::StoredPhoto;

async fn store_photo_if_present(
    state: &AppState,
    input: &mut RequestInput,
) -> Result<Option<StoredPhoto>, ApiError> {
    let Some(file) = input.take_file("photo") else {
        return Ok(None);
    };

    let stored = state
        .storage
        .store_photo(&file.bytes, &file.file_name)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to store product photo");
            ApiError::InternalServer(format!("photo storage failed: {}", e))
        })?;

    Ok(Some(stored))
}

/// Validates, stores the optional photo, inserts the row and enqueues the
/// new product notification
pub(crate) async fn create_product(
    state: &AppState,
    mut input: RequestInput,
) -> Result<Product, ApiError> {
    let values = input.values();

    let result = validate_product(&values, input.file("photo"));
    if !result.is_valid {
        return Err(ApiError::validation(result));
    }

    let photo = store_photo_if_present(state, &mut input).await?;

    let service = ProductsService::new(state.db.clone());
    let product = match service.create(&product_input(&values), photo.as_ref()).await {
        Ok(product) => product,
        Err(e) => {
            if let Some(photo) = &photo {
                state.storage.delete(&photo.key).await;
            }
            return Err(e.into());
        }
    };

    if let Err(e) = state.queue.dispatch(Job::NewProductNotify {
        product_id: product.id,
    }) {
        warn!(error = %e, product_id = product.id, "New product notification not queued");
    }

    Ok(product)
}

/// Unknown ids are rejected before the input is validated
pub(crate) async fn update_product(
    state: &AppState,
    id: i64,
    mut input: RequestInput,
) -> Result<Product, ApiError> {
    let service = ProductsService::new(state.db.clone());
    service.find(id).await?;

    let values = input.values();
    let result = validate_product(&values, input.file("photo"));
    if !result.is_valid {
        return Err(ApiError::validation(result));
    }

    let photo = store_photo_if_present(state, &mut input).await?;

    let (product, replaced) = match service
        .update(id, &product_input(&values), photo.as_ref())
        .await
    {
        Ok(updated) => updated,
        Err(e) => {
            if let Some(photo) = &photo {
                state.storage.delete(&photo.key).await;
            }
            return Err(e.into());
        }
    };

    if let Some(old_key) = replaced {
        state.storage.delete(&old_key).await;
    }

    Ok(product)
}

pub(crate) async fn delete_product(state: &AppState, id: i64) -> Result<(), ApiError> {
    let service = ProductsService::new(state.db.clone());
    let product = service.delete(id).await?;

    if let Some(key) = &product.photo {
        state.storage.delete(key).await;
    }

    Ok(())
}
