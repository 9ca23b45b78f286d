use axum::{
    extract::{Extension, Path},
    http::{
        header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE},
        StatusCode,
    },
    response::IntoResponse,
};
use tokio::fs as tokio_fs;
use tracing::{error, warn};

use crate::common::{ApiError, SharedState};
use crate::services::storage::{get_content_type_from_extension, StorageError, PRODUCT_PHOTO_DIR};

/// Filename clients see for the specification document
const SPEC_DOWNLOAD_NAME: &str = "product-specification.pdf";

/// GET /download - The product specification as an attachment
pub async fn download(
    Extension(state_lock): Extension<SharedState>,
) -> Result<impl IntoResponse, ApiError> {
    let state = state_lock.read().await.clone();
    let path = &state.config.spec_file_path;

    let content = match tokio_fs::read(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "Specification file missing");
            return Err(ApiError::NotFound("File not found".to_string()));
        }
        Err(e) => {
            error!(error = %e, path = %path.display(), "Failed to read specification file");
            return Err(ApiError::InternalServer(
                "Failed to read specification file".to_string(),
            ));
        }
    };

    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, "application/pdf".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename={}", SPEC_DOWNLOAD_NAME),
            ),
        ],
        content,
    ))
}

/// GET /photos/:key - Serve a stored product photo
pub async fn serve_photo(
    Extension(state_lock): Extension<SharedState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let state = state_lock.read().await.clone();
    let storage_key = format!("{}/{}", PRODUCT_PHOTO_DIR, key);

    let content = state.storage.read(&storage_key).await.map_err(|e| match e {
        StorageError::NotFound(_) | StorageError::InvalidKey(_) => {
            ApiError::NotFound("Photo not found".to_string())
        }
        StorageError::Io(e) => {
            error!(error = %e, key = %key, "Failed to read photo");
            ApiError::InternalServer("Failed to read photo".to_string())
        }
    })?;

    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, get_content_type_from_extension(&key)),
            (CACHE_CONTROL, "public, max-age=31536000"),
        ],
        content,
    ))
}
