// src/services/storage.rs
//! Local disk storage for uploaded product photos
//!
//! Files are written under `<root>/products/` with a server-generated name.
//! The client's filename is never used as a path component.

use infer::Infer;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs as tokio_fs;
use tracing::{error, info, warn};

use crate::common::generate_photo_key;

/// Directory (and key prefix) holding product photos
pub const PRODUCT_PHOTO_DIR: &str = "products";

/// Upper bound for an uploaded photo
pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    #[error("file not found: {0}")]
    NotFound(String),

    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A photo accepted by [`PhotoStorage::store_photo`]
#[derive(Debug, Clone)]
pub struct StoredPhoto {
    /// Storage key, e.g. `products/P_8Z1K....png`
    pub key: String,
    pub original_name: String,
}

#[derive(Debug, Clone)]
pub struct PhotoStorage {
    root: PathBuf,
}

impl PhotoStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes an already validated image and returns its key
    pub async fn store_photo(
        &self,
        data: &[u8],
        original_name: &str,
    ) -> Result<StoredPhoto, StorageError> {
        let extension = image_extension(data)
            .or_else(|| get_extension_from_filename(original_name))
            .unwrap_or("jpg");
        let key = format!("{}/{}.{}", PRODUCT_PHOTO_DIR, generate_photo_key(), extension);

        let dir = self.root.join(PRODUCT_PHOTO_DIR);
        tokio_fs::create_dir_all(&dir).await?;

        let path = self.root.join(&key);
        tokio_fs::write(&path, data).await.map_err(|e| {
            error!(error = %e, file_path = %path.display(), "Failed to save photo file");
            StorageError::Io(e)
        })?;

        info!(key = %key, size = data.len(), "Photo stored");

        Ok(StoredPhoto {
            key,
            original_name: original_name.to_string(),
        })
    }

    pub async fn read(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(key)?;
        match tokio_fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    pub async fn exists(&self, key: &str) -> bool {
        match self.resolve(key) {
            Ok(path) => tokio_fs::try_exists(path).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Best effort removal; a missing file is not an error
    pub async fn delete(&self, key: &str) {
        let path = match self.resolve(key) {
            Ok(path) => path,
            Err(e) => {
                warn!(error = %e, "Refusing to delete file outside storage");
                return;
            }
        };

        match tokio_fs::remove_file(&path).await {
            Ok(()) => info!(key = %key, "Photo deleted"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(error = %e, key = %key, "Failed to delete photo"),
        }
    }

    /// Maps a key to a path, rejecting anything that escapes the photo directory
    fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        let name = key
            .strip_prefix(PRODUCT_PHOTO_DIR)
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(key);

        if name.is_empty() || sanitize_filename(name) != name {
            return Err(StorageError::InvalidKey(key.to_string()));
        }

        Ok(self.root.join(PRODUCT_PHOTO_DIR).join(name))
    }
}

/// MIME type of an accepted image, sniffed from its bytes
pub fn detect_image_type(data: &[u8]) -> Option<&'static str> {
    let info = Infer::new().get(data)?;
    match info.mime_type() {
        "image/jpeg" | "image/jpg" => Some("image/jpeg"),
        "image/png" => Some("image/png"),
        "image/gif" => Some("image/gif"),
        "image/webp" => Some("image/webp"),
        _ => None,
    }
}

fn image_extension(data: &[u8]) -> Option<&'static str> {
    match detect_image_type(data)? {
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => Some("jpg"),
    }
}

pub fn get_content_type_from_extension(filename: &str) -> &'static str {
    match filename.rsplit('.').next().map(|e| e.to_lowercase()).as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

fn get_extension_from_filename(filename: &str) -> Option<&'static str> {
    match filename.rsplit_once('.')?.1.to_lowercase().as_str() {
        "png" => Some("png"),
        "gif" => Some("gif"),
        "webp" => Some("webp"),
        "jpg" | "jpeg" => Some("jpg"),
        _ => None,
    }
}

/// Strips path separators and anything outside `[A-Za-z0-9._-]`
pub fn sanitize_filename(filename: &str) -> String {
    let cleaned = filename
        .replace("..", "")
        .replace('/', "")
        .replace('\\', "")
        .replace('\0', "");

    cleaned
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '-' || *c == '_')
        .take(255)
        .collect()
}
