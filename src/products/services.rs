use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{error, info, warn};

use super::models::{Product, ProductInput, ProductPage, PRODUCT_COLUMNS};
use crate::common::ApiError;
use crate::services::storage::StoredPhoto;

/// Rows per page of the web listing
pub const PER_PAGE: i64 = 10;

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("Product not found")]
    NotFound,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Product not found")]
    NotFound,

    #[error("Product already published")]
    AlreadyPublished,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<ProductError> for ApiError {
    fn from(e: ProductError) -> Self {
        match e {
            ProductError::NotFound => ApiError::NotFound("Product not found".to_string()),
            ProductError::Database(e) => ApiError::DatabaseError(e),
        }
    }
}

pub struct ProductsService {
    db: SqlitePool,
}

impl ProductsService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    // ============================================================================
    // Queries
    // ============================================================================

    /// All products, newest first
    pub async fn list_newest_first(&self) -> Result<Vec<Product>, ProductError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products ORDER BY id DESC",
            PRODUCT_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(products)
    }

    /// One page in ascending id order. Pages start at 1; out-of-range pages are empty.
    pub async fn paginate(&self, page: i64) -> Result<ProductPage, ProductError> {
        let page = page.max(1);

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.db)
            .await?;

        let items = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products ORDER BY id ASC LIMIT ? OFFSET ?",
            PRODUCT_COLUMNS
        ))
        .bind(PER_PAGE)
        .bind((page - 1) * PER_PAGE)
        .fetch_all(&self.db)
        .await?;

        Ok(ProductPage {
            items,
            current_page: page,
            last_page: ((total + PER_PAGE - 1) / PER_PAGE).max(1),
            total,
        })
    }

    pub async fn find(&self, id: i64) -> Result<Product, ProductError> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE id = ?",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(ProductError::NotFound)
    }

    // ============================================================================
    // Mutations
    // ============================================================================

    pub async fn create(
        &self,
        input: &ProductInput,
        photo: Option<&StoredPhoto>,
    ) -> Result<Product, ProductError> {
        let result = sqlx::query(
            r#"
            INSERT INTO products (name, price, photo, photo_original_name)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&input.name)
        .bind(input.price)
        .bind(photo.map(|p| p.key.as_str()))
        .bind(photo.map(|p| p.original_name.as_str()))
        .execute(&self.db)
        .await
        .map_err(|e| {
            error!(error = %e, name = %input.name, "Failed to insert product");
            e
        })?;

        let product = self.find(result.last_insert_rowid()).await?;
        info!(product_id = product.id, price = product.price, "Product created");

        Ok(product)
    }

    /// Applies the new name and price. A new photo replaces the old one,
    /// whose key is returned so the caller can remove the file.
    pub async fn update(
        &self,
        id: i64,
        input: &ProductInput,
        photo: Option<&StoredPhoto>,
    ) -> Result<(Product, Option<String>), ProductError> {
        let existing = self.find(id).await?;

        let replaced = match photo {
            Some(photo) => {
                sqlx::query(
                    r#"
                    UPDATE products
                    SET name = ?, price = ?, photo = ?, photo_original_name = ?,
                        updated_at = datetime('now')
                    WHERE id = ?
                    "#,
                )
                .bind(&input.name)
                .bind(input.price)
                .bind(&photo.key)
                .bind(&photo.original_name)
                .bind(id)
                .execute(&self.db)
                .await?;
                existing.photo
            }
            None => {
                sqlx::query(
                    "UPDATE products SET name = ?, price = ?, updated_at = datetime('now') WHERE id = ?",
                )
                .bind(&input.name)
                .bind(input.price)
                .bind(id)
                .execute(&self.db)
                .await?;
                None
            }
        };

        let product = self.find(id).await?;
        info!(product_id = id, price = product.price, "Product updated");

        Ok((product, replaced))
    }

    /// Hard delete; returns the removed row so its photo can be cleaned up
    pub async fn delete(&self, id: i64) -> Result<Product, ProductError> {
        let product = self.find(id).await?;

        sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;

        info!(product_id = id, "Product deleted");
        Ok(product)
    }

    /// Marks a product published exactly once
    ///
    /// The conditional update is atomic, so of two concurrent calls only
    /// one can succeed.
    pub async fn publish(&self, id: i64) -> Result<Product, PublishError> {
        let result = sqlx::query(
            "UPDATE products SET published_at = datetime('now'), updated_at = datetime('now') \
             WHERE id = ? AND published_at IS NULL",
        )
        .bind(id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM products WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.db)
                .await?;

            return match exists {
                Some(_) => {
                    warn!(product_id = id, "Publish skipped: product already published");
                    Err(PublishError::AlreadyPublished)
                }
                None => {
                    warn!(product_id = id, "Publish failed: product not found");
                    Err(PublishError::NotFound)
                }
            };
        }

        let product = self.find(id).await.map_err(|e| match e {
            ProductError::NotFound => PublishError::NotFound,
            ProductError::Database(e) => PublishError::Database(e),
        })?;

        info!(product_id = id, published_at = ?product.published_at, "Product published");
        Ok(product)
    }
}
