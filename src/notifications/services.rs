use serde_json::json;
use sqlx::SqlitePool;
use tracing::debug;

use super::models::{Notification, NEW_PRODUCT_CREATED};
use crate::products::models::{format_price, Product};

/// Ids of users carrying the admin flag
pub async fn admin_user_ids(pool: &SqlitePool) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar("SELECT id FROM users WHERE is_admin = 1 ORDER BY id")
        .fetch_all(pool)
        .await
}

/// Stores a "new product created" notification for every admin.
/// Returns how many were written.
pub async fn notify_admins(
    pool: &SqlitePool,
    product: &Product,
) -> Result<usize, sqlx::Error> {
    let admins = admin_user_ids(pool).await?;
    let data = json!({
        "product_id": product.id,
        "name": product.name,
        "price": format_price(product.price),
    })
    .to_string();

    let mut tx = pool.begin().await?;
    for user_id in &admins {
        sqlx::query("INSERT INTO notifications (user_id, kind, data) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(NEW_PRODUCT_CREATED)
            .bind(&data)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    debug!(product_id = product.id, count = admins.len(), "Stored admin notifications");
    Ok(admins.len())
}

/// Notifications addressed to a user, newest first
pub async fn list_for_user(pool: &SqlitePool, user_id: i64) -> Result<Vec<Notification>, sqlx::Error> {
    sqlx::query_as::<_, Notification>(
        r#"
        SELECT id, user_id, kind, data, read_at, created_at
        FROM notifications
        WHERE user_id = ?
        ORDER BY id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}
