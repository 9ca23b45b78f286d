use serde::{Serialize, Serializer};
use sqlx::FromRow;

/// Kind recorded for notifications sent when a product is created
pub const NEW_PRODUCT_CREATED: &str = "new_product_created";

#[derive(FromRow, Serialize, Debug, Clone)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub kind: String,
    /// Stored as text, rendered as a JSON object
    #[serde(serialize_with = "serialize_json_text")]
    pub data: String,
    pub read_at: Option<String>,
    pub created_at: String,
}

fn serialize_json_text<S: Serializer>(text: &str, serializer: S) -> Result<S::Ok, S::Error> {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(value) => value.serialize(serializer),
        Err(_) => serializer.serialize_str(text),
    }
}
