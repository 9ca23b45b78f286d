use serde::Serialize;
use sqlx::FromRow;

/// Product database model
///
/// `price` is stored in minor units (the submitted amount times 100).
#[derive(FromRow, Serialize, Debug, Clone, PartialEq)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: i64,
    /// Storage key of the photo, e.g. `products/P_....jpg`
    pub photo: Option<String>,
    /// Client filename of the uploaded photo, kept for display only
    pub photo_original_name: Option<String>,
    pub published_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

pub const PRODUCT_COLUMNS: &str =
    "id, name, price, photo, photo_original_name, published_at, created_at, updated_at";

/// API representation of a product; timestamps other than `published_at` are left out
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ProductResource {
    pub id: i64,
    pub name: String,
    pub price: i64,
    pub photo: Option<String>,
    pub published_at: Option<String>,
}

impl From<Product> for ProductResource {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            price: product.price,
            photo: product.photo,
            published_at: product.published_at,
        }
    }
}

/// Validated fields for create and update
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub name: String,
    /// Already scaled to minor units
    pub price: i64,
}

/// One page of the web listing
#[derive(Debug, Clone)]
pub struct ProductPage {
    pub items: Vec<Product>,
    pub current_page: i64,
    pub last_page: i64,
    pub total: i64,
}

/// Largest accepted price in major units; its minor-unit value fits an `i64`
pub const MAX_PRICE: u64 = 1_000_000_000_000;

/// Scales a submitted price to minor units. Inputs are bounded by [`MAX_PRICE`].
pub fn to_minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Formats minor units as a decimal amount, e.g. `123400` -> `1234.00`
pub fn format_price(minor: i64) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let abs = minor.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}
