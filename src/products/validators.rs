use serde_json::Value;

use super::models::{to_minor_units, ProductInput, MAX_PRICE};
use crate::common::validation::{field_number, field_text};
use crate::common::{Rule, RuleSet, UploadedFile, ValidationResult};
use crate::services::storage::{detect_image_type, MAX_PHOTO_BYTES};

/// Rules shared by create and update
pub fn product_rules() -> RuleSet {
    RuleSet::new()
        .field("name", vec![Rule::Required, Rule::String, Rule::Max(255)])
        .field(
            "price",
            vec![Rule::Required, Rule::Numeric, Rule::Min(0), Rule::Max(MAX_PRICE)],
        )
}

/// Validates the whole submission, including the optional photo
///
/// A `photo` sent as a plain field instead of a file is rejected as not an image.
pub fn validate_product(values: &Value, photo: Option<&UploadedFile>) -> ValidationResult {
    let mut result = product_rules().check(values);

    if let Some(file) = photo {
        if detect_image_type(&file.bytes).is_none() {
            result.add_error("photo", "The photo field must be an image.");
        }
        if file.bytes.len() > MAX_PHOTO_BYTES {
            result.add_error(
                "photo",
                &format!(
                    "The photo field must not be greater than {} kilobytes.",
                    MAX_PHOTO_BYTES / 1024
                ),
            );
        }
    } else if values.get("photo").is_some_and(|v| match v {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }) {
        result.add_error("photo", "The photo field must be an image.");
    }

    result
}

/// Typed view of input that passed [`validate_product`]
pub fn product_input(values: &Value) -> ProductInput {
    ProductInput {
        name: field_text(values, "name").unwrap_or_default(),
        price: to_minor_units(field_number(values, "price").unwrap_or_default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use serde_json::json;

    fn file(bytes: &'static [u8]) -> UploadedFile {
        UploadedFile {
            field: "photo".to_string(),
            file_name: "photo1.jpg".to_string(),
            content_type: Some("image/jpeg".to_string()),
            bytes: Bytes::from_static(bytes),
        }
    }

    #[test]
    fn test_empty_name_only_fails_name() {
        let result = validate_product(&json!({ "name": "", "price": 123 }), None);
        assert!(result.has_error("name"));
        assert!(!result.has_error("price"));
    }

    #[test]
    fn test_price_above_ceiling_is_rejected() {
        let at_limit = validate_product(&json!({ "name": "Big", "price": MAX_PRICE }), None);
        assert!(at_limit.is_valid);
        assert_eq!(to_minor_units(MAX_PRICE as f64), 100_000_000_000_000);

        let over = validate_product(&json!({ "name": "Big", "price": 1e300 }), None);
        assert!(over.has_error("price"));
        assert!(!over.has_error("name"));
    }

    #[test]
    fn test_empty_name_and_price() {
        let result = validate_product(&json!({ "name": "", "price": "" }), None);
        assert!(result.has_error("name"));
        assert!(result.has_error("price"));
    }

    #[test]
    fn test_negative_and_non_numeric_price() {
        assert!(validate_product(&json!({ "name": "A", "price": -1 }), None).has_error("price"));
        assert!(validate_product(&json!({ "name": "A", "price": "ten" }), None).has_error("price"));
    }

    #[test]
    fn test_long_name_rejected() {
        let result = validate_product(&json!({ "name": "x".repeat(256), "price": 1 }), None);
        assert!(result.has_error("name"));
    }

    #[test]
    fn test_photo_must_be_image() {
        let values = json!({ "name": "Lamp", "price": 10 });
        let png = file(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D]);
        assert!(validate_product(&values, Some(&png)).is_valid);

        let text = file(b"definitely not an image");
        assert!(validate_product(&values, Some(&text)).has_error("photo"));

        let as_text = json!({ "name": "Lamp", "price": 10, "photo": "photo1.jpg" });
        assert!(validate_product(&as_text, None).has_error("photo"));
    }

    #[test]
    fn test_product_input_scales_price() {
        let input = product_input(&json!({ "name": " Product 123 ", "price": 1234 }));
        assert_eq!(input.name, "Product 123");
        assert_eq!(input.price, 123400);

        let input = product_input(&json!({ "name": "A", "price": "12.5" }));
        assert_eq!(input.price, 1250);
    }
}
