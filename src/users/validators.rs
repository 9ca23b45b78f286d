//! Rule tables for admin user management

use crate::common::{Rule, RuleSet};

/// Envelope message for user CRUD validation failures
pub const USER_VALIDATION_MESSAGE: &str = "Validation errors";

/// `ignore_id` is the user being updated, `None` on create
pub fn user_rules(ignore_id: Option<i64>) -> RuleSet {
    RuleSet::new()
        .field(
            "name",
            vec![Rule::Required, Rule::String, Rule::Min(3), Rule::Max(100)],
        )
        .field("dob", vec![Rule::Required, Rule::Date])
        .field(
            "password",
            vec![Rule::Required, Rule::String, Rule::Min(8), Rule::Max(20)],
        )
        .field(
            "phone",
            vec![Rule::Required, Rule::Numeric, Rule::DigitsBetween(3, 15)],
        )
        .field(
            "email",
            vec![
                Rule::Required,
                Rule::Email,
                Rule::Unique {
                    table: "users",
                    column: "email",
                    ignore_id,
                },
            ],
        )
}
