//! Rule tables for the account endpoints

use crate::common::{Rule, RuleSet};

pub fn register_rules() -> RuleSet {
    RuleSet::new()
        .field("name", vec![Rule::Required, Rule::Max(50)])
        .field(
            "email",
            vec![
                Rule::Required,
                Rule::Max(50),
                Rule::Email,
                Rule::Unique {
                    table: "users",
                    column: "email",
                    ignore_id: None,
                },
            ],
        )
        .field(
            "password",
            vec![Rule::Required, Rule::String, Rule::Min(8), Rule::Max(16)],
        )
}

pub fn login_rules() -> RuleSet {
    RuleSet::new()
        .field("email", vec![Rule::Required, Rule::Max(50)])
        .field(
            "password",
            vec![Rule::Required, Rule::String, Rule::Min(8), Rule::Max(16)],
        )
}

pub fn change_password_rules() -> RuleSet {
    RuleSet::new()
        .field(
            "old_password",
            vec![Rule::Required, Rule::String, Rule::Max(16)],
        )
        .field(
            "password",
            vec![Rule::Required, Rule::String, Rule::Min(8), Rule::Max(16)],
        )
}

/// `user_id` is the caller, whose own email does not count as taken
pub fn profile_update_rules(user_id: i64) -> RuleSet {
    RuleSet::new()
        .field("name", vec![Rule::Required, Rule::Max(100), Rule::String])
        .field("phone", vec![Rule::Required, Rule::Integer, Rule::Digits(10)])
        .field("dob", vec![Rule::Required])
        .field(
            "email",
            vec![
                Rule::Required,
                Rule::Email,
                Rule::Unique {
                    table: "users",
                    column: "email",
                    ignore_id: Some(user_id),
                },
            ],
        )
}
