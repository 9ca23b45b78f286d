// Common validation types, traits and the rule-table engine

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use sqlx::SqlitePool;
use std::collections::BTreeMap;

/// Field name -> failure messages, the shape rendered in error envelopes
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Stored exactly as submitted, so their lengths are measured untrimmed
const UNTRIMMED_FIELDS: &[&str] = &["password", "old_password", "password_confirmation"];

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern must compile")
});

#[derive(Debug)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

#[derive(Debug)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }

    pub fn add_error(&mut self, field: &str, message: &str) {
        self.is_valid = false;
        self.errors.push(ValidationError {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn has_error(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn into_field_errors(self) -> FieldErrors {
        let mut map = FieldErrors::new();
        for error in self.errors {
            map.entry(error.field).or_default().push(error.message);
        }
        map
    }
}

// ============================================================================
// Rule tables
// ============================================================================

/// A single field constraint
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    Required,
    String,
    Integer,
    Numeric,
    Email,
    Date,
    /// Character length for text, value bound for integer/numeric fields
    Min(u64),
    Max(u64),
    Digits(usize),
    DigitsBetween(usize, usize),
    /// No other row in `table` may hold the same `column` value.
    /// `ignore_id` excludes the record being updated.
    Unique {
        table: &'static str,
        column: &'static str,
        ignore_id: Option<i64>,
    },
}

#[derive(Debug, Clone)]
struct FieldRules {
    name: &'static str,
    rules: Vec<Rule>,
}

/// Ordered mapping of field name to constraint list
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    fields: Vec<FieldRules>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: &'static str, rules: Vec<Rule>) -> Self {
        self.fields.push(FieldRules { name, rules });
        self
    }

    /// Runs every rule that does not need the database
    pub fn check(&self, input: &Value) -> ValidationResult {
        let mut result = ValidationResult::new();

        for field in &self.fields {
            let attribute = field.name.replace('_', " ");
            let value = input.get(field.name);

            if !is_present(value) {
                if field.rules.contains(&Rule::Required) {
                    result.add_error(
                        field.name,
                        &format!("The {} field is required.", attribute),
                    );
                }
                continue;
            }

            let value = match value {
                Some(v) => v,
                None => continue,
            };
            let numeric = field
                .rules
                .iter()
                .any(|r| matches!(r, Rule::Integer | Rule::Numeric));
            let trim = !UNTRIMMED_FIELDS.contains(&field.name);

            for rule in &field.rules {
                if let Some(message) = check_rule(rule, &attribute, value, numeric, trim) {
                    result.add_error(field.name, &message);
                }
            }
        }

        result
    }

    /// Runs all rules, including uniqueness lookups.
    /// Uniqueness is only queried for fields that passed their other rules.
    pub async fn check_with_db(
        &self,
        input: &Value,
        pool: &SqlitePool,
    ) -> Result<ValidationResult, sqlx::Error> {
        let mut result = self.check(input);

        for field in &self.fields {
            if result.has_error(field.name) {
                continue;
            }
            let Some(text) = input.get(field.name).and_then(value_text) else {
                continue;
            };

            for rule in &field.rules {
                if let Rule::Unique {
                    table,
                    column,
                    ignore_id,
                } = rule
                {
                    if value_is_taken(pool, table, column, *ignore_id, text.trim()).await? {
                        result.add_error(
                            field.name,
                            &format!("The {} has already been taken.", field.name.replace('_', " ")),
                        );
                    }
                }
            }
        }

        Ok(result)
    }
}

async fn value_is_taken(
    pool: &SqlitePool,
    table: &str,
    column: &str,
    ignore_id: Option<i64>,
    value: &str,
) -> Result<bool, sqlx::Error> {
    // table and column come from static rule tables, never from input
    let count: i64 = match ignore_id {
        Some(id) => {
            sqlx::query_scalar(&format!(
                "SELECT COUNT(*) FROM {} WHERE {} = ? AND id != ?",
                table, column
            ))
            .bind(value)
            .bind(id)
            .fetch_one(pool)
            .await?
        }
        None => {
            sqlx::query_scalar(&format!(
                "SELECT COUNT(*) FROM {} WHERE {} = ?",
                table, column
            ))
            .bind(value)
            .fetch_one(pool)
            .await?
        }
    };

    Ok(count > 0)
}

fn text_length(value: &Value, trim: bool) -> Option<u64> {
    let text = value_text(value)?;
    let text = if trim { text.trim() } else { text.as_str() };
    Some(text.chars().count() as u64)
}

fn check_rule(
    rule: &Rule,
    attribute: &str,
    value: &Value,
    numeric: bool,
    trim: bool,
) -> Option<String> {
    match rule {
        Rule::Required | Rule::Unique { .. } => None,
        Rule::String => (!value.is_string())
            .then(|| format!("The {} field must be a string.", attribute)),
        Rule::Integer => (!is_integer(value))
            .then(|| format!("The {} field must be an integer.", attribute)),
        Rule::Numeric => (numeric_value(value).is_none())
            .then(|| format!("The {} field must be a number.", attribute)),
        Rule::Email => {
            let valid = value_text(value)
                .map(|t| EMAIL_REGEX.is_match(t.trim()))
                .unwrap_or(false);
            (!valid).then(|| format!("The {} field must be a valid email address.", attribute))
        }
        Rule::Date => {
            let valid = value_text(value).and_then(|t| parse_date(&t)).is_some();
            (!valid).then(|| format!("The {} field must be a valid date.", attribute))
        }
        Rule::Min(min) => {
            if numeric {
                let n = numeric_value(value)?;
                (n < *min as f64).then(|| format!("The {} field must be at least {}.", attribute, min))
            } else {
                let len = text_length(value, trim)?;
                (len < *min).then(|| {
                    format!("The {} field must be at least {} characters.", attribute, min)
                })
            }
        }
        Rule::Max(max) => {
            if numeric {
                let n = numeric_value(value)?;
                (n > *max as f64)
                    .then(|| format!("The {} field must not be greater than {}.", attribute, max))
            } else {
                let len = text_length(value, trim)?;
                (len > *max).then(|| {
                    format!(
                        "The {} field must not be greater than {} characters.",
                        attribute, max
                    )
                })
            }
        }
        Rule::Digits(count) => {
            let ok = value_text(value)
                .map(|t| is_digits(&t) && t.len() == *count)
                .unwrap_or(false);
            (!ok).then(|| format!("The {} field must be {} digits.", attribute, count))
        }
        Rule::DigitsBetween(min, max) => {
            let ok = value_text(value)
                .map(|t| is_digits(&t) && t.len() >= *min && t.len() <= *max)
                .unwrap_or(false);
            (!ok).then(|| {
                format!(
                    "The {} field must be between {} and {} digits.",
                    attribute, min, max
                )
            })
        }
    }
}

fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(_) => true,
    }
}

fn is_integer(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.is_i64() || n.is_u64(),
        Value::String(s) => s.trim().parse::<i64>().is_ok(),
        _ => false,
    }
}

fn is_digits(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}

fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` and RFC 3339
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
}

// ============================================================================
// Typed accessors for validated input
// ============================================================================

/// Trimmed text value of a field, `None` when absent or blank
pub fn field_text(input: &Value, key: &str) -> Option<String> {
    input
        .get(key)
        .and_then(value_text)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn field_number(input: &Value, key: &str) -> Option<f64> {
    input.get(key).and_then(numeric_value)
}
