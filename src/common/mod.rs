// Common module - shared types and utilities across all modules

pub mod config;
pub mod envelope;
pub mod error;
pub mod helpers;
pub mod id_generator;
pub mod input;
pub mod migrations;
pub mod state;
pub mod validation;

#[cfg(test)]
pub mod testing;

// Re-export commonly used types for convenience
pub use config::AppConfig;
pub use envelope::{send_error, send_response, ApiResponse};
pub use error::ApiError;
pub use helpers::{safe_email_log, safe_token_log};
pub use id_generator::*;
pub use input::{RequestInput, UploadedFile};
pub use state::{AppState, SharedState};
pub use validation::{FieldErrors, Rule, RuleSet, ValidationError, ValidationResult};
