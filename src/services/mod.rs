// src/services/mod.rs
//
// Shared services used across the domain modules

pub mod aws;
pub mod email;
pub mod mailer;
pub mod monitoring;
pub mod storage;

// Re-export commonly used types for convenience
pub use email::MailTemplates;
pub use mailer::{build_mailer, LogMailer, MailError, MailMessage, Mailer};
pub use storage::{PhotoStorage, StorageError};
