//! Environment configuration
//!
//! Values come from the process environment (a `.env` file is loaded by the
//! binaries before this runs). Every key has a development default.

use std::collections::HashSet;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Outbound mail transport selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailDriver {
    /// Write mail to the log only
    Log,
    /// Deliver through AWS SES
    Ses,
}

#[derive(Debug, Clone)]
pub struct SesSettings {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
    pub from_email: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    /// Root directory for uploaded files; photos live under `products/`
    pub storage_dir: PathBuf,
    /// The static document served by `GET /download`
    pub spec_file_path: PathBuf,
    /// Lower-cased emails that get the admin flag when an admin creates their account
    pub admin_emails: HashSet<String>,
    pub mail_driver: MailDriver,
    /// Recipient of the "new product created" email
    pub notify_email: String,
    pub ses: Option<SesSettings>,
    pub queue_max_attempts: u32,
    pub queue_backoff: Duration,
    pub sentry_dsn: Option<String>,
    /// Adds `Secure` to the session cookie set on login
    pub cookie_secure: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let admin_emails_raw = env::var("ADMIN_EMAILS").unwrap_or_default();

        let mail_driver = match env::var("MAIL_DRIVER")
            .unwrap_or_else(|_| "log".to_string())
            .to_lowercase()
            .as_str()
        {
            "ses" => MailDriver::Ses,
            _ => MailDriver::Log,
        };

        let ses = match (
            env::var("AWS_ACCESS_KEY_ID").ok(),
            env::var("AWS_SECRET_ACCESS_KEY").ok(),
            env::var("AWS_SES_FROM_EMAIL").ok(),
        ) {
            (Some(access_key_id), Some(secret_access_key), Some(from_email)) => Some(SesSettings {
                access_key_id,
                secret_access_key,
                region: env::var("AWS_SES_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
                from_email,
            }),
            _ => None,
        };

        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://catalog.db".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(8080),
            cors_origins: env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3000,http://localhost:5173".to_string())
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
            storage_dir: PathBuf::from(
                env::var("STORAGE_DIR").unwrap_or_else(|_| "./storage".to_string()),
            ),
            spec_file_path: PathBuf::from(
                env::var("SPEC_FILE_PATH")
                    .unwrap_or_else(|_| "./public/files/product-specification.pdf".to_string()),
            ),
            admin_emails: parse_admin_emails(&admin_emails_raw),
            mail_driver,
            notify_email: env::var("MAIL_NOTIFY_ADDRESS")
                .unwrap_or_else(|_| "admin@admin.com".to_string()),
            ses,
            queue_max_attempts: env::var("QUEUE_MAX_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(3),
            queue_backoff: Duration::from_millis(
                env::var("QUEUE_BACKOFF_MS")
                    .ok()
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(1_000),
            ),
            sentry_dsn: env::var("SENTRY_DSN").ok().filter(|dsn| !dsn.is_empty()),
            cookie_secure: env::var("SESSION_COOKIE_SECURE")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true"))
                .unwrap_or(false),
        }
    }

    pub fn is_admin_email(&self, email: &str) -> bool {
        self.admin_emails.contains(&email.trim().to_lowercase())
    }
}

/// Parse admin emails from a comma-separated list
pub fn parse_admin_emails(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
