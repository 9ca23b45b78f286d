//! Outbound mail transports
//!
//! Jobs talk to a [`Mailer`] so the transport can be SES in production,
//! the log in development and a recorder in tests.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::common::config::{AppConfig, MailDriver};
use crate::common::safe_email_log;
use crate::services::aws::SesMailer;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail transport not configured: {0}")]
    NotConfigured(String),

    #[error("template error: {0}")]
    Template(String),

    #[error("send failed: {0}")]
    SendFailed(String),
}

/// A rendered message ready for delivery
#[derive(Debug, Clone, PartialEq)]
pub struct MailMessage {
    pub to: Vec<String>,
    pub subject: String,
    pub html_body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError>;

    /// Transport name for logging
    fn name(&self) -> &'static str;
}

/// Writes messages to the log instead of delivering them
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        let recipients: Vec<String> = message.to.iter().map(|to| safe_email_log(to)).collect();
        info!(
            to = ?recipients,
            subject = %message.subject,
            body_len = message.html_body.len(),
            "📧 Mail (log driver)"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// Picks the transport named by `MAIL_DRIVER`
///
/// Falls back to the log driver when SES is selected without credentials.
pub fn build_mailer(config: &AppConfig) -> Arc<dyn Mailer> {
    match (&config.mail_driver, &config.ses) {
        (MailDriver::Ses, Some(settings)) => Arc::new(SesMailer::new(settings.clone())),
        (MailDriver::Ses, None) => {
            warn!("MAIL_DRIVER=ses but AWS SES credentials are missing, using log driver");
            Arc::new(LogMailer)
        }
        (MailDriver::Log, _) => Arc::new(LogMailer),
    }
}
