// src/services/aws.rs
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_sesv2::config::{Credentials, Region};
use aws_sdk_sesv2::types::{Body as SesBody, Content, Destination, EmailContent, Message};
use aws_sdk_sesv2::Client as SesClient;
use tracing::{error, info};

use crate::common::config::SesSettings;
use crate::services::mailer::{MailError, MailMessage, Mailer};

/// Delivers mail through AWS SES v2
#[derive(Debug)]
pub struct SesMailer {
    settings: SesSettings,
}

impl SesMailer {
    pub fn new(settings: SesSettings) -> Self {
        Self { settings }
    }

    /// Initialize SES client with the configured credentials
    async fn get_ses_client(&self) -> Result<SesClient, MailError> {
        if self.settings.from_email.is_empty() {
            return Err(MailError::NotConfigured(
                "SES from email not configured".to_string(),
            ));
        }

        let credentials = Credentials::new(
            &self.settings.access_key_id,
            &self.settings.secret_access_key,
            None,
            None,
            "environment",
        );

        let region = Region::new(self.settings.region.clone());

        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(region)
            .credentials_provider(credentials)
            .load()
            .await;

        Ok(SesClient::new(&aws_config))
    }
}

#[async_trait]
impl Mailer for SesMailer {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        let client = self.get_ses_client().await?;

        let destination = Destination::builder()
            .set_to_addresses(Some(message.to.clone()))
            .build();

        let subject_content = Content::builder()
            .data(&message.subject)
            .charset("UTF-8")
            .build()
            .map_err(|e| MailError::SendFailed(format!("Failed to build subject: {}", e)))?;

        let body_content = Content::builder()
            .data(&message.html_body)
            .charset("UTF-8")
            .build()
            .map_err(|e| MailError::SendFailed(format!("Failed to build body: {}", e)))?;

        let ses_message = Message::builder()
            .subject(subject_content)
            .body(SesBody::builder().html(body_content).build())
            .build();

        let result = client
            .send_email()
            .from_email_address(&self.settings.from_email)
            .destination(destination)
            .content(EmailContent::builder().simple(ses_message).build())
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, to = ?message.to, "Failed to send email via SES");
                MailError::SendFailed(e.to_string())
            })?;

        info!(
            to = ?message.to,
            message_id = ?result.message_id(),
            "Email sent successfully via SES"
        );

        Ok(())
    }

    fn name(&self) -> &'static str {
        "ses"
    }
}
