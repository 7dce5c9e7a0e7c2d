//! Greenlight Email Service
//!
//! Fire-and-forget mail port used by the users domain:
//! - AWS SES integration for production email delivery
//! - Mock email service for testing and development
//! - LocalStack integration for local E2E testing
//! - Named templates rendered from a JSON payload

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod aws_ses;
pub mod mock;
pub mod templates;

pub use templates::{EmailTemplate, RenderedEmail};

#[derive(Error, Debug)]
pub enum EmailError {
    #[error("Email configuration error: {0}")]
    Configuration(String),

    #[error("Email validation error: {0}")]
    Validation(String),

    #[error("Email template error: {0}")]
    Template(String),

    #[error("AWS SES error: {0}")]
    AwsSes(String),
}

/// Email message to be sent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub from: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub body_text: String,
    pub body_html: Option<String>,
    pub metadata: HashMap<String, String>,
}

impl EmailMessage {
    pub fn new(to: String, from: String, subject: String, body_text: String) -> Self {
        Self {
            to,
            from,
            reply_to: None,
            subject,
            body_text,
            body_html: None,
            metadata: HashMap::new(),
        }
    }

    pub fn with_html(mut self, body_html: String) -> Self {
        self.body_html = Some(body_html);
        self
    }

    pub fn with_reply_to(mut self, reply_to: String) -> Self {
        self.reply_to = Some(reply_to);
        self
    }

    /// Add metadata for tracking
    pub fn with_metadata(mut self, key: String, value: String) -> Self {
        self.metadata.insert(key, value);
        self
    }
}

/// Email delivery receipt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailReceipt {
    pub message_id: String,
    pub sent_at: DateTime<Utc>,
    pub provider: String,
    pub metadata: HashMap<String, String>,
}

/// Email service configuration
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// Email service provider (ses, mock)
    pub provider: String,
    /// AWS region for SES
    pub aws_region: Option<String>,
    /// AWS endpoint URL (for LocalStack)
    pub aws_endpoint_url: Option<String>,
    pub default_from: String,
    /// Enable email sending (can disable for testing)
    pub enabled: bool,
    /// Base URL for the application (used in activation links)
    pub app_base_url: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            provider: "mock".to_string(),
            aws_region: None,
            aws_endpoint_url: None,
            default_from: "Greenlight <no-reply@greenlight.local>".to_string(),
            enabled: true,
            app_base_url: "http://localhost:4000".to_string(),
        }
    }
}

impl EmailConfig {
    /// Create email config from environment variables
    pub fn from_env() -> Result<Self, EmailError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, EmailError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let enabled = match lookup("EMAIL_ENABLED") {
            Some(raw) => raw.parse().map_err(|_| {
                EmailError::Configuration(format!("EMAIL_ENABLED must be true or false, got {raw:?}"))
            })?,
            None => defaults.enabled,
        };

        Ok(Self {
            provider: lookup("EMAIL_PROVIDER").unwrap_or(defaults.provider),
            aws_region: lookup("AWS_REGION"),
            aws_endpoint_url: lookup("AWS_ENDPOINT_URL"),
            default_from: lookup("FROM_EMAIL").unwrap_or(defaults.default_from),
            enabled,
            app_base_url: lookup("APP_BASE_URL").unwrap_or(defaults.app_base_url),
        })
    }
}

/// Email service trait for different implementations
#[async_trait::async_trait]
pub trait EmailService: Send + Sync {
    async fn send_email(&self, message: EmailMessage) -> Result<EmailReceipt, EmailError>;

    /// Return the default "from" address for outgoing emails
    fn default_from(&self) -> String;

    /// Return the application base URL for building links
    fn app_base_url(&self) -> &str;

    /// Render `template` with `payload` and send it to `to`
    async fn send_template(
        &self,
        to: &str,
        template: EmailTemplate,
        payload: &serde_json::Value,
    ) -> Result<EmailReceipt, EmailError> {
        let rendered = template.render(payload, self.app_base_url())?;

        let message = EmailMessage::new(
            to.to_string(),
            self.default_from(),
            rendered.subject,
            rendered.body_text,
        )
        .with_html(rendered.body_html)
        .with_metadata("email_type".to_string(), template.name().to_string());

        self.send_email(message).await
    }
}

/// Email service factory
pub struct EmailServiceFactory;

impl EmailServiceFactory {
    /// Create email service based on configuration
    pub async fn create(config: EmailConfig) -> Result<Arc<dyn EmailService>, EmailError> {
        if !config.enabled {
            tracing::info!("Email service disabled, using mock implementation");
            return Ok(Arc::new(mock::MockEmailService::new_disabled()));
        }

        match config.provider.as_str() {
            "ses" | "aws-ses" => {
                tracing::info!("Creating AWS SES email service");
                let ses_service = aws_ses::SesEmailService::new(config).await?;
                Ok(Arc::new(ses_service))
            }
            "mock" => {
                tracing::info!("Creating mock email service");
                Ok(Arc::new(mock::MockEmailService::with_config(&config)))
            }
            provider => Err(EmailError::Configuration(format!(
                "Unknown email provider: {}. Supported providers: ses, mock",
                provider
            ))),
        }
    }
}
