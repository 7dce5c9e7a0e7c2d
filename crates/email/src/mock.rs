//! Mock Email Service Implementation
//!
//! Captures messages in memory for tests and local development. Captured
//! welcome emails can be mined for the activation token they carry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use parking_lot::Mutex;
use regex::Regex;
use uuid::Uuid;

use crate::{EmailConfig, EmailError, EmailMessage, EmailReceipt, EmailService};

lazy_static! {
    static ref ACTIVATION_TOKEN: Regex = Regex::new(r#""token": "([A-Z2-7]{26})""#).unwrap();
}

/// Email captured by the mock service
#[derive(Debug, Clone)]
pub struct CapturedEmail {
    pub message: EmailMessage,
    pub receipt: EmailReceipt,
    pub captured_at: DateTime<Utc>,
}

impl CapturedEmail {
    pub fn email_type(&self) -> Option<&str> {
        self.message.metadata.get("email_type").map(String::as_str)
    }

    /// Activation token embedded in a welcome email body
    pub fn extract_activation_token(&self) -> Option<String> {
        ACTIVATION_TOKEN
            .captures(&self.message.body_text)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str().to_string())
    }
}

/// Mock email service for testing
#[derive(Debug, Clone)]
pub struct MockEmailService {
    emails: Arc<Mutex<Vec<CapturedEmail>>>,
    email_by_recipient: Arc<Mutex<HashMap<String, Vec<CapturedEmail>>>>,
    enabled: bool,
    failing: Arc<AtomicBool>,
    default_from: String,
    app_base_url: String,
}

impl MockEmailService {
    pub fn new() -> Self {
        Self::with_config(&EmailConfig::default())
    }

    pub fn with_config(config: &EmailConfig) -> Self {
        Self {
            emails: Arc::new(Mutex::new(Vec::new())),
            email_by_recipient: Arc::new(Mutex::new(HashMap::new())),
            enabled: true,
            failing: Arc::new(AtomicBool::new(false)),
            default_from: config.default_from.clone(),
            app_base_url: config.app_base_url.clone(),
        }
    }

    /// Accepts every send without capturing it
    pub fn new_disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new()
        }
    }

    /// Make subsequent sends fail, to exercise delivery-failure paths
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn get_all_emails(&self) -> Vec<CapturedEmail> {
        self.emails.lock().clone()
    }

    pub fn get_emails_for_recipient(&self, email: &str) -> Vec<CapturedEmail> {
        self.email_by_recipient
            .lock()
            .get(email)
            .cloned()
            .unwrap_or_default()
    }

    /// Most recent welcome email sent to `email`
    pub fn get_latest_welcome_email(&self, email: &str) -> Option<CapturedEmail> {
        self.get_emails_for_recipient(email)
            .into_iter()
            .filter(|e| e.email_type() == Some("user_welcome"))
            .max_by_key(|e| e.captured_at)
    }

    /// Token from the newest welcome or activation email sent to `email`
    pub fn get_activation_token_for(&self, email: &str) -> Option<String> {
        self.get_emails_for_recipient(email)
            .into_iter()
            .filter(|e| matches!(e.email_type(), Some("user_welcome" | "token_activation")))
            .max_by_key(|e| e.captured_at)
            .and_then(|email| email.extract_activation_token())
    }

    pub fn email_count(&self) -> usize {
        self.emails.lock().len()
    }

    pub fn clear(&self) {
        self.emails.lock().clear();
        self.email_by_recipient.lock().clear();
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for MockEmailService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl EmailService for MockEmailService {
    async fn send_email(&self, message: EmailMessage) -> Result<EmailReceipt, EmailError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(EmailError::AwsSes("mock delivery failure".to_string()));
        }

        if !self.enabled {
            tracing::warn!(to = %message.to, "Mock email service disabled, skipping send");
            return Ok(EmailReceipt {
                message_id: format!("disabled-{}", Uuid::new_v4()),
                sent_at: Utc::now(),
                provider: "mock-disabled".to_string(),
                metadata: message.metadata.clone(),
            });
        }

        let receipt = EmailReceipt {
            message_id: format!("mock-{}", Uuid::new_v4()),
            sent_at: Utc::now(),
            provider: "mock".to_string(),
            metadata: message.metadata.clone(),
        };

        let captured = CapturedEmail {
            message: message.clone(),
            receipt: receipt.clone(),
            captured_at: Utc::now(),
        };

        self.emails.lock().push(captured.clone());
        self.email_by_recipient
            .lock()
            .entry(message.to)
            .or_default()
            .push(captured);

        tracing::info!(message_id = %receipt.message_id, "Email captured");

        Ok(receipt)
    }

    fn default_from(&self) -> String {
        self.default_from.clone()
    }

    fn app_base_url(&self) -> &str {
        &self.app_base_url
    }
}
