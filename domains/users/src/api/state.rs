//! Users domain state

use std::sync::Arc;

use axum::extract::FromRef;
use greenlight_auth::{AccessController, AuthConfig, TokenService};
use greenlight_common::BackgroundTasks;
use greenlight_email::{EmailService, EmailTemplate};

use crate::repository::UserStore;

#[derive(Clone)]
pub struct UsersState {
    pub users: Arc<dyn UserStore>,
    pub tokens: TokenService,
    pub access: AccessController,
    pub email: Arc<dyn EmailService>,
    pub background: BackgroundTasks,
    pub auth_config: AuthConfig,
}

impl FromRef<UsersState> for AccessController {
    fn from_ref(state: &UsersState) -> Self {
        state.access.clone()
    }
}

impl UsersState {
    /// Mail `template` to `to` without holding up the response.
    ///
    /// Delivery failures are logged only.
    pub fn send_email_in_background(
        &self,
        to: String,
        template: EmailTemplate,
        payload: serde_json::Value,
    ) {
        let email = self.email.clone();
        self.background.spawn("send_email", async move {
            match email.send_template(&to, template, &payload).await {
                Ok(receipt) => tracing::info!(
                    message_id = %receipt.message_id,
                    template = template.name(),
                    "Email sent"
                ),
                Err(e) => tracing::error!(
                    error = %e,
                    template = template.name(),
                    "Failed to send email"
                ),
            }
        });
    }
}
