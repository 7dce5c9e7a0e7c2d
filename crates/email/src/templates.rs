//! Email Templates
//!
//! Each template renders a subject, a plain-text body and an HTML body from
//! a JSON payload.

use serde::Deserialize;

use crate::EmailError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailTemplate {
    /// Sent on registration; carries the activation token
    UserWelcome,
    /// Sent when an inactive user asks for a fresh activation token
    TokenActivation,
}

/// Output of [`EmailTemplate::render`]
#[derive(Debug, Clone)]
pub struct RenderedEmail {
    pub subject: String,
    pub body_text: String,
    pub body_html: String,
}

#[derive(Debug, Deserialize)]
struct UserWelcomePayload {
    #[serde(rename = "activationToken")]
    activation_token: String,
    #[serde(rename = "userID")]
    user_id: String,
}

#[derive(Debug, Deserialize)]
struct TokenActivationPayload {
    #[serde(rename = "activationToken")]
    activation_token: String,
}

impl EmailTemplate {
    pub fn name(&self) -> &'static str {
        match self {
            EmailTemplate::UserWelcome => "user_welcome",
            EmailTemplate::TokenActivation => "token_activation",
        }
    }

    pub fn render(
        &self,
        payload: &serde_json::Value,
        app_base_url: &str,
    ) -> Result<RenderedEmail, EmailError> {
        match self {
            EmailTemplate::UserWelcome => {
                let payload: UserWelcomePayload = self.payload(payload)?;
                Ok(render_user_welcome(&payload, app_base_url))
            }
            EmailTemplate::TokenActivation => {
                let payload: TokenActivationPayload = self.payload(payload)?;
                Ok(render_token_activation(&payload, app_base_url))
            }
        }
    }

    fn payload<T: serde::de::DeserializeOwned>(
        &self,
        payload: &serde_json::Value,
    ) -> Result<T, EmailError> {
        serde_json::from_value(payload.clone())
            .map_err(|e| EmailError::Template(format!("{} payload: {e}", self.name())))
    }
}

fn activate_url(app_base_url: &str) -> String {
    format!("{}/v1/users/activated", app_base_url.trim_end_matches('/'))
}

fn render_user_welcome(payload: &UserWelcomePayload, app_base_url: &str) -> RenderedEmail {
    let token = &payload.activation_token;
    let activate_url = activate_url(app_base_url);

    let subject = "Welcome to Greenlight!".to_string();

    let body_text = format!(
        "Hi,\n\n\
        Thanks for signing up for a Greenlight account. We're excited to have you on board!\n\n\
        For future reference, your user ID number is {user_id}.\n\n\
        Please send a request to the `PUT {activate_url}` endpoint with the \
        following JSON body to activate your account:\n\n\
        {{\"token\": \"{token}\"}}\n\n\
        Please note that this is a one-time use token and it will expire in 3 days.\n\n\
        Thanks,\n\
        The Greenlight Team",
        user_id = payload.user_id,
    );

    let body_html = format!(
        r#"<!doctype html>
<html>
<head>
    <meta name="viewport" content="width=device-width" />
    <meta http-equiv="Content-Type" content="text/html; charset=UTF-8" />
</head>
<body>
    <p>Hi,</p>
    <p>Thanks for signing up for a Greenlight account. We're excited to have you on board!</p>
    <p>For future reference, your user ID number is {user_id}.</p>
    <p>Please send a request to the <code>PUT {activate_url}</code> endpoint with the
    following JSON body to activate your account:</p>
    <pre><code>
    {{"token": "{token}"}}
    </code></pre>
    <p>Please note that this is a one-time use token and it will expire in 3 days.</p>
    <p>Thanks,</p>
    <p>The Greenlight Team</p>
</body>
</html>"#,
        user_id = payload.user_id,
    );

    RenderedEmail {
        subject,
        body_text,
        body_html,
    }
}

fn render_token_activation(payload: &TokenActivationPayload, app_base_url: &str) -> RenderedEmail {
    let token = &payload.activation_token;
    let activate_url = activate_url(app_base_url);

    let body_text = format!(
        "Hi,\n\n\
        Please send a `PUT {activate_url}` request with the following JSON body \
        to activate your account:\n\n\
        {{\"token\": \"{token}\"}}\n\n\
        Please note that this is a one-time use token and it will expire in 3 days.\n\n\
        Thanks,\n\
        The Greenlight Team"
    );

    let body_html = format!(
        r#"<!doctype html>
<html>
<head>
    <meta name="viewport" content="width=device-width" />
    <meta http-equiv="Content-Type" content="text/html; charset=UTF-8" />
</head>
<body>
    <p>Hi,</p>
    <p>Please send a <code>PUT {activate_url}</code> request with the following JSON body
    to activate your account:</p>
    <pre><code>
    {{"token": "{token}"}}
    </code></pre>
    <p>Please note that this is a one-time use token and it will expire in 3 days.</p>
    <p>Thanks,</p>
    <p>The Greenlight Team</p>
</body>
</html>"#
    );

    RenderedEmail {
        subject: "Activate your Greenlight account".to_string(),
        body_text,
        body_html,
    }
}
