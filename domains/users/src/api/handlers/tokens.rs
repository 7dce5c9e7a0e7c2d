//! Token handlers
//!
//! - **POST /v1/tokens/authentication** - Exchange email and password for a bearer token
//! - **DELETE /v1/tokens/authentication** - Revoke every bearer token of the caller
//! - **POST /v1/tokens/activation** - Mail a fresh activation token to an inactive account

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use greenlight_auth::{AuthenticatedPrincipal, Token, TokenScope};
use greenlight_common::{Error, Result, ValidatedJson};
use greenlight_email::EmailTemplate;
use serde::Serialize;
use serde_json::json;

use crate::api::state::UsersState;
use crate::domain::entities::{ActivationTokenRequest, CredentialsRequest};
use crate::domain::password::verify_password;

pub const INVALID_CREDENTIALS_MESSAGE: &str = "invalid authentication credentials";

#[derive(Debug, Serialize)]
pub struct AuthenticationTokenResponse {
    pub authentication_token: Token,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

fn invalid_credentials() -> Error {
    Error::Authentication {
        message: INVALID_CREDENTIALS_MESSAGE.to_string(),
        challenge: false,
    }
}

/// POST /v1/tokens/authentication
pub async fn create_authentication_token(
    State(state): State<UsersState>,
    ValidatedJson(request): ValidatedJson<CredentialsRequest>,
) -> Result<impl IntoResponse> {
    let user = state
        .users
        .get_by_email(&request.email)
        .await?
        .ok_or_else(invalid_credentials)?;

    if !verify_password(&request.password, &user.password_hash).await? {
        tracing::debug!(user_id = %user.id, "Password mismatch");
        return Err(invalid_credentials());
    }

    state.users.record_login(user.id, Utc::now()).await?;

    let token = state
        .tokens
        .issue(
            user.id,
            state.auth_config.authentication_ttl,
            TokenScope::Authentication,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthenticationTokenResponse {
            authentication_token: token,
        }),
    ))
}

/// DELETE /v1/tokens/authentication
pub async fn revoke_authentication_tokens(
    AuthenticatedPrincipal(identity): AuthenticatedPrincipal,
    State(state): State<UsersState>,
) -> Result<Json<MessageResponse>> {
    let removed = state
        .tokens
        .revoke_all_for_scope(identity.id, TokenScope::Authentication)
        .await?;

    tracing::info!(user_id = %identity.id, removed, "Authentication tokens revoked");
    Ok(Json(MessageResponse {
        message: "authentication tokens revoked",
    }))
}

/// POST /v1/tokens/activation
pub async fn create_activation_token(
    State(state): State<UsersState>,
    ValidatedJson(request): ValidatedJson<ActivationTokenRequest>,
) -> Result<impl IntoResponse> {
    let user = state
        .users
        .get_by_email(&request.email)
        .await?
        .ok_or_else(|| Error::invalid_field("email", "no matching email address found"))?;

    if user.is_active {
        return Err(Error::invalid_field("email", "user has already been activated"));
    }

    let token = state
        .tokens
        .issue(user.id, state.auth_config.activation_ttl, TokenScope::Activation)
        .await?;

    state.send_email_in_background(
        user.email,
        EmailTemplate::TokenActivation,
        json!({ "activationToken": token.plaintext }),
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(MessageResponse {
            message: "an email will be sent to you containing activation instructions",
        }),
    ))
}
