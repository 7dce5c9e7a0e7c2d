//! Registration and activation handlers
//!
//! - **POST /v1/users** - Register an inactive account and mail its activation token
//! - **PUT /v1/users/activated** - Activate the account owning an activation token

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use greenlight_auth::permission::{DEFAULT_PERMISSIONS, DEFAULT_ROLE};
use greenlight_auth::token::validate_token_plaintext;
use greenlight_auth::{AuthError, TokenScope};
use greenlight_common::{Error, JsonBody, RepositoryError, Result, Validator};
use greenlight_email::EmailTemplate;
use serde::Serialize;
use serde_json::json;

use crate::api::state::UsersState;
use crate::domain::entities::{ActivateUserRequest, NewUser, RegisterUserRequest, User};
use crate::domain::password::{hash_password, validate_password_plaintext};
use crate::domain::validation::{validate_profile, DUPLICATE_EMAIL_MESSAGE};

pub const INVALID_ACTIVATION_TOKEN_MESSAGE: &str = "invalid or expired activation token";

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: User,
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// POST /v1/users
pub async fn register_user(
    State(state): State<UsersState>,
    JsonBody(request): JsonBody<RegisterUserRequest>,
) -> Result<impl IntoResponse> {
    let mut v = Validator::new();
    validate_profile(
        &mut v,
        &request.first_name,
        request.last_name.as_deref(),
        request.username.as_deref(),
        &request.email,
    );
    validate_password_plaintext(&mut v, &request.password);
    v.into_result()?;

    let password_hash = hash_password(&request.password, state.auth_config.password_cost).await?;

    let new_user = NewUser {
        first_name: request.first_name,
        last_name: request.last_name,
        username: request.username,
        email: request.email,
        password_hash,
    };

    let user = match state.users.insert(new_user).await {
        Err(RepositoryError::AlreadyExists) => {
            return Err(Error::invalid_field("email", DUPLICATE_EMAIL_MESSAGE));
        }
        other => other?,
    };

    state
        .access
        .grant_permissions(user.id, &to_strings(DEFAULT_PERMISSIONS))
        .await?;
    state
        .access
        .assign_roles(user.id, &[DEFAULT_ROLE.to_string()])
        .await?;

    let token = state
        .tokens
        .issue(user.id, state.auth_config.activation_ttl, TokenScope::Activation)
        .await?;

    state.send_email_in_background(
        user.email.clone(),
        EmailTemplate::UserWelcome,
        json!({
            "activationToken": token.plaintext,
            "userID": user.id.to_string(),
        }),
    );

    tracing::info!(user_id = %user.id, "User registered");
    Ok((StatusCode::ACCEPTED, Json(UserResponse { user })))
}

/// PUT /v1/users/activated
pub async fn activate_user(
    State(state): State<UsersState>,
    JsonBody(request): JsonBody<ActivateUserRequest>,
) -> Result<Json<UserResponse>> {
    let mut v = Validator::new();
    validate_token_plaintext(&mut v, &request.token);
    v.into_result()?;

    let identity = match state
        .tokens
        .resolve(TokenScope::Activation, &request.token)
        .await
    {
        Err(AuthError::MalformedToken | AuthError::TokenNotFound) => {
            return Err(Error::invalid_field("token", INVALID_ACTIVATION_TOKEN_MESSAGE));
        }
        other => other?,
    };

    let mut user = state
        .users
        .get(identity.id)
        .await?
        .ok_or_else(|| Error::invalid_field("token", INVALID_ACTIVATION_TOKEN_MESSAGE))?;

    // Guard with the version seen when the token was resolved
    user.is_active = true;
    user.version = state.users.update(&user, identity.version).await?;

    state
        .tokens
        .revoke_all_for_scope(user.id, TokenScope::Activation)
        .await?;

    tracing::info!(user_id = %user.id, "User activated");
    Ok(Json(UserResponse { user }))
}
