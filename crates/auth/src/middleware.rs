//! Authentication middleware
//!
//! Resolves the `Authorization` header to a [`Principal`] once per request
//! and stores it in the request extensions for the extractors downstream.

use axum::{
    extract::{Request, State},
    http::{
        header::{AUTHORIZATION, VARY},
        HeaderMap, HeaderValue,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::AuthError;
use crate::token::TokenService;
use crate::types::{Principal, TokenScope};

/// Bearer token from the `Authorization` header.
///
/// `Ok(None)` when the header is absent or empty; an error when present but
/// not exactly `Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<String>, AuthError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value
        .to_str()
        .map_err(|_| AuthError::InvalidAuthorizationHeader)?;
    if value.is_empty() {
        return Ok(None);
    }

    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(Some(token.to_string())),
        _ => Err(AuthError::InvalidAuthorizationHeader),
    }
}

pub async fn authenticate(
    State(tokens): State<TokenService>,
    mut request: Request,
    next: Next,
) -> Response {
    let principal = match resolve_principal(&tokens, request.headers()).await {
        Ok(principal) => principal,
        Err(err) => return with_vary(err.into_response()),
    };

    request.extensions_mut().insert(principal);
    with_vary(next.run(request).await)
}

async fn resolve_principal(
    tokens: &TokenService,
    headers: &HeaderMap,
) -> Result<Principal, AuthError> {
    let Some(plaintext) = bearer_token(headers)? else {
        return Ok(Principal::Anonymous);
    };

    match tokens.resolve(TokenScope::Authentication, &plaintext).await {
        Ok(identity) => Ok(Principal::Authenticated(identity)),
        Err(AuthError::MalformedToken | AuthError::TokenNotFound) => Err(AuthError::InvalidToken),
        Err(e) => Err(e),
    }
}

fn with_vary(mut response: Response) -> Response {
    response
        .headers_mut()
        .append(VARY, HeaderValue::from_static("Authorization"));
    response
}
