//! Authentication and authorization errors

use axum::response::{IntoResponse, Response};
use greenlight_common::{Error, RepositoryError};

pub const INVALID_TOKEN_MESSAGE: &str = "invalid or missing authentication token";
pub const AUTHENTICATION_REQUIRED_MESSAGE: &str =
    "you must be authenticated to access this resource";
pub const INACTIVE_ACCOUNT_MESSAGE: &str =
    "your user account must be activated to access this resource";
pub const NOT_PERMITTED_MESSAGE: &str =
    "your user account doesn't have the necessary permissions to access this resource";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// `Authorization` header present but not `Bearer <token>`
    #[error("invalid authorization header")]
    InvalidAuthorizationHeader,

    /// Token plaintext has the wrong shape; rejected before hashing
    #[error("malformed token")]
    MalformedToken,

    /// No live token matches (wrong, expired, other scope, or deleted owner)
    #[error("token not found")]
    TokenNotFound,

    /// Bearer credentials could not be resolved to a principal
    #[error("invalid token")]
    InvalidToken,

    #[error("authentication required")]
    AuthenticationRequired,

    #[error("inactive account")]
    InactiveAccount,

    #[error("permission denied")]
    NotPermitted,

    /// The authentication middleware did not run for this route
    #[error("principal missing from request")]
    PrincipalUnavailable,

    #[error("random source failure: {0}")]
    RandomSource(String),

    #[error("auth storage failure: {0}")]
    Storage(#[from] RepositoryError),
}

impl From<AuthError> for Error {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidAuthorizationHeader
            | AuthError::MalformedToken
            | AuthError::TokenNotFound
            | AuthError::InvalidToken => Error::Authentication {
                message: INVALID_TOKEN_MESSAGE.to_string(),
                challenge: true,
            },
            AuthError::AuthenticationRequired => Error::Authentication {
                message: AUTHENTICATION_REQUIRED_MESSAGE.to_string(),
                challenge: false,
            },
            AuthError::InactiveAccount => Error::Authorization(INACTIVE_ACCOUNT_MESSAGE.to_string()),
            AuthError::NotPermitted => Error::Authorization(NOT_PERMITTED_MESSAGE.to_string()),
            AuthError::PrincipalUnavailable => {
                Error::Internal("authentication middleware not installed".to_string())
            }
            AuthError::RandomSource(e) => Error::Internal(format!("random source: {e}")),
            AuthError::Storage(e) => e.into(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        Error::from(self).into_response()
    }
}
