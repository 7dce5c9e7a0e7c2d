//! Common error types and handling for Greenlight
//!
//! Every error kind renders the same envelope: a JSON object with a single
//! `error` field holding either a message or a field → message map.

use std::collections::BTreeMap;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Common result type
pub type Result<T> = std::result::Result<T, Error>;

pub const NOT_FOUND_MESSAGE: &str = "the requested resource could not be found";
pub const EDIT_CONFLICT_MESSAGE: &str =
    "unable to update the record due to an edit conflict, please try again";
pub const RATE_LIMIT_MESSAGE: &str = "rate limit exceeded";
pub const SERVER_ERROR_MESSAGE: &str =
    "the server encountered a problem and could not process your request";

/// Common error type for the Greenlight application
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unexpected error: {0}")]
    Unexpected(#[from] anyhow::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Malformed request (unparseable body, bad header value)
    #[error("{0}")]
    BadRequest(String),

    /// Field-level validation failures
    #[error("Validation failed: {0:?}")]
    FailedValidation(BTreeMap<String, String>),

    /// Missing, malformed, or unresolvable credentials
    #[error("{message}")]
    Authentication {
        message: String,
        /// Adds `WWW-Authenticate: Bearer` to the response
        challenge: bool,
    },

    /// Valid principal lacking permission, or an inactive account
    #[error("{0}")]
    Authorization(String),

    #[error("{0}")]
    NotFound(String),

    #[error("the {0} method is not supported for this resource")]
    MethodNotAllowed(String),

    #[error("unable to update the record due to an edit conflict, please try again")]
    EditConflict,

    #[error("rate limit exceeded")]
    RateLimitExceeded { retry_after_secs: u64 },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Resource-not-found error with the standard message
    pub fn not_found() -> Self {
        Error::NotFound(NOT_FOUND_MESSAGE.to_string())
    }

    /// Single-field validation failure
    pub fn invalid_field(key: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(key.into(), message.into());
        Error::FailedValidation(errors)
    }

    /// Get the appropriate HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::FailedValidation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Authentication { .. } => StatusCode::UNAUTHORIZED,
            Error::Authorization(_) => StatusCode::FORBIDDEN,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Error::EditConflict => StatusCode::CONFLICT,
            Error::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            Error::Unexpected(_)
            | Error::Database(_)
            | Error::Serialization(_)
            | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Body placed under the `error` key
    fn body(&self) -> serde_json::Value {
        match self {
            Error::FailedValidation(errors) => json!(errors),
            Error::Unexpected(_)
            | Error::Database(_)
            | Error::Serialization(_)
            | Error::Internal(_) => json!(SERVER_ERROR_MESSAGE),
            other => json!(other.to_string()),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Log internal errors with full context; the client only sees the generic message
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Internal server error");
        }

        let mut response = (status, Json(json!({ "error": self.body() }))).into_response();

        match &self {
            Error::Authentication {
                challenge: true, ..
            } => {
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
            }
            Error::RateLimitExceeded { retry_after_secs } => {
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(*retry_after_secs));
            }
            _ => {}
        }

        response
    }
}
