//! Custom axum extractors for Greenlight

use axum::{
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;
use validator::Validate;

use crate::validation::Validator;
use crate::Error;

/// Header carrying the version a client last observed
pub const EXPECTED_VERSION_HEADER: &str = "x-expected-version";

pub const INVALID_ID_MESSAGE: &str = "must be a positive integer";
pub const INVALID_UUID_MESSAGE: &str = "must be a valid UUID";

/// JSON extractor that validates the deserialized value automatically.
///
/// Replaces `Json<T>` + manual `.validate()` calls in handlers.
/// Requires `T: DeserializeOwned + Validate`.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

/// Rejection type for `ValidatedJson`:
/// - JSON deserialization errors → 400 (via `Error::BadRequest`)
/// - Validation errors → 422 field map (via `Error::FailedValidation`)
#[derive(Debug)]
pub enum ValidatedJsonRejection {
    Json(JsonRejection),
    Validation(Error),
}

impl IntoResponse for ValidatedJsonRejection {
    fn into_response(self) -> Response {
        match self {
            ValidatedJsonRejection::Json(e) => Error::BadRequest(e.body_text()).into_response(),
            ValidatedJsonRejection::Validation(e) => e.into_response(),
        }
    }
}

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ValidatedJsonRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(ValidatedJsonRejection::Json)?;
        value.validate().map_err(|e| {
            let errors = Validator::from(e).errors().clone();
            ValidatedJsonRejection::Validation(Error::FailedValidation(errors))
        })?;
        Ok(ValidatedJson(value))
    }
}

/// JSON body extractor whose rejection uses the error envelope.
///
/// For request types validated by domain rules rather than `validator`.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| Error::BadRequest(e.body_text()))?;
        Ok(JsonBody(value))
    }
}

/// Positive integer `{id}` path segment.
///
/// Anything unparseable or below 1 fails validation; a well-formed id with
/// no row is left to the handler to report as not found.
#[derive(Debug, Clone, Copy)]
pub struct ResourceId(pub i64);

impl<S> FromRequestParts<S> for ResourceId
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| Error::invalid_field("id", INVALID_ID_MESSAGE))?;

        match raw.parse::<i64>() {
            Ok(id) if id > 0 => Ok(ResourceId(id)),
            _ => Err(Error::invalid_field("id", INVALID_ID_MESSAGE)),
        }
    }
}

/// UUID `{id}` path segment; malformed values fail validation.
#[derive(Debug, Clone, Copy)]
pub struct UuidParam(pub Uuid);

impl<S> FromRequestParts<S> for UuidParam
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| Error::invalid_field("id", INVALID_UUID_MESSAGE))?;

        Uuid::parse_str(&raw)
            .map(UuidParam)
            .map_err(|_| Error::invalid_field("id", INVALID_UUID_MESSAGE))
    }
}

/// Optional `X-Expected-Version` request header
#[derive(Debug, Clone, Copy)]
pub struct ExpectedVersion(pub Option<i32>);

impl<S> FromRequestParts<S> for ExpectedVersion
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(EXPECTED_VERSION_HEADER) else {
            return Ok(ExpectedVersion(None));
        };

        value
            .to_str()
            .ok()
            .and_then(|s| s.trim().parse::<i32>().ok())
            .filter(|v| *v > 0)
            .map(|v| ExpectedVersion(Some(v)))
            .ok_or_else(|| Error::BadRequest("X-Expected-Version must be a positive integer".into()))
    }
}
