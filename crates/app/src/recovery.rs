//! Panic recovery
//!
//! A panic anywhere below the recovery layer becomes a logged 500 whose
//! connection is closed after the response.

use std::any::Any;

use axum::{
    http::{header::CONNECTION, HeaderValue},
    response::{IntoResponse, Response},
};
use greenlight_common::Error;

pub(crate) fn recover_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "non-string panic payload".to_string()
    };

    // Error::Internal logs the detail inside the request span
    let mut response = Error::Internal(format!("recovered panic: {detail}")).into_response();
    response
        .headers_mut()
        .insert(CONNECTION, HeaderValue::from_static("close"));
    response
}
