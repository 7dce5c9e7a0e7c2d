//! Axum middleware gating requests on the client's bucket
//!
//! The client identity is the socket peer address provided by
//! `ConnectInfo<SocketAddr>`; forwarding headers are not consulted.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use greenlight_common::Error;

use crate::limiter::{Admission, RateLimiter};

pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(ConnectInfo(peer)) = request.extensions().get::<ConnectInfo<SocketAddr>>().copied()
    else {
        return Error::Internal("peer address unavailable for rate limiting".into()).into_response();
    };

    match limiter.check(peer.ip()) {
        Admission::Admitted => next.run(request).await,
        Admission::Rejected { retry_after } => {
            tracing::debug!(client_ip = %peer.ip(), "Rate limit exceeded");
            Error::RateLimitExceeded {
                retry_after_secs: retry_after.as_secs_f64().ceil().max(1.0) as u64,
            }
            .into_response()
        }
    }
}
