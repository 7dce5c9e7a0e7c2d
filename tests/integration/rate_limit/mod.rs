//! Rate limiting integration tests
//!
//! Time is paused so bucket refill and idle eviction can be stepped
//! deterministically.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use axum::http::{header, StatusCode};
use greenlight_common::error::RATE_LIMIT_MESSAGE;
use greenlight_limiter::{DEFAULT_IDLE_TIMEOUT, DEFAULT_SWEEP_INTERVAL};
use tokio_util::sync::CancellationToken;

use crate::common::{assertions::assert_error, TestApp, TestRequest, DEFAULT_PEER};

const OTHER_PEER: IpAddr = IpAddr::V4(Ipv4Addr::new(198, 51, 100, 20));

async fn statuses(app: &TestApp, peer: IpAddr, count: usize) -> Vec<StatusCode> {
    let mut seen = Vec::with_capacity(count);
    for _ in 0..count {
        seen.push(
            app.send_from(peer, TestRequest::get("/v1/healthcheck"))
                .await
                .status,
        );
    }
    seen
}

mod test_admission {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_burst_then_reject_then_refill() {
        let app = TestApp::with_limiter(2.0, 4);

        let seen = statuses(&app, DEFAULT_PEER, 6).await;
        assert_eq!(
            seen,
            vec![
                StatusCode::OK,
                StatusCode::OK,
                StatusCode::OK,
                StatusCode::OK,
                StatusCode::TOO_MANY_REQUESTS,
                StatusCode::TOO_MANY_REQUESTS,
            ]
        );

        tokio::time::advance(Duration::from_secs(1)).await;
        let seen = statuses(&app, DEFAULT_PEER, 2).await;
        assert_eq!(seen, vec![StatusCode::OK, StatusCode::OK]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejection_shape() {
        let app = TestApp::with_limiter(2.0, 1);
        statuses(&app, DEFAULT_PEER, 1).await;

        let response = app.send(TestRequest::get("/v1/healthcheck")).await;
        assert_error(&response, StatusCode::TOO_MANY_REQUESTS, RATE_LIMIT_MESSAGE);
        let retry_after: u64 = response
            .header(header::RETRY_AFTER)
            .and_then(|v| v.parse().ok())
            .unwrap();
        assert!(retry_after >= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clients_are_limited_independently() {
        let app = TestApp::with_limiter(2.0, 4);

        statuses(&app, DEFAULT_PEER, 4).await;
        assert_eq!(
            statuses(&app, DEFAULT_PEER, 1).await,
            vec![StatusCode::TOO_MANY_REQUESTS]
        );
        assert_eq!(
            statuses(&app, OTHER_PEER, 4).await,
            vec![StatusCode::OK; 4]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_limit_applies_before_authentication() {
        let app = TestApp::with_limiter(2.0, 2);

        // Rejected credentials still spend tokens
        for _ in 0..2 {
            let response = app
                .send(TestRequest::get("/v1/movies").bearer("not-a-token"))
                .await;
            assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        }

        let response = app
            .send(TestRequest::get("/v1/movies").bearer("not-a-token"))
            .await;
        assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_disabled_limiter_admits_everything() {
        let app = TestApp::new();
        assert_eq!(
            statuses(&app, DEFAULT_PEER, 20).await,
            vec![StatusCode::OK; 20]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejections_are_counted_in_metrics() {
        let app = TestApp::with_limiter(2.0, 4);
        statuses(&app, DEFAULT_PEER, 6).await;

        let response = app
            .send_from(OTHER_PEER, TestRequest::get("/debug/vars"))
            .await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["total_responses_sent_by_status"]["429"], 2);
        assert_eq!(response.body["total_responses_sent_by_status"]["200"], 4);
        assert_eq!(response.body["rate_limiter_clients"], 2);
    }
}

mod test_eviction {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_idle_client_is_swept_and_starts_fresh() {
        let app = TestApp::with_limiter(2.0, 4);
        statuses(&app, DEFAULT_PEER, 4).await;
        assert!(app.state.limiter.contains(&DEFAULT_PEER));

        tokio::time::advance(DEFAULT_IDLE_TIMEOUT + Duration::from_secs(1)).await;
        let evicted = app.state.limiter.sweep();
        assert_eq!(evicted, 1);
        assert!(!app.state.limiter.contains(&DEFAULT_PEER));

        // A returning client gets a full bucket
        assert_eq!(
            statuses(&app, DEFAULT_PEER, 4).await,
            vec![StatusCode::OK; 4]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_sweeper_evicts_idle_clients() {
        let app = TestApp::with_limiter(2.0, 4);
        let shutdown = CancellationToken::new();
        let sweeper = app.state.limiter.spawn_sweeper(shutdown.clone());

        statuses(&app, DEFAULT_PEER, 1).await;
        assert!(app.state.limiter.contains(&DEFAULT_PEER));

        let mut elapsed = Duration::ZERO;
        while elapsed <= DEFAULT_IDLE_TIMEOUT + DEFAULT_SWEEP_INTERVAL {
            tokio::time::advance(DEFAULT_SWEEP_INTERVAL).await;
            elapsed += DEFAULT_SWEEP_INTERVAL;
            for _ in 0..5 {
                tokio::task::yield_now().await;
            }
        }
        assert!(!app.state.limiter.contains(&DEFAULT_PEER));

        shutdown.cancel();
        sweeper.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_active_client_survives_sweep() {
        let app = TestApp::with_limiter(2.0, 4);

        for _ in 0..4 {
            statuses(&app, DEFAULT_PEER, 1).await;
            tokio::time::advance(DEFAULT_SWEEP_INTERVAL).await;
            app.state.limiter.sweep();
        }
        assert!(app.state.limiter.contains(&DEFAULT_PEER));
    }
}
