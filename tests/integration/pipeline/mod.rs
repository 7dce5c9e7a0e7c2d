//! Middleware chain integration tests
//!
//! Header contracts of the authentication stage and the JSON shape of
//! routing failures.

use axum::http::{header, StatusCode};
use greenlight_auth::INVALID_TOKEN_MESSAGE;
use greenlight_common::error::NOT_FOUND_MESSAGE;

use crate::common::{
    assertions::{assert_error, assert_varies_by_authorization},
    TestApp, TestRequest, UserFixture,
};

mod test_authentication_stage {
    use super::*;

    #[test_log::test(tokio::test)]
    async fn test_missing_header_is_anonymous() {
        let app = TestApp::new();

        let response = app.send(TestRequest::get("/v1/healthcheck")).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["status"], "available");
        assert!(response.header(header::WWW_AUTHENTICATE).is_none());
        assert_varies_by_authorization(&response);
    }

    #[tokio::test]
    async fn test_malformed_headers_are_challenged() {
        let app = TestApp::new();

        for value in ["Basic dXNlcjpwYXNz", "Bearer", "Bearer a b", "bearer ABCDEFGHIJKLMNOPQRSTUVWXYZ"] {
            let response = app
                .send(TestRequest::get("/v1/healthcheck").header("authorization", value))
                .await;
            assert_error(&response, StatusCode::UNAUTHORIZED, INVALID_TOKEN_MESSAGE);
            assert_eq!(
                response.header(header::WWW_AUTHENTICATE),
                Some("Bearer"),
                "header value {value:?}"
            );
            assert_varies_by_authorization(&response);
        }
    }

    #[tokio::test]
    async fn test_every_response_varies_by_authorization() {
        let app = TestApp::new();
        let fixture = UserFixture::with_roles(&app, &["user"]).await.unwrap();

        let authenticated = app
            .send(TestRequest::get("/v1/movies").bearer(fixture.bearer()))
            .await;
        assert_eq!(authenticated.status, StatusCode::OK);
        assert_varies_by_authorization(&authenticated);

        let forbidden = app
            .send(TestRequest::get("/v1/users").bearer(fixture.bearer()))
            .await;
        assert_eq!(forbidden.status, StatusCode::FORBIDDEN);
        assert_varies_by_authorization(&forbidden);

        let missing = app.send(TestRequest::get("/v1/unknown")).await;
        assert_varies_by_authorization(&missing);
    }
}

mod test_routing_failures {
    use super::*;

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let app = TestApp::new();

        let response = app.send(TestRequest::get("/v1/unknown")).await;
        assert_error(&response, StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE);
    }

    #[tokio::test]
    async fn test_wrong_method_is_json_405() {
        let app = TestApp::new();

        let response = app
            .send(TestRequest::put("/v1/movies", serde_json::json!({})))
            .await;
        assert_error(
            &response,
            StatusCode::METHOD_NOT_ALLOWED,
            "the PUT method is not supported for this resource",
        );
    }

    #[tokio::test]
    async fn test_malformed_resource_ids_fail_validation() {
        let app = TestApp::new();
        let fixture = UserFixture::with_roles(&app, &["admin"]).await.unwrap();

        for uri in ["/v1/movies/abc", "/v1/movies/-1", "/v1/users/not-a-uuid"] {
            let response = app.send(TestRequest::get(uri).bearer(fixture.bearer())).await;
            assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY, "{uri}");
            assert!(response.body["error"]["id"].is_string(), "{uri}");
        }

        // Well-formed ids with no row are still not found
        for uri in ["/v1/movies/424242", "/v1/users/00000000-0000-0000-0000-000000000000"] {
            let response = app.send(TestRequest::get(uri).bearer(fixture.bearer())).await;
            assert_error(&response, StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE);
        }
    }
}

mod test_operational_endpoints {
    use super::*;

    #[tokio::test]
    async fn test_healthcheck_reports_environment() {
        let app = TestApp::with_env(&[("LIMITER_ENABLED", "false"), ("APP_ENV", "staging")]);

        let response = app.send(TestRequest::get("/v1/healthcheck")).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["system_info"]["environment"], "staging");
        assert!(response.body["system_info"]["version"].is_string());
    }

    #[tokio::test]
    async fn test_debug_vars_tracks_background_tasks() {
        let app = TestApp::new();

        let response = app.send(TestRequest::get("/debug/vars")).await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["in_flight_background_tasks"], 0);
        assert_eq!(response.body["total_requests_received"], 1);
        assert!(response.body["total_processing_time_μs"].is_u64());
    }
}
