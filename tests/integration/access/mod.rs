//! Authorization gate integration tests
//!
//! Each gate is exercised through a real route: anonymous, inactive,
//! active without the permission, active with it.

use axum::http::StatusCode;
use greenlight_auth::{
    AccessDecision, Principal, AUTHENTICATION_REQUIRED_MESSAGE, INACTIVE_ACCOUNT_MESSAGE,
    NOT_PERMITTED_MESSAGE,
};

use crate::common::{
    assertions::assert_error, create_movie, movie_body, TestApp, TestRequest, UserFixture,
};

mod test_effective_permissions {
    use super::*;

    #[tokio::test]
    async fn test_direct_and_role_grants_union_without_duplicates() {
        let app = TestApp::new();
        let fixture = UserFixture::create(&app, true, &["manager"], &["movies:read", "users:read"])
            .await
            .unwrap();

        let permissions = app
            .state
            .access
            .effective_permissions(fixture.user.id)
            .await
            .unwrap();

        // movies:read arrives both directly and through the role
        assert_eq!(permissions.len(), 3);
        for code in ["movies:read", "movies:write", "users:read"] {
            assert!(permissions.includes(code), "missing {code}");
        }
        assert!(!permissions.includes("users:write"));
    }

    #[tokio::test]
    async fn test_role_grants_are_seen_immediately() {
        let app = TestApp::new();
        let fixture = UserFixture::with_roles(&app, &["user"]).await.unwrap();

        let response = app
            .send(TestRequest::post("/v1/movies", movie_body("Moana")).bearer(fixture.bearer()))
            .await;
        assert_eq!(response.status, StatusCode::FORBIDDEN);

        app.state
            .access
            .assign_roles(fixture.user.id, &["manager".to_string()])
            .await
            .unwrap();

        let response = app
            .send(TestRequest::post("/v1/movies", movie_body("Moana")).bearer(fixture.bearer()))
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    }

    #[tokio::test]
    async fn test_anonymous_never_authorized_without_lookup() {
        let app = TestApp::new();
        let decision = app
            .state
            .access
            .authorize(&Principal::Anonymous, "movies:read")
            .await
            .unwrap();
        assert_eq!(decision, AccessDecision::Unauthenticated);
    }
}

mod test_gates {
    use super::*;

    #[tokio::test]
    async fn test_anonymous_request_needs_authentication() {
        let app = TestApp::new();

        let response = app.send(TestRequest::get("/v1/movies")).await;
        assert_error(
            &response,
            StatusCode::UNAUTHORIZED,
            AUTHENTICATION_REQUIRED_MESSAGE,
        );
    }

    #[tokio::test]
    async fn test_inactive_account_denied_despite_permission() {
        let app = TestApp::new();
        let fixture = UserFixture::inactive(&app, &["movies:read"]).await.unwrap();

        let response = app
            .send(TestRequest::get("/v1/movies").bearer(fixture.bearer()))
            .await;
        assert_error(&response, StatusCode::FORBIDDEN, INACTIVE_ACCOUNT_MESSAGE);
    }

    #[tokio::test]
    async fn test_active_account_without_permission_denied() {
        let app = TestApp::new();
        let fixture = UserFixture::with_permissions(&app, &["movies:read"])
            .await
            .unwrap();

        let response = app
            .send(TestRequest::post("/v1/movies", movie_body("Moana")).bearer(fixture.bearer()))
            .await;
        assert_error(&response, StatusCode::FORBIDDEN, NOT_PERMITTED_MESSAGE);

        let response = app
            .send(TestRequest::get("/v1/users").bearer(fixture.bearer()))
            .await;
        assert_error(&response, StatusCode::FORBIDDEN, NOT_PERMITTED_MESSAGE);
    }

    #[tokio::test]
    async fn test_active_account_with_permission_reaches_handler() {
        let app = TestApp::new();
        let writer = UserFixture::with_permissions(&app, &["movies:read", "movies:write"])
            .await
            .unwrap();

        let id = create_movie(&app, &writer, "Moana").await;
        let response = app
            .send(TestRequest::get(format!("/v1/movies/{id}")).bearer(writer.bearer()))
            .await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["movie"]["title"], "Moana");
    }

    #[tokio::test]
    async fn test_failed_gate_never_reaches_handler() {
        let app = TestApp::new();
        let reader = UserFixture::with_roles(&app, &["user"]).await.unwrap();

        // A body that would fail validation is never looked at
        let response = app
            .send(
                TestRequest::post("/v1/movies", serde_json::json!({"title": ""}))
                    .bearer(reader.bearer()),
            )
            .await;
        assert_error(&response, StatusCode::FORBIDDEN, NOT_PERMITTED_MESSAGE);

        let listed = app
            .send(TestRequest::get("/v1/movies").bearer(reader.bearer()))
            .await;
        assert_eq!(listed.body["movies"].as_array().map(Vec::len), Some(0));
    }
}
