//! Account workflow integration tests
//!
//! Registration through activation, login, use and logout, plus operator
//! grants taking effect on the next request.

use std::time::Duration;

use axum::http::StatusCode;
use greenlight_auth::{INACTIVE_ACCOUNT_MESSAGE, INVALID_TOKEN_MESSAGE};
use serde_json::json;
use uuid::Uuid;

use crate::common::{assertions::assert_error, movie_body, TestApp, TestRequest, UserFixture};

const PASSWORD: &str = "pa55word-for-tests";

async fn register(app: &TestApp, email: &str) -> Uuid {
    let response = app
        .send(TestRequest::post(
            "/v1/users",
            json!({"first_name": "Alice", "email": email, "password": PASSWORD}),
        ))
        .await;
    assert_eq!(response.status, StatusCode::ACCEPTED, "{}", response.body);
    response.body["user"]["id"].as_str().unwrap().parse().unwrap()
}

/// Wait for the background mail task to deliver the activation token
async fn activation_token(app: &TestApp, email: &str) -> String {
    for _ in 0..200 {
        if let Some(token) = app.email.get_activation_token_for(email) {
            return token;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("no activation email delivered to {email}");
}

async fn login(app: &TestApp, email: &str, password: &str) -> (StatusCode, Option<String>) {
    let response = app
        .send(TestRequest::post(
            "/v1/tokens/authentication",
            json!({"email": email, "password": password}),
        ))
        .await;
    let token = response.body["authentication_token"]["token"]
        .as_str()
        .map(str::to_string);
    (response.status, token)
}

mod test_lifecycle {
    use super::*;

    #[tokio::test]
    async fn test_register_activate_login_logout() {
        let app = TestApp::new();
        let email = "alice@example.com";
        register(&app, email).await;

        // Registered but inactive: login works, reads are refused
        let (status, bearer) = login(&app, email, PASSWORD).await;
        assert_eq!(status, StatusCode::CREATED);
        let bearer = bearer.unwrap();
        let response = app
            .send(TestRequest::get("/v1/movies").bearer(&bearer))
            .await;
        assert_error(&response, StatusCode::FORBIDDEN, INACTIVE_ACCOUNT_MESSAGE);

        let token = activation_token(&app, email).await;
        let response = app
            .send(TestRequest::put("/v1/users/activated", json!({"token": token})))
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        assert_eq!(response.body["user"]["is_active"], true);

        // Activation bumped the account version; the bearer token still resolves
        let response = app
            .send(TestRequest::get("/v1/movies").bearer(&bearer))
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);

        let response = app
            .send(TestRequest::delete("/v1/tokens/authentication").bearer(&bearer))
            .await;
        assert_eq!(response.status, StatusCode::OK);

        let response = app
            .send(TestRequest::get("/v1/movies").bearer(&bearer))
            .await;
        assert_error(&response, StatusCode::UNAUTHORIZED, INVALID_TOKEN_MESSAGE);
    }

    #[tokio::test]
    async fn test_activation_token_is_single_use() {
        let app = TestApp::new();
        let email = "bob@example.com";
        register(&app, email).await;
        let token = activation_token(&app, email).await;

        let first = app
            .send(TestRequest::put("/v1/users/activated", json!({"token": token})))
            .await;
        assert_eq!(first.status, StatusCode::OK);

        let second = app
            .send(TestRequest::put("/v1/users/activated", json!({"token": token})))
            .await;
        assert_eq!(second.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(second.body["error"]["token"], "invalid or expired activation token");
    }

    #[tokio::test]
    async fn test_email_uniqueness_ignores_case() {
        let app = TestApp::new();
        register(&app, "carol@example.com").await;

        let response = app
            .send(TestRequest::post(
                "/v1/users",
                json!({"first_name": "Carol", "email": "CAROL@example.com", "password": PASSWORD}),
            ))
            .await;
        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(response.body["error"]["email"].is_string());
    }

    #[tokio::test]
    async fn test_wrong_password_is_unauthorized() {
        let app = TestApp::new();
        register(&app, "dave@example.com").await;

        let (status, token) = login(&app, "dave@example.com", "not-the-password").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(token.is_none());
    }
}

mod test_operator_grants {
    use super::*;

    #[tokio::test]
    async fn test_granted_permission_applies_on_next_request() {
        let app = TestApp::new();
        let admin = UserFixture::with_roles(&app, &["admin"]).await.unwrap();
        let member = UserFixture::with_roles(&app, &["user"]).await.unwrap();

        let response = app
            .send(TestRequest::post("/v1/movies", movie_body("Moana")).bearer(member.bearer()))
            .await;
        assert_eq!(response.status, StatusCode::FORBIDDEN);

        let response = app
            .send(
                TestRequest::post(
                    format!("/v1/users/{}/permissions", member.user.id),
                    json!({"codes": ["movies:write"]}),
                )
                .bearer(admin.bearer()),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);

        let response = app
            .send(TestRequest::post("/v1/movies", movie_body("Moana")).bearer(member.bearer()))
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    }

    #[tokio::test]
    async fn test_deleted_account_loses_access() {
        let app = TestApp::new();
        let admin = UserFixture::with_roles(&app, &["admin"]).await.unwrap();
        let member = UserFixture::with_roles(&app, &["user"]).await.unwrap();

        let response = app
            .send(
                TestRequest::delete(format!("/v1/users/{}", member.user.id))
                    .header("x-expected-version", member.user.version.to_string())
                    .bearer(admin.bearer()),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);

        let response = app
            .send(TestRequest::get("/v1/movies").bearer(member.bearer()))
            .await;
        assert_error(&response, StatusCode::UNAUTHORIZED, INVALID_TOKEN_MESSAGE);

        let response = app
            .send(
                TestRequest::get(format!("/v1/users/{}", member.user.id)).bearer(admin.bearer()),
            )
            .await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }
}
