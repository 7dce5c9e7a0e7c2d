//! Common test utilities and fixtures for integration tests
//!
//! Builds the full application (every middleware layer included) over the
//! in-memory stores, or PostgreSQL when `TEST_DATABASE_URL` is set, and the
//! mock mail service:
//! - `TestApp` owns the router and the shared state behind it
//! - `UserFixture` creates accounts with chosen activation and grants
//! - request helpers attach a peer address the way the server does

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Once};

use anyhow::Result;
use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, HeaderMap, Method, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::Duration;
use greenlight_app::{create_app, AppState};
use greenlight_auth::{Token, TokenScope};
use greenlight_common::config::Config;
use greenlight_email::mock::MockEmailService;
use greenlight_users::{NewUser, User};
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

pub const DEFAULT_PEER: IpAddr = IpAddr::V4(Ipv4Addr::new(203, 0, 113, 7));

/// Bcrypt cost low enough for tests that go through registration
const TEST_PASSWORD_COST: u32 = 4;

static INIT: Once = Once::new();

/// PostgreSQL URL for the database-backed tests, if one is configured
pub fn test_database_url() -> Option<String> {
    INIT.call_once(|| {
        dotenvy::from_filename(".env.test").ok();
    });
    env::var("TEST_DATABASE_URL").ok()
}

fn test_config(pairs: &[(&str, &str)]) -> Config {
    let mut vars: Vec<(String, String)> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    // Only consulted by the in-memory app; earlier pairs win
    vars.push((
        "DATABASE_URL".to_string(),
        "postgres://localhost/greenlight_unused".to_string(),
    ));

    Config::from_lookup(move |key| {
        vars.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    })
    .expect("test configuration is valid")
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub email: Arc<MockEmailService>,
}

impl TestApp {
    /// Application with the rate limiter switched off
    pub fn new() -> Self {
        Self::with_env(&[("LIMITER_ENABLED", "false")])
    }

    /// Application limited to `burst` requests refilled at `rps` per second
    pub fn with_limiter(rps: f64, burst: u32) -> Self {
        let rps = rps.to_string();
        let burst = burst.to_string();
        Self::with_env(&[
            ("LIMITER_ENABLED", "true"),
            ("LIMITER_RPS", rps.as_str()),
            ("LIMITER_BURST", burst.as_str()),
        ])
    }

    pub fn with_env(pairs: &[(&str, &str)]) -> Self {
        let email = Arc::new(MockEmailService::new());
        let state = AppState::in_memory(test_config(pairs), email.clone());
        Self::from_state(state, email)
    }

    /// Application over a migrated PostgreSQL database.
    ///
    /// `None` when `TEST_DATABASE_URL` is unset, so callers can skip.
    pub async fn postgres() -> Result<Option<Self>> {
        let Some(url) = test_database_url() else {
            eprintln!("TEST_DATABASE_URL not set, skipping PostgreSQL test");
            return Ok(None);
        };

        let pool = PgPool::connect(&url).await?;
        sqlx::migrate!("../../migrations").run(&pool).await?;

        let config = test_config(&[("LIMITER_ENABLED", "false"), ("DATABASE_URL", url.as_str())]);
        let email = Arc::new(MockEmailService::new());
        let state = AppState::postgres(config, pool, email.clone());
        Ok(Some(Self::from_state(state, email)))
    }

    fn from_state(mut state: AppState, email: Arc<MockEmailService>) -> Self {
        state.auth_config.password_cost = TEST_PASSWORD_COST;
        Self {
            router: create_app(state.clone()),
            state,
            email,
        }
    }

    /// Send a request from the default peer
    pub async fn send(&self, request: TestRequest) -> TestResponse {
        self.send_from(DEFAULT_PEER, request).await
    }

    pub async fn send_from(&self, peer: IpAddr, request: TestRequest) -> TestResponse {
        let mut req = request.build();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::new(peer, 40000)));

        let response = self.router.clone().oneshot(req).await.unwrap();
        TestResponse::read(response).await
    }
}

/// Request under construction
pub struct TestRequest {
    method: Method,
    uri: String,
    bearer: Option<String>,
    headers: Vec<(String, String)>,
    body: Option<Value>,
}

impl TestRequest {
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            bearer: None,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(uri: impl Into<String>) -> Self {
        Self::new(Method::GET, uri)
    }

    pub fn post(uri: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, uri).json(body)
    }

    pub fn patch(uri: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PATCH, uri).json(body)
    }

    pub fn put(uri: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PUT, uri).json(body)
    }

    pub fn delete(uri: impl Into<String>) -> Self {
        Self::new(Method::DELETE, uri)
    }

    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    fn build(self) -> Request<Body> {
        let mut builder = Request::builder().method(self.method).uri(self.uri);
        if let Some(token) = self.bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        for (name, value) in self.headers {
            builder = builder.header(name, value);
        }

        match self.body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }
}

/// Buffered response
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    async fn read(response: Response) -> Self {
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn header(&self, name: header::HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Every value of a possibly repeated header
    pub fn header_values(&self, name: header::HeaderName) -> Vec<String> {
        self.headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect()
    }
}

/// Account with a bearer token, created straight through the stores
pub struct UserFixture {
    pub user: User,
    pub token: Token,
}

impl UserFixture {
    /// Active account holding `roles`
    pub async fn with_roles(app: &TestApp, roles: &[&str]) -> Result<Self> {
        Self::create(app, true, roles, &[]).await
    }

    /// Active account holding exactly `permissions`, no roles
    pub async fn with_permissions(app: &TestApp, permissions: &[&str]) -> Result<Self> {
        Self::create(app, true, &[], permissions).await
    }

    /// Account that has not been activated yet
    pub async fn inactive(app: &TestApp, permissions: &[&str]) -> Result<Self> {
        Self::create(app, false, &[], permissions).await
    }

    pub async fn create(
        app: &TestApp,
        active: bool,
        roles: &[&str],
        permissions: &[&str],
    ) -> Result<Self> {
        let tag = Uuid::new_v4().simple().to_string();
        let mut user = app
            .state
            .users
            .insert(NewUser {
                first_name: "Test".to_string(),
                last_name: None,
                username: None,
                email: format!("user_{tag}@greenlight.test"),
                password_hash: "not-a-real-hash".to_string(),
            })
            .await?;

        if active {
            user.is_active = true;
            user.version = app.state.users.update(&user, user.version).await?;
        }

        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        if !roles.is_empty() {
            app.state.access.assign_roles(user.id, &strings(roles)).await?;
        }
        if !permissions.is_empty() {
            app.state
                .access
                .grant_permissions(user.id, &strings(permissions))
                .await?;
        }

        let token = app
            .state
            .tokens
            .issue(user.id, Duration::hours(1), TokenScope::Authentication)
            .await?;

        Ok(Self { user, token })
    }

    pub fn bearer(&self) -> &str {
        &self.token.plaintext
    }
}

pub mod assertions {
    use super::*;

    pub fn assert_error(response: &TestResponse, status: StatusCode, message: &str) {
        assert_eq!(response.status, status, "body: {}", response.body);
        assert_eq!(response.body["error"], message, "body: {}", response.body);
    }

    pub fn assert_varies_by_authorization(response: &TestResponse) {
        let vary = response.header_values(header::VARY);
        assert!(
            vary.iter().any(|v| v.eq_ignore_ascii_case("authorization")),
            "missing Vary: Authorization in {vary:?}"
        );
    }
}

pub fn movie_body(title: &str) -> Value {
    serde_json::json!({
        "title": title,
        "year": 2016,
        "runtime": "107 mins",
        "genres": ["animation", "adventure"],
    })
}

/// Create a movie as `fixture` and return its id
pub async fn create_movie(app: &TestApp, fixture: &UserFixture, title: &str) -> i64 {
    let response = app
        .send(TestRequest::post("/v1/movies", movie_body(title)).bearer(fixture.bearer()))
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    response.body["movie"]["id"].as_i64().unwrap()
}
