//! Router harness over in-memory stores

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use greenlight_auth::{AccessController, AuthConfig, MemoryAuthStore, Principal, TokenService};
use greenlight_common::BackgroundTasks;
use greenlight_email::mock::MockEmailService;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use crate::api::{routes, UsersState};
use crate::repository::MemoryUserStore;

pub(crate) struct Harness {
    pub app: Router,
    pub state: UsersState,
    pub email: Arc<MockEmailService>,
}

pub(crate) fn harness() -> Harness {
    let auth = Arc::new(MemoryAuthStore::new());
    let email = Arc::new(MockEmailService::new());

    let state = UsersState {
        users: Arc::new(MemoryUserStore::new(auth.clone())),
        tokens: TokenService::new(auth.clone()),
        access: AccessController::new(auth),
        email: email.clone(),
        background: BackgroundTasks::new(),
        auth_config: AuthConfig {
            password_cost: 4,
            ..AuthConfig::default()
        },
    };

    Harness {
        app: routes().with_state(state.clone()),
        state,
        email,
    }
}

pub(crate) async fn send(
    app: &Router,
    principal: Option<&Principal>,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let mut request = builder.body(body).unwrap();
    request
        .extensions_mut()
        .insert(principal.cloned().unwrap_or(Principal::Anonymous));

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

/// Poll the mock mailbox until the background send has landed
pub(crate) async fn activation_token_for(email: &MockEmailService, to: &str) -> String {
    for _ in 0..100 {
        if let Some(token) = email.get_activation_token_for(to) {
            return token;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("no activation email for {to}");
}

pub(crate) async fn register(h: &Harness, email: &str) -> Uuid {
    let (status, body) = send(
        &h.app,
        None,
        "POST",
        "/v1/users",
        Some(json!({"first_name": "Test", "email": email, "password": "pa55word"})),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED, "{body}");
    body["user"]["id"].as_str().unwrap().parse().unwrap()
}

/// Principal for a registered account as the auth middleware would resolve it
pub(crate) async fn principal_for(h: &Harness, id: Uuid) -> Principal {
    let user = h.state.users.get(id).await.unwrap().unwrap();
    Principal::Authenticated(user.identity())
}
