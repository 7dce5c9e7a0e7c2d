//! Greenlight application composition root
//!
//! Wires the stores, the domain routers, and the ordered middleware chain
//! into a single application.

pub mod metrics;
mod recovery;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware::from_fn_with_state,
    routing::get,
    Json, Router,
};
use greenlight_auth::{
    authenticate, AccessController, AuthConfig, MemoryAuthStore, PermissionStore, PgAuthStore,
    TokenService, TokenStore,
};
use greenlight_common::{config::Config, BackgroundTasks, Error};
use greenlight_email::EmailService;
use greenlight_limiter::{rate_limit, LimiterConfig, RateLimiter};
use greenlight_movies::{MemoryMovieStore, MovieStore, MoviesState, PgMovieRepository};
use greenlight_users::{MemoryUserStore, PgUserRepository, UserStore, UsersState};
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

pub use metrics::Metrics;

/// Everything the router needs, shared by every request
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub tokens: TokenService,
    pub access: AccessController,
    pub limiter: Arc<RateLimiter>,
    pub movies: Arc<dyn MovieStore>,
    pub users: Arc<dyn UserStore>,
    pub email: Arc<dyn EmailService>,
    pub background: BackgroundTasks,
    pub auth_config: AuthConfig,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    /// PostgreSQL-backed state used by the `api` binary
    pub fn postgres(config: Config, pool: PgPool, email: Arc<dyn EmailService>) -> Self {
        let auth = Arc::new(PgAuthStore::new(pool.clone()));
        Self::assemble(
            config,
            auth.clone(),
            auth,
            Arc::new(PgMovieRepository::new(pool.clone())),
            Arc::new(PgUserRepository::new(pool)),
            email,
        )
    }

    /// Process-local state; nothing survives a restart
    pub fn in_memory(config: Config, email: Arc<dyn EmailService>) -> Self {
        let auth = Arc::new(MemoryAuthStore::new());
        let users = Arc::new(MemoryUserStore::new(auth.clone()));
        Self::assemble(
            config,
            auth.clone(),
            auth,
            Arc::new(MemoryMovieStore::new()),
            users,
            email,
        )
    }

    fn assemble(
        config: Config,
        token_store: Arc<dyn TokenStore>,
        permission_store: Arc<dyn PermissionStore>,
        movies: Arc<dyn MovieStore>,
        users: Arc<dyn UserStore>,
        email: Arc<dyn EmailService>,
    ) -> Self {
        let limiter = RateLimiter::new(LimiterConfig::new(
            config.limiter_rps,
            config.limiter_burst,
            config.limiter_enabled,
        ));

        Self {
            tokens: TokenService::new(token_store),
            access: AccessController::new(permission_store),
            limiter: Arc::new(limiter),
            movies,
            users,
            email,
            background: BackgroundTasks::new(),
            auth_config: AuthConfig::default(),
            metrics: Arc::new(Metrics::new()),
            config,
        }
    }

    fn movies_state(&self) -> MoviesState {
        MoviesState {
            movies: self.movies.clone(),
            access: self.access.clone(),
        }
    }

    fn users_state(&self) -> UsersState {
        UsersState {
            users: self.users.clone(),
            tokens: self.tokens.clone(),
            access: self.access.clone(),
            email: self.email.clone(),
            background: self.background.clone(),
            auth_config: self.auth_config.clone(),
        }
    }
}

/// Create the main application router with all routes and middleware
///
/// Layers run outermost first: metrics, tracing, panic recovery, request
/// deadline, CORS, rate limiting, authentication.
pub fn create_app(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(from_fn_with_state(state.metrics.clone(), metrics::track))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(recovery::recover_panic))
        .layer(TimeoutLayer::new(state.config.request_timeout))
        .layer(cors(&state.config.cors_trusted_origins))
        .layer(from_fn_with_state(state.limiter.clone(), rate_limit))
        .layer(from_fn_with_state(state.tokens.clone(), authenticate));

    let infrastructure = Router::new()
        .route("/v1/healthcheck", get(healthcheck))
        .route("/debug/vars", get(debug_vars))
        .with_state(state.clone());

    Router::new()
        .merge(infrastructure)
        .merge(greenlight_movies::routes().with_state(state.movies_state()))
        .merge(greenlight_users::routes().with_state(state.users_state()))
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(middleware)
}

fn cors(trusted_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = trusted_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(error = %e, origin, "Ignoring unusable trusted origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::OPTIONS, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}

/// GET /v1/healthcheck
async fn healthcheck(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "available",
        "system_info": {
            "environment": state.config.environment.as_str(),
            "version": env!("CARGO_PKG_VERSION"),
        },
    }))
}

/// GET /debug/vars
async fn debug_vars(State(state): State<AppState>) -> Json<Value> {
    Json(
        state
            .metrics
            .snapshot(state.background.in_flight(), state.limiter.len()),
    )
}

async fn not_found() -> Error {
    Error::not_found()
}

async fn method_not_allowed(method: Method) -> Error {
    Error::MethodNotAllowed(method.to_string())
}
