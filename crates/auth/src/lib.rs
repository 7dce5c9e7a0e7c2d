//! Authentication and authorization for Greenlight
//!
//! Opaque bearer tokens (`TokenService`), permission checks
//! (`AccessController`), the `authenticate` middleware, and axum extractors
//! that work with any state implementing `FromRef<S>` for `AccessController`.

pub mod access;
mod backend;
mod config;
mod error;
mod extractors;
pub mod middleware;
pub mod mock;
pub mod permission;
pub mod store;
pub mod token;
mod types;

pub use access::{decide, AccessController, AccessDecision};
pub use backend::PgAuthStore;
pub use config::AuthConfig;
pub use error::{
    AuthError, AUTHENTICATION_REQUIRED_MESSAGE, INACTIVE_ACCOUNT_MESSAGE, INVALID_TOKEN_MESSAGE,
    NOT_PERMITTED_MESSAGE,
};
pub use extractors::{ActivatedPrincipal, AuthenticatedPrincipal, RequirePermission};
pub use middleware::authenticate;
pub use mock::MemoryAuthStore;
pub use permission::{MoviesRead, MoviesWrite, PermissionCode, UsersRead, UsersWrite};
pub use store::{PermissionStore, TokenStore};
pub use token::{Token, TokenService, TOKEN_PLAINTEXT_LEN};
pub use types::{AuthIdentity, Permissions, Principal, TokenScope};
