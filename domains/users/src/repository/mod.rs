//! User storage
//!
//! Profile, activation and deletion writes are version-guarded; see
//! `greenlight_common::concurrency`.

pub mod memory;
pub mod users;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use greenlight_common::{Filters, RepositoryError};
use uuid::Uuid;

use crate::domain::entities::{NewUser, User};

pub use memory::MemoryUserStore;
pub use users::PgUserRepository;

/// Columns `GET /v1/users` may sort by
pub const USER_SORT_SAFELIST: &[&str] = &[
    "id",
    "username",
    "email",
    "first_name",
    "last_name",
    "-id",
    "-username",
    "-email",
    "-first_name",
    "-last_name",
];

/// Search and paging for a user listing.
///
/// Each text filter is a case-insensitive substring match; empty matches
/// everything.
#[derive(Debug, Clone)]
pub struct UserQuery {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub filters: Filters,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Store a new, inactive account; a taken email is `AlreadyExists`
    async fn insert(&self, user: NewUser) -> Result<User, RepositoryError>;

    async fn get(&self, id: Uuid) -> Result<Option<User>, RepositoryError>;

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;

    /// Write `user`'s mutable fields if the stored version still equals
    /// `expected_version`; returns the new version.
    async fn update(&self, user: &User, expected_version: i32) -> Result<i32, RepositoryError>;

    /// Stamp a successful login. Not version-guarded.
    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), RepositoryError>;

    /// Soft-delete under the same guard as `update`
    async fn delete(&self, id: Uuid, expected_version: i32) -> Result<(), RepositoryError>;

    /// Matching page of users and the total number of matches
    async fn list(&self, query: &UserQuery) -> Result<(Vec<User>, i64), RepositoryError>;
}
