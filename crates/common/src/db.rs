//! Shared database types for Greenlight
//!
//! This module provides common database-related types used across domain repositories.

use std::time::Duration;

use crate::error::Error;
use sqlx::postgres::{PgPool, PgPoolOptions};
use thiserror::Error;

/// Database-specific error types
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Record already exists")]
    AlreadyExists,

    /// A version-guarded write matched no row although the record exists
    #[error("Edit conflict")]
    EditConflict,

    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl RepositoryError {
    /// Classify a unique-constraint violation on `constraint` as `AlreadyExists`.
    pub fn from_unique_violation(err: sqlx::Error, constraint: &str) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() && db_err.constraint() == Some(constraint) {
                return RepositoryError::AlreadyExists;
            }
        }
        RepositoryError::Connection(err)
    }
}

impl From<RepositoryError> for Error {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Error::not_found(),
            RepositoryError::AlreadyExists => Error::BadRequest("Record already exists".to_string()),
            RepositoryError::EditConflict => Error::EditConflict,
            RepositoryError::Connection(e) => Error::Database(e),
            RepositoryError::InvalidData(msg) => Error::Internal(msg),
        }
    }
}

/// Connection pool settings
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub max_idle_time: Duration,
    pub acquire_timeout: Duration,
}

/// Open a PostgreSQL pool and verify it with a round trip.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .idle_timeout(config.max_idle_time)
        .acquire_timeout(config.acquire_timeout)
        .connect(&config.url)
        .await?;

    sqlx::query("SELECT 1").execute(&pool).await?;

    Ok(pool)
}
