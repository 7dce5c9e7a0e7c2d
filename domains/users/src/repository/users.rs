//! User repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use greenlight_common::{GuardedWrite, RepositoryError};
use sqlx::PgPool;
use uuid::Uuid;

use super::{UserQuery, UserStore};
use crate::domain::entities::{NewUser, User};

/// Unique index over live rows' lower-cased emails
const EMAIL_UNIQUE_INDEX: &str = "users_email_key";

const USER_COLUMNS: &str = "id, first_name, last_name, username, email, password_hash, \
     is_active, is_staff, is_superuser, last_login, created_at, updated_at, version, deleted_at";

#[derive(sqlx::FromRow)]
struct UserListRow {
    total_records: i64,
    #[sqlx(flatten)]
    user: User,
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserRepository {
    async fn insert(&self, user: NewUser) -> Result<User, RepositoryError> {
        let sql = format!(
            r#"
            INSERT INTO users (first_name, last_name, username, email, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        );

        sqlx::query_as(&sql)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                let err = RepositoryError::from_unique_violation(e, EMAIL_UNIQUE_INDEX);
                if !matches!(err, RepositoryError::AlreadyExists) {
                    tracing::error!(error = %err, "Failed to insert user");
                }
                err
            })
    }

    async fn get(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        let sql =
            format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND deleted_at IS NULL");

        sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, user_id = %id, "Failed to load user");
                RepositoryError::Connection(e)
            })
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1) AND deleted_at IS NULL"
        );

        sqlx::query_as(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to load user by email");
                RepositoryError::Connection(e)
            })
    }

    async fn update(&self, user: &User, expected_version: i32) -> Result<i32, RepositoryError> {
        let written: GuardedWrite = sqlx::query_as(
            r#"
            WITH written AS (
                UPDATE users
                SET first_name = $3, last_name = $4, username = $5, email = $6,
                    password_hash = $7, is_active = $8, is_staff = $9, is_superuser = $10,
                    updated_at = NOW(), version = version + 1
                WHERE id = $1 AND version = $2 AND deleted_at IS NULL
                RETURNING version
            )
            SELECT (SELECT version FROM written) AS new_version,
                   EXISTS (SELECT 1 FROM users WHERE id = $1 AND deleted_at IS NULL) AS present
            "#,
        )
        .bind(user.id)
        .bind(expected_version)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_active)
        .bind(user.is_staff)
        .bind(user.is_superuser)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            let err = RepositoryError::from_unique_violation(e, EMAIL_UNIQUE_INDEX);
            if !matches!(err, RepositoryError::AlreadyExists) {
                tracing::error!(error = %err, user_id = %user.id, "Failed to update user");
            }
            err
        })?;

        written.outcome().into_result()
    }

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE users SET last_login = $2 WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, user_id = %id, "Failed to record login");
                RepositoryError::Connection(e)
            })?;

        Ok(())
    }

    async fn delete(&self, id: Uuid, expected_version: i32) -> Result<(), RepositoryError> {
        let written: GuardedWrite = sqlx::query_as(
            r#"
            WITH written AS (
                UPDATE users
                SET deleted_at = NOW(), updated_at = NOW(), version = version + 1
                WHERE id = $1 AND version = $2 AND deleted_at IS NULL
                RETURNING version
            )
            SELECT (SELECT version FROM written) AS new_version,
                   EXISTS (SELECT 1 FROM users WHERE id = $1 AND deleted_at IS NULL) AS present
            "#,
        )
        .bind(id)
        .bind(expected_version)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id = %id, "Failed to delete user");
            RepositoryError::Connection(e)
        })?;

        written.outcome().into_result().map(|_| ())
    }

    async fn list(&self, query: &UserQuery) -> Result<(Vec<User>, i64), RepositoryError> {
        // Column and direction come from the safelist, never from raw input
        let sql = format!(
            r#"
            SELECT count(*) OVER() AS total_records, {USER_COLUMNS}
            FROM users
            WHERE ($1 = '' OR first_name ILIKE '%' || $1 || '%')
              AND ($2 = '' OR last_name ILIKE '%' || $2 || '%')
              AND ($3 = '' OR username ILIKE '%' || $3 || '%')
              AND ($4 = '' OR email ILIKE '%' || $4 || '%')
              AND deleted_at IS NULL
            ORDER BY {} {}, id ASC
            LIMIT $5 OFFSET $6
            "#,
            query.filters.sort_column(),
            query.filters.sort_direction().as_sql(),
        );

        let rows: Vec<UserListRow> = sqlx::query_as(&sql)
            .bind(&query.first_name)
            .bind(&query.last_name)
            .bind(&query.username)
            .bind(&query.email)
            .bind(query.filters.limit())
            .bind(query.filters.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to list users");
                RepositoryError::Connection(e)
            })?;

        let total = rows.first().map(|r| r.total_records).unwrap_or(0);
        Ok((rows.into_iter().map(|r| r.user).collect(), total))
    }
}
