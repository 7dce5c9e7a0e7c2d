//! Postgres auth store
//!
//! Owns the token and permission SQL. Uses runtime `sqlx::query_as` against
//! the `users`, `tokens`, `permissions`, `roles` tables and their join
//! tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use greenlight_common::RepositoryError;
use sqlx::PgPool;
use uuid::Uuid;

use crate::store::{PermissionStore, TokenStore};
use crate::token::Token;
use crate::types::{AuthIdentity, Permissions, TokenScope};

/// Postgres-backed [`TokenStore`] and [`PermissionStore`].
#[derive(Clone)]
pub struct PgAuthStore {
    pool: PgPool,
}

impl PgAuthStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenStore for PgAuthStore {
    async fn insert_token(&self, token: &Token) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO tokens (hash, user_id, expiry, scope)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&token.hash)
        .bind(token.principal_id)
        .bind(token.expiry)
        .bind(token.scope.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id = %token.principal_id, "Failed to store token");
            RepositoryError::from_unique_violation(e, "tokens_pkey")
        })?;

        Ok(())
    }

    async fn find_identity_for_token(
        &self,
        scope: TokenScope,
        hash: &[u8],
        now: DateTime<Utc>,
    ) -> Result<Option<AuthIdentity>, RepositoryError> {
        let identity: Option<AuthIdentity> = sqlx::query_as(
            r#"
            SELECT u.id, u.email, u.is_active, u.version
            FROM users u
            INNER JOIN tokens t ON u.id = t.user_id
            WHERE t.hash = $1
              AND t.scope = $2
              AND t.expiry > $3
              AND u.deleted_at IS NULL
            "#,
        )
        .bind(hash)
        .bind(scope.as_str())
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, scope = %scope, "Failed to resolve token");
            RepositoryError::Connection(e)
        })?;

        Ok(identity)
    }

    async fn delete_tokens_for(
        &self,
        principal_id: Uuid,
        scope: TokenScope,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM tokens WHERE user_id = $1 AND scope = $2")
            .bind(principal_id)
            .bind(scope.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, user_id = %principal_id, scope = %scope, "Failed to revoke tokens");
                RepositoryError::Connection(e)
            })?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl PermissionStore for PgAuthStore {
    async fn effective_permissions(
        &self,
        principal_id: Uuid,
    ) -> Result<Permissions, RepositoryError> {
        let codes: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT p.code
            FROM permissions p
            WHERE p.id IN (
                SELECT up.permission_id FROM users_permissions up WHERE up.user_id = $1
                UNION
                SELECT rp.permission_id
                FROM roles_permissions rp
                INNER JOIN users_roles ur ON ur.role_id = rp.role_id
                WHERE ur.user_id = $1
            )
            ORDER BY p.code
            "#,
        )
        .bind(principal_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id = %principal_id, "Failed to load permissions");
            RepositoryError::Connection(e)
        })?;

        Ok(codes.into_iter().collect())
    }

    async fn roles_for(&self, principal_id: Uuid) -> Result<Vec<String>, RepositoryError> {
        let roles: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT r.code
            FROM roles r
            INNER JOIN users_roles ur ON ur.role_id = r.id
            WHERE ur.user_id = $1
            ORDER BY r.code
            "#,
        )
        .bind(principal_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id = %principal_id, "Failed to load roles");
            RepositoryError::Connection(e)
        })?;

        Ok(roles)
    }

    async fn grant_permissions(
        &self,
        principal_id: Uuid,
        codes: &[String],
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r#"
            INSERT INTO users_permissions (user_id, permission_id)
            SELECT $1, p.id FROM permissions p WHERE p.code = ANY($2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(principal_id)
        .bind(codes)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id = %principal_id, "Failed to grant permissions");
            RepositoryError::Connection(e)
        })?;

        Ok(result.rows_affected())
    }

    async fn assign_roles(
        &self,
        principal_id: Uuid,
        roles: &[String],
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r#"
            INSERT INTO users_roles (user_id, role_id)
            SELECT $1, r.id FROM roles r WHERE r.code = ANY($2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(principal_id)
        .bind(roles)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id = %principal_id, "Failed to assign roles");
            RepositoryError::Connection(e)
        })?;

        Ok(result.rows_affected())
    }

    async fn grant_role_permissions(
        &self,
        role: &str,
        codes: &[String],
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r#"
            INSERT INTO roles_permissions (role_id, permission_id)
            SELECT r.id, p.id
            FROM roles r CROSS JOIN permissions p
            WHERE r.code = $1 AND p.code = ANY($2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(role)
        .bind(codes)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, role, "Failed to grant role permissions");
            RepositoryError::Connection(e)
        })?;

        Ok(result.rows_affected())
    }
}
