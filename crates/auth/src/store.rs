//! Storage seams for tokens and permissions
//!
//! `TokenService` and `AccessController` only talk to these traits. The
//! Postgres implementation lives in `backend`, the in-memory one in `mock`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use greenlight_common::RepositoryError;
use uuid::Uuid;

use crate::token::Token;
use crate::types::{AuthIdentity, Permissions, TokenScope};

#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Persist the digest, owner, expiry, and scope of a freshly issued token
    async fn insert_token(&self, token: &Token) -> Result<(), RepositoryError>;

    /// Owner of the live token with `hash` in `scope`.
    ///
    /// Expired tokens and tokens of deleted owners never match.
    async fn find_identity_for_token(
        &self,
        scope: TokenScope,
        hash: &[u8],
        now: DateTime<Utc>,
    ) -> Result<Option<AuthIdentity>, RepositoryError>;

    /// Remove every token of `principal_id` in `scope`, returning how many went
    async fn delete_tokens_for(
        &self,
        principal_id: Uuid,
        scope: TokenScope,
    ) -> Result<u64, RepositoryError>;
}

#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// Union of direct grants and grants of every role the principal holds
    async fn effective_permissions(&self, principal_id: Uuid)
        -> Result<Permissions, RepositoryError>;

    /// Role codes the principal belongs to, sorted
    async fn roles_for(&self, principal_id: Uuid) -> Result<Vec<String>, RepositoryError>;

    /// Grant permissions directly; already-held and unknown codes are skipped
    async fn grant_permissions(
        &self,
        principal_id: Uuid,
        codes: &[String],
    ) -> Result<u64, RepositoryError>;

    /// Add the principal to roles; already-held and unknown roles are skipped
    async fn assign_roles(&self, principal_id: Uuid, roles: &[String])
        -> Result<u64, RepositoryError>;

    /// Bundle more permissions into an existing role
    async fn grant_role_permissions(
        &self,
        role: &str,
        codes: &[String],
    ) -> Result<u64, RepositoryError>;
}
