//! In-memory auth store for tests and local development

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use greenlight_common::{constant_time_eq, RepositoryError};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::permission::{is_known_permission, ROLE_PERMISSIONS};
use crate::store::{PermissionStore, TokenStore};
use crate::token::Token;
use crate::types::{AuthIdentity, Permissions, TokenScope};

#[derive(Debug, Clone)]
struct StoredToken {
    hash: Vec<u8>,
    principal_id: Uuid,
    expiry: DateTime<Utc>,
    scope: TokenScope,
}

/// Token and permission storage held in process memory.
///
/// Identities are registered with [`put_identity`](Self::put_identity) by
/// whatever owns the user records; a removed identity behaves like a
/// soft-deleted user row.
pub struct MemoryAuthStore {
    identities: RwLock<HashMap<Uuid, AuthIdentity>>,
    tokens: RwLock<Vec<StoredToken>>,
    direct: RwLock<HashMap<Uuid, BTreeSet<String>>>,
    memberships: RwLock<HashMap<Uuid, BTreeSet<String>>>,
    roles: RwLock<HashMap<String, BTreeSet<String>>>,
}

impl MemoryAuthStore {
    /// Empty store seeded with the role catalogue
    pub fn new() -> Self {
        let roles = ROLE_PERMISSIONS
            .iter()
            .map(|(role, codes)| {
                (
                    role.to_string(),
                    codes.iter().map(|c| c.to_string()).collect(),
                )
            })
            .collect();

        Self {
            identities: RwLock::new(HashMap::new()),
            tokens: RwLock::new(Vec::new()),
            direct: RwLock::new(HashMap::new()),
            memberships: RwLock::new(HashMap::new()),
            roles: RwLock::new(roles),
        }
    }

    pub fn put_identity(&self, identity: AuthIdentity) {
        self.identities.write().insert(identity.id, identity);
    }

    pub fn remove_identity(&self, id: Uuid) {
        self.identities.write().remove(&id);
    }

    /// Live and expired tokens held for `principal_id` in `scope`
    pub fn token_count(&self, principal_id: Uuid, scope: TokenScope) -> usize {
        self.tokens
            .read()
            .iter()
            .filter(|t| t.principal_id == principal_id && t.scope == scope)
            .count()
    }
}

impl Default for MemoryAuthStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenStore for MemoryAuthStore {
    async fn insert_token(&self, token: &Token) -> Result<(), RepositoryError> {
        let mut tokens = self.tokens.write();
        if tokens.iter().any(|t| t.hash == token.hash) {
            return Err(RepositoryError::AlreadyExists);
        }
        tokens.push(StoredToken {
            hash: token.hash.clone(),
            principal_id: token.principal_id,
            expiry: token.expiry,
            scope: token.scope,
        });
        Ok(())
    }

    async fn find_identity_for_token(
        &self,
        scope: TokenScope,
        hash: &[u8],
        now: DateTime<Utc>,
    ) -> Result<Option<AuthIdentity>, RepositoryError> {
        let owner = self
            .tokens
            .read()
            .iter()
            .find(|t| t.scope == scope && t.expiry > now && constant_time_eq(&t.hash, hash))
            .map(|t| t.principal_id);

        Ok(owner.and_then(|id| self.identities.read().get(&id).cloned()))
    }

    async fn delete_tokens_for(
        &self,
        principal_id: Uuid,
        scope: TokenScope,
    ) -> Result<u64, RepositoryError> {
        let mut tokens = self.tokens.write();
        let before = tokens.len();
        tokens.retain(|t| !(t.principal_id == principal_id && t.scope == scope));
        Ok((before - tokens.len()) as u64)
    }
}

#[async_trait]
impl PermissionStore for MemoryAuthStore {
    async fn effective_permissions(
        &self,
        principal_id: Uuid,
    ) -> Result<Permissions, RepositoryError> {
        let mut codes: BTreeSet<String> = self
            .direct
            .read()
            .get(&principal_id)
            .cloned()
            .unwrap_or_default();

        let roles = self.roles.read();
        if let Some(held) = self.memberships.read().get(&principal_id) {
            for role in held {
                if let Some(granted) = roles.get(role) {
                    codes.extend(granted.iter().cloned());
                }
            }
        }

        Ok(codes.into_iter().collect())
    }

    async fn roles_for(&self, principal_id: Uuid) -> Result<Vec<String>, RepositoryError> {
        Ok(self
            .memberships
            .read()
            .get(&principal_id)
            .map(|roles| roles.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn grant_permissions(
        &self,
        principal_id: Uuid,
        codes: &[String],
    ) -> Result<u64, RepositoryError> {
        let mut direct = self.direct.write();
        let held = direct.entry(principal_id).or_default();
        let granted = codes
            .iter()
            .filter(|code| is_known_permission(code))
            .filter(|code| held.insert(code.to_string()))
            .count();
        Ok(granted as u64)
    }

    async fn assign_roles(
        &self,
        principal_id: Uuid,
        roles: &[String],
    ) -> Result<u64, RepositoryError> {
        let catalogue = self.roles.read();
        let mut memberships = self.memberships.write();
        let held = memberships.entry(principal_id).or_default();
        let assigned = roles
            .iter()
            .filter(|role| catalogue.contains_key(role.as_str()))
            .filter(|role| held.insert(role.to_string()))
            .count();
        Ok(assigned as u64)
    }

    async fn grant_role_permissions(
        &self,
        role: &str,
        codes: &[String],
    ) -> Result<u64, RepositoryError> {
        let mut roles = self.roles.write();
        let Some(granted) = roles.get_mut(role) else {
            return Ok(0);
        };
        let added = codes
            .iter()
            .filter(|code| is_known_permission(code))
            .filter(|code| granted.insert(code.to_string()))
            .count();
        Ok(added as u64)
    }
}
