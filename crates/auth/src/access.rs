//! Permission checks
//!
//! `decide` is the pure rule; `AccessController` loads the effective
//! permission set from storage and applies it.

use std::sync::Arc;

use uuid::Uuid;

use crate::error::AuthError;
use crate::store::PermissionStore;
use crate::types::{Permissions, Principal};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allowed,
    /// Anonymous caller on a protected operation
    Unauthenticated,
    /// Authenticated but not yet activated
    Inactive,
    NotPermitted,
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allowed)
    }

    pub fn into_result(self) -> Result<(), AuthError> {
        match self {
            AccessDecision::Allowed => Ok(()),
            AccessDecision::Unauthenticated => Err(AuthError::AuthenticationRequired),
            AccessDecision::Inactive => Err(AuthError::InactiveAccount),
            AccessDecision::NotPermitted => Err(AuthError::NotPermitted),
        }
    }
}

/// Decide whether `principal`, holding `permissions`, may perform an
/// operation requiring `required`. An empty requirement admits everyone.
pub fn decide(principal: &Principal, permissions: &Permissions, required: &str) -> AccessDecision {
    if required.is_empty() {
        return AccessDecision::Allowed;
    }

    match principal {
        Principal::Anonymous => AccessDecision::Unauthenticated,
        Principal::Authenticated(identity) if !identity.is_active => AccessDecision::Inactive,
        Principal::Authenticated(_) if permissions.includes(required) => AccessDecision::Allowed,
        Principal::Authenticated(_) => AccessDecision::NotPermitted,
    }
}

#[derive(Clone)]
pub struct AccessController {
    store: Arc<dyn PermissionStore>,
}

impl AccessController {
    pub fn new(store: Arc<dyn PermissionStore>) -> Self {
        Self { store }
    }

    pub async fn effective_permissions(&self, principal_id: Uuid) -> Result<Permissions, AuthError> {
        Ok(self.store.effective_permissions(principal_id).await?)
    }

    /// Evaluate `required` for `principal`.
    ///
    /// Anonymous and inactive principals are decided without touching storage.
    pub async fn authorize(
        &self,
        principal: &Principal,
        required: &str,
    ) -> Result<AccessDecision, AuthError> {
        let permissions = match principal {
            Principal::Authenticated(identity) if identity.is_active && !required.is_empty() => {
                self.effective_permissions(identity.id).await?
            }
            _ => Permissions::new(),
        };

        let decision = decide(principal, &permissions, required);
        if !decision.is_allowed() {
            tracing::debug!(
                user_id = ?principal.identity().map(|i| i.id),
                required,
                decision = ?decision,
                "Access denied"
            );
        }
        Ok(decision)
    }

    pub async fn roles_for(&self, principal_id: Uuid) -> Result<Vec<String>, AuthError> {
        Ok(self.store.roles_for(principal_id).await?)
    }

    pub async fn grant_permissions(
        &self,
        principal_id: Uuid,
        codes: &[String],
    ) -> Result<u64, AuthError> {
        let granted = self.store.grant_permissions(principal_id, codes).await?;
        tracing::info!(user_id = %principal_id, ?codes, granted, "Permissions granted");
        Ok(granted)
    }

    pub async fn assign_roles(&self, principal_id: Uuid, roles: &[String]) -> Result<u64, AuthError> {
        let assigned = self.store.assign_roles(principal_id, roles).await?;
        tracing::info!(user_id = %principal_id, ?roles, assigned, "Roles assigned");
        Ok(assigned)
    }

    pub async fn grant_role_permissions(
        &self,
        role: &str,
        codes: &[String],
    ) -> Result<u64, AuthError> {
        Ok(self.store.grant_role_permissions(role, codes).await?)
    }
}
