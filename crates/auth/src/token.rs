//! Opaque token issuance and resolution
//!
//! A token's plaintext is 16 bytes from the OS random source encoded as
//! unpadded base-32 (26 characters). Only the SHA-256 digest is stored, so
//! a leaked `tokens` table cannot be replayed as credentials.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use data_encoding::BASE32_NOPAD;
use greenlight_common::{token_digest, Validator};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AuthError;
use crate::store::TokenStore;
use crate::types::{AuthIdentity, TokenScope};

/// Length of every token plaintext
pub const TOKEN_PLAINTEXT_LEN: usize = 26;

const TOKEN_ENTROPY_BYTES: usize = 16;

/// An issued token.
///
/// Serializes as `{"token": ..., "expiry": ...}`; the digest, owner, and
/// scope stay server-side.
#[derive(Debug, Clone, Serialize)]
pub struct Token {
    #[serde(rename = "token")]
    pub plaintext: String,
    #[serde(skip)]
    pub hash: Vec<u8>,
    #[serde(skip)]
    pub principal_id: Uuid,
    pub expiry: DateTime<Utc>,
    #[serde(skip)]
    pub scope: TokenScope,
}

impl Token {
    /// Mint a token without persisting it
    pub fn generate(
        principal_id: Uuid,
        ttl: Duration,
        scope: TokenScope,
    ) -> Result<Self, AuthError> {
        let mut entropy = [0u8; TOKEN_ENTROPY_BYTES];
        getrandom::getrandom(&mut entropy).map_err(|e| {
            tracing::error!(error = %e, "OS random source unavailable");
            AuthError::RandomSource(e.to_string())
        })?;

        let plaintext = BASE32_NOPAD.encode(&entropy);
        let hash = token_digest(&plaintext).to_vec();

        Ok(Self {
            plaintext,
            hash,
            principal_id,
            expiry: Utc::now() + ttl,
            scope,
        })
    }
}

/// Check that a presented plaintext could be a token at all
pub fn has_token_shape(plaintext: &str) -> bool {
    plaintext.len() == TOKEN_PLAINTEXT_LEN
}

/// Record field errors for a token plaintext under the `token` key
pub fn validate_token_plaintext(v: &mut Validator, plaintext: &str) {
    v.check(!plaintext.is_empty(), "token", "must be provided");
    v.check(has_token_shape(plaintext), "token", "must be 26 bytes long");
}

#[derive(Clone)]
pub struct TokenService {
    store: Arc<dyn TokenStore>,
}

impl TokenService {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    /// Mint and persist a token; the plaintext is only available on the result.
    pub async fn issue(
        &self,
        principal_id: Uuid,
        ttl: Duration,
        scope: TokenScope,
    ) -> Result<Token, AuthError> {
        let token = Token::generate(principal_id, ttl, scope)?;
        self.store.insert_token(&token).await?;

        tracing::debug!(user_id = %principal_id, scope = %scope, expiry = %token.expiry, "Token issued");
        Ok(token)
    }

    /// Resolve a plaintext to the identity owning it.
    ///
    /// Malformed plaintexts are rejected before any hashing or lookup.
    pub async fn resolve(
        &self,
        scope: TokenScope,
        plaintext: &str,
    ) -> Result<AuthIdentity, AuthError> {
        if !has_token_shape(plaintext) {
            return Err(AuthError::MalformedToken);
        }

        let hash = token_digest(plaintext);
        self.store
            .find_identity_for_token(scope, &hash, Utc::now())
            .await?
            .ok_or(AuthError::TokenNotFound)
    }

    /// Delete every token of `principal_id` in `scope`; idempotent
    pub async fn revoke_all_for_scope(
        &self,
        principal_id: Uuid,
        scope: TokenScope,
    ) -> Result<u64, AuthError> {
        let removed = self.store.delete_tokens_for(principal_id, scope).await?;
        tracing::debug!(user_id = %principal_id, scope = %scope, removed, "Tokens revoked");
        Ok(removed)
    }
}
