//! bcrypt password hashing
//!
//! Hashing and verification are CPU-bound and run on the blocking pool.

use greenlight_common::{Error, Validator};

/// Shortest accepted plaintext
pub const MIN_PASSWORD_BYTES: usize = 8;

/// bcrypt ignores input past 72 bytes
pub const MAX_PASSWORD_BYTES: usize = 72;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hashing(#[from] bcrypt::BcryptError),

    #[error("password worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl From<PasswordError> for Error {
    fn from(err: PasswordError) -> Self {
        tracing::error!(error = %err, "Password operation failed");
        Error::Internal(err.to_string())
    }
}

/// Record every rule `password` breaks
pub fn validate_password_plaintext(v: &mut Validator, password: &str) {
    v.check(!password.is_empty(), "password", "must be provided");
    v.check(
        password.len() >= MIN_PASSWORD_BYTES,
        "password",
        "must be at least 8 bytes long",
    );
    v.check(
        password.len() <= MAX_PASSWORD_BYTES,
        "password",
        "must not be more than 72 bytes long",
    );
}

/// Salted bcrypt hash of `plaintext`
pub async fn hash_password(plaintext: &str, cost: u32) -> Result<String, PasswordError> {
    let plaintext = plaintext.to_string();
    let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(plaintext, cost)).await??;
    Ok(hashed)
}

/// Whether `plaintext` matches `hash`
pub async fn verify_password(plaintext: &str, hash: &str) -> Result<bool, PasswordError> {
    let plaintext = plaintext.to_string();
    let hash = hash.to_string();
    let matches = tokio::task::spawn_blocking(move || bcrypt::verify(plaintext, &hash)).await??;
    Ok(matches)
}
