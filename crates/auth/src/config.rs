//! Token lifetimes and credential settings

use chrono::Duration;

/// Lifetime of tokens mailed out for account activation
pub const ACTIVATION_TOKEN_TTL_HOURS: i64 = 72;

/// Lifetime of bearer tokens issued at login
pub const AUTHENTICATION_TOKEN_TTL_HOURS: i64 = 24;

/// bcrypt work factor for stored passwords
pub const PASSWORD_HASH_COST: u32 = 12;

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub activation_ttl: Duration,
    pub authentication_ttl: Duration,
    pub password_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            activation_ttl: Duration::hours(ACTIVATION_TOKEN_TTL_HOURS),
            authentication_ttl: Duration::hours(AUTHENTICATION_TOKEN_TTL_HOURS),
            password_cost: PASSWORD_HASH_COST,
        }
    }
}
