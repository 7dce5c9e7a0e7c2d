//! Configuration management following 12-factor app principles
//!
//! All configuration is loaded from environment variables to ensure
//! clean separation between code and config.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Result};

use crate::db::DatabaseConfig;

/// Deployment environment, reported by the healthcheck
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "development" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            other => Err(anyhow!(
                "APP_ENV must be development, staging or production, got {other:?}"
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub environment: Environment,
    pub database: DatabaseConfig,

    /// Rate limiter refill rate in tokens per second
    pub limiter_rps: f64,
    /// Rate limiter bucket capacity
    pub limiter_burst: u32,
    pub limiter_enabled: bool,

    /// Exact origins allowed by CORS
    pub cors_trusted_origins: Vec<String>,

    pub request_timeout: Duration,
    /// Drain window for in-flight requests and background tasks
    pub shutdown_grace: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database = DatabaseConfig {
            url: lookup("DATABASE_URL").ok_or_else(|| anyhow!("DATABASE_URL is required"))?,
            max_connections: parse_or(&lookup, "DB_MAX_OPEN_CONNS", 25)?,
            max_idle_time: Duration::from_secs(parse_or(&lookup, "DB_MAX_IDLE_TIME_SECS", 900)?),
            acquire_timeout: Duration::from_secs(parse_or(&lookup, "DB_ACQUIRE_TIMEOUT_SECS", 5)?),
        };

        let limiter_rps: f64 = parse_or(&lookup, "LIMITER_RPS", 2.0)?;
        if !(limiter_rps > 0.0 && limiter_rps.is_finite()) {
            return Err(anyhow!("LIMITER_RPS must be a positive number"));
        }

        let limiter_burst: u32 = parse_or(&lookup, "LIMITER_BURST", 4)?;
        if limiter_burst == 0 {
            return Err(anyhow!("LIMITER_BURST must be at least 1"));
        }

        let cors_trusted_origins = lookup("CORS_TRUSTED_ORIGINS")
            .map(|raw| {
                raw.split(|c: char| c.is_whitespace() || c == ',')
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            port: parse_or(&lookup, "PORT", 4000)?,
            environment: parse_or(&lookup, "APP_ENV", Environment::Development)?,
            database,
            limiter_rps,
            limiter_burst,
            limiter_enabled: parse_or(&lookup, "LIMITER_ENABLED", true)?,
            cors_trusted_origins,
            request_timeout: Duration::from_secs(parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 30)?),
            shutdown_grace: Duration::from_secs(parse_or(&lookup, "SHUTDOWN_GRACE_SECS", 5)?),
        })
    }
}

/// Parse `key` when present; an unparseable value is an error rather than a silent default.
fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{key} has invalid value {raw:?}: {e}")),
        None => Ok(default),
    }
}
