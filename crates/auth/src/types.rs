//! Auth read-model types
//!
//! Lightweight views of rows owned by the users domain, carrying only what
//! authentication and authorization need.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use uuid::Uuid;

/// Identity of an authenticated principal
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct AuthIdentity {
    pub id: Uuid,
    pub email: String,
    pub is_active: bool,
    pub version: i32,
}

/// The caller of a request, resolved once by the authentication middleware
/// and handed explicitly to every later stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    /// No credentials presented; holds no permissions
    Anonymous,
    Authenticated(AuthIdentity),
}

impl Principal {
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Principal::Anonymous)
    }

    pub fn identity(&self) -> Option<&AuthIdentity> {
        match self {
            Principal::Anonymous => None,
            Principal::Authenticated(identity) => Some(identity),
        }
    }
}

/// Purpose a token was issued for; a token is only accepted in its own scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenScope {
    Activation,
    Authentication,
}

impl TokenScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenScope::Activation => "activation",
            TokenScope::Authentication => "authentication",
        }
    }
}

impl fmt::Display for TokenScope {
    #[mutants::skip] // Delegates to as_str()
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Effective permission set (deduplicated)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Permissions(BTreeSet<String>);

impl Permissions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn includes(&self, code: &str) -> bool {
        self.0.contains(code)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for Permissions {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}
