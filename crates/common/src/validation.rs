//! Field-level validation collector
//!
//! Checks record the first failure message per field; the collected map is
//! reported as a single 422 response.

use std::collections::{BTreeMap, HashSet};
use std::hash::Hash;

use regex::Regex;

use crate::error::Error;

lazy_static::lazy_static! {
    /// Email address shape accepted at registration
    pub static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    )
    .unwrap();
}

/// Collects field → message violations
#[derive(Debug, Default, Clone)]
pub struct Validator {
    errors: BTreeMap<String, String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Record `message` for `key` unless the key already has one
    pub fn add_error(&mut self, key: &str, message: &str) {
        self.errors
            .entry(key.to_string())
            .or_insert_with(|| message.to_string());
    }

    /// Record `message` for `key` when `ok` is false
    pub fn check(&mut self, ok: bool, key: &str, message: &str) {
        if !ok {
            self.add_error(key, message);
        }
    }

    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    /// `Ok(())` when nothing was recorded, otherwise a 422 error carrying the map
    pub fn into_result(self) -> Result<(), Error> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(Error::FailedValidation(self.errors))
        }
    }
}

impl From<validator::ValidationErrors> for Validator {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut v = Validator::new();
        for (field, failures) in errors.field_errors() {
            if let Some(first) = failures.first() {
                let message = first
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| first.code.to_string());
                v.add_error(field.as_ref(), &message);
            }
        }
        v
    }
}

pub fn matches_email(value: &str) -> bool {
    EMAIL_REGEX.is_match(value)
}

/// True when `value` is one of `permitted`
pub fn permitted_value<T: PartialEq>(value: &T, permitted: &[T]) -> bool {
    permitted.contains(value)
}

/// True when every element of `values` is distinct
pub fn unique<T: Eq + Hash>(values: &[T]) -> bool {
    let mut seen = HashSet::with_capacity(values.len());
    values.iter().all(|v| seen.insert(v))
}
