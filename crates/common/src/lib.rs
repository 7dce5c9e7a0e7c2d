//! Shared utilities, configuration, and error handling for Greenlight
//!
//! This crate provides common functionality used across the Greenlight service:
//! - Configuration management following 12-factor principles
//! - Error taxonomy and the JSON error envelope
//! - Optimistic concurrency primitives for versioned entities
//! - Validation, list filters, and background task tracking

pub mod background;
pub mod concurrency;
pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod extractors;
pub mod filters;
pub mod validation;

pub use background::BackgroundTasks;
pub use concurrency::{GuardedWrite, Versioned, VersionedTable, WriteOutcome, INITIAL_VERSION};
pub use crypto::{constant_time_eq, token_digest};
pub use db::{DatabaseConfig, RepositoryError};
pub use error::{Error, Result};
pub use extractors::{ExpectedVersion, JsonBody, ResourceId, UuidParam, ValidatedJson};
pub use filters::{read_csv, read_int, FilterParams, Filters, Metadata, SortDirection};
pub use validation::Validator;
