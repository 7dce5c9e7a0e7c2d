//! Per-client rate limiting for Greenlight
//!
//! ## Components
//!
//! - [`TokenBucket`]: continuous-refill bucket holding up to `burst` tokens
//! - [`RateLimiter`]: sharded registry of client buckets with idle eviction
//! - [`rate_limit`]: axum middleware answering 429 when a bucket is empty
//!
//! State is process-local; nothing is shared between instances.

mod bucket;
mod config;
mod limiter;
mod middleware;

pub use bucket::TokenBucket;
pub use config::{LimiterConfig, DEFAULT_IDLE_TIMEOUT, DEFAULT_SWEEP_INTERVAL};
pub use limiter::{Admission, RateLimiter};
pub use middleware::rate_limit;
