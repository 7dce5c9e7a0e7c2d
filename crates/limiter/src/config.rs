//! Rate limiter configuration

use std::time::Duration;

/// Default idle window after which a client's state is evicted
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(3 * 60);

/// Default interval between eviction sweeps
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

const DEFAULT_SHARDS: usize = 16;

#[derive(Debug, Clone)]
pub struct LimiterConfig {
    /// Refill rate in tokens per second
    pub rps: f64,
    /// Bucket capacity; a new client starts with this many tokens
    pub burst: u32,
    /// When false every request is admitted; eviction keeps running
    pub enabled: bool,
    pub idle_timeout: Duration,
    pub sweep_interval: Duration,
    /// Number of independently locked registry shards
    pub shards: usize,
}

impl LimiterConfig {
    pub fn new(rps: f64, burst: u32, enabled: bool) -> Self {
        Self {
            rps,
            burst,
            enabled,
            ..Self::default()
        }
    }

    /// Replace values the bucket arithmetic cannot work with by the defaults
    pub(crate) fn normalized(mut self) -> Self {
        let defaults = Self::default();
        if !(self.rps > 0.0 && self.rps.is_finite()) {
            tracing::warn!(rps = self.rps, fallback = defaults.rps, "Invalid limiter refill rate");
            self.rps = defaults.rps;
        }
        if self.burst == 0 {
            tracing::warn!(fallback = defaults.burst, "Limiter burst must be at least 1");
            self.burst = defaults.burst;
        }
        if self.sweep_interval.is_zero() {
            self.sweep_interval = defaults.sweep_interval;
        }
        self.shards = self.shards.max(1);
        self
    }
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            rps: 2.0,
            burst: 4,
            enabled: true,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            shards: DEFAULT_SHARDS,
        }
    }
}
