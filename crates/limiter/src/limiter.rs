//! Per-client rate limiter
//!
//! Client state lives in a registry split into shards, each behind its own
//! lock, keyed by a hash of the client IP. A shard lock is held only to look
//! up or insert one entry (or, during a sweep, to scan that shard); token
//! arithmetic happens under the per-client lock after the shard lock is
//! released. Distinct clients in different shards never contend, and clients
//! sharing a shard contend only for a map lookup.

use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::hash::BuildHasher;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::bucket::TokenBucket;
use crate::config::LimiterConfig;

/// Outcome of one admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    /// Bucket empty; a token accrues after `retry_after`
    Rejected { retry_after: Duration },
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted)
    }
}

#[derive(Debug)]
struct Client {
    bucket: TokenBucket,
    last_seen: Instant,
}

type Shard = Mutex<HashMap<IpAddr, Arc<Mutex<Client>>>>;

pub struct RateLimiter {
    config: LimiterConfig,
    enabled: AtomicBool,
    shards: Box<[Shard]>,
    hasher: RandomState,
}

impl RateLimiter {
    pub fn new(config: LimiterConfig) -> Self {
        let config = config.normalized();
        let shards = (0..config.shards)
            .map(|_| Mutex::new(HashMap::new()))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            enabled: AtomicBool::new(config.enabled),
            config,
            shards,
            hasher: RandomState::new(),
        }
    }

    pub fn config(&self) -> &LimiterConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Toggle the bypass switch; the sweeper is unaffected
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Admit or reject one request from `client`
    pub fn allow(&self, client: IpAddr) -> bool {
        self.check(client).is_admitted()
    }

    /// Admission decision with retry information
    pub fn check(&self, client: IpAddr) -> Admission {
        if !self.is_enabled() {
            return Admission::Admitted;
        }

        let now = Instant::now();
        let entry = {
            let mut shard = self.shard_for(&client).lock();
            Arc::clone(shard.entry(client).or_insert_with(|| {
                Arc::new(Mutex::new(Client {
                    bucket: TokenBucket::new(self.config.burst, self.config.rps, now),
                    last_seen: now,
                }))
            }))
        };

        let mut state = entry.lock();
        state.last_seen = now;
        if state.bucket.try_acquire(now) {
            Admission::Admitted
        } else {
            Admission::Rejected {
                retry_after: state.bucket.time_to_next_token(now),
            }
        }
    }

    /// Evict clients idle for longer than the configured window.
    ///
    /// Returns how many entries were removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let idle_timeout = self.config.idle_timeout;

        self.shards
            .iter()
            .map(|shard| {
                let mut shard = shard.lock();
                let before = shard.len();
                shard.retain(|_, client| {
                    now.saturating_duration_since(client.lock().last_seen) <= idle_timeout
                });
                before - shard.len()
            })
            .sum()
    }

    /// Number of clients currently tracked
    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.lock().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, client: &IpAddr) -> bool {
        self.shard_for(client).lock().contains_key(client)
    }

    /// Run [`sweep`](Self::sweep) every `sweep_interval` until `shutdown` fires.
    pub fn spawn_sweeper(self: &Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(limiter.config.sweep_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        tracing::debug!("Rate limiter sweeper stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let evicted = limiter.sweep();
                        if evicted > 0 {
                            tracing::debug!(evicted, remaining = limiter.len(), "Evicted idle rate limiter clients");
                        }
                    }
                }
            }
        })
    }

    fn shard_for(&self, client: &IpAddr) -> &Shard {
        let index = (self.hasher.hash_one(client) as usize) % self.shards.len();
        &self.shards[index]
    }
}
