//! Process-wide request counters exposed on `GET /debug/vars`
//!
//! The tracking middleware is the outermost layer, so the counters include
//! rate-limited requests and recovered panics.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use parking_lot::Mutex;
use serde_json::{json, Value};

#[derive(Debug, Default)]
pub struct Metrics {
    requests_received: AtomicU64,
    responses_sent: AtomicU64,
    processing_time_us: AtomicU64,
    responses_by_status: Mutex<BTreeMap<u16, u64>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests_received(&self) -> u64 {
        self.requests_received.load(Ordering::Relaxed)
    }

    pub fn responses_sent(&self) -> u64 {
        self.responses_sent.load(Ordering::Relaxed)
    }

    pub fn responses_with_status(&self, status: u16) -> u64 {
        self.responses_by_status
            .lock()
            .get(&status)
            .copied()
            .unwrap_or(0)
    }

    fn record(&self, status: u16, started: Instant) {
        let elapsed = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        self.responses_sent.fetch_add(1, Ordering::Relaxed);
        self.processing_time_us.fetch_add(elapsed, Ordering::Relaxed);
        *self.responses_by_status.lock().entry(status).or_insert(0) += 1;
    }

    /// Counter snapshot; the gauges are sampled by the caller
    pub fn snapshot(&self, in_flight_background_tasks: usize, rate_limiter_clients: usize) -> Value {
        let by_status: BTreeMap<String, u64> = self
            .responses_by_status
            .lock()
            .iter()
            .map(|(status, count)| (status.to_string(), *count))
            .collect();

        json!({
            "total_requests_received": self.requests_received(),
            "total_responses_sent": self.responses_sent(),
            "total_processing_time_μs": self.processing_time_us.load(Ordering::Relaxed),
            "total_responses_sent_by_status": by_status,
            "in_flight_background_tasks": in_flight_background_tasks,
            "rate_limiter_clients": rate_limiter_clients,
        })
    }
}

pub async fn track(State(metrics): State<Arc<Metrics>>, request: Request, next: Next) -> Response {
    let started = Instant::now();
    metrics.requests_received.fetch_add(1, Ordering::Relaxed);

    let response = next.run(request).await;
    metrics.record(response.status().as_u16(), started);
    response
}
