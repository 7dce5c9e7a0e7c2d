//! Fire-and-forget background work
//!
//! Tasks spawned here outlive the request that started them. They are tracked
//! so shutdown can wait for them, and a panic inside one is logged instead of
//! tearing anything else down.

use std::future::Future;
use std::time::Duration;

use tokio_util::task::TaskTracker;

#[derive(Debug, Clone, Default)]
pub struct BackgroundTasks {
    tracker: TaskTracker,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` detached from the caller. Failures are logged only.
    pub fn spawn<F>(&self, name: &'static str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let inner = tokio::spawn(task);
        self.tracker.spawn(async move {
            if let Err(e) = inner.await {
                if e.is_panic() {
                    tracing::error!(task = name, error = %e, "Background task panicked");
                } else {
                    tracing::warn!(task = name, error = %e, "Background task cancelled");
                }
            }
        });
    }

    /// Number of tasks still running
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Close the tracker and wait up to `grace` for running tasks.
    ///
    /// Returns `false` when the grace period elapsed first.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        self.tracker.close();
        let pending = self.tracker.len();
        if pending > 0 {
            tracing::info!(pending, "Waiting for background tasks to finish");
        }

        match tokio::time::timeout(grace, self.tracker.wait()).await {
            Ok(()) => true,
            Err(_) => {
                tracing::warn!(
                    remaining = self.tracker.len(),
                    "Background tasks still running after grace period"
                );
                false
            }
        }
    }
}
