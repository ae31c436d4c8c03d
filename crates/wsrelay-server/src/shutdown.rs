//! Shutdown signalling and task draining.
//!
//! Every long-lived task the server owns (listener, expiry sweeper, consumer
//! sessions) is registered with one [`TaskTracker`] and watches one
//! [`CancellationToken`]. Draining fires the token, then waits up to the
//! grace period for the tracked tasks to finish.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

/// Owns the shutdown signal and the set of tasks that must finish before exit.
pub struct ShutdownCoordinator {
    signal: CancellationToken,
    tasks: TaskTracker,
    grace: Duration,
}

impl ShutdownCoordinator {
    /// Coordinator that waits at most `grace` when draining.
    pub fn new(grace: Duration) -> Self {
        Self {
            signal: CancellationToken::new(),
            tasks: TaskTracker::new(),
            grace,
        }
    }

    /// Token that fires when shutdown starts.
    pub fn signal(&self) -> CancellationToken {
        self.signal.clone()
    }

    /// Tracker for tasks spawned outside the coordinator, such as upgraded sockets.
    pub fn tracker(&self) -> TaskTracker {
        self.tasks.clone()
    }

    /// Spawn `task` and track it until it completes.
    pub fn spawn<F>(&self, task: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.spawn(task)
    }

    /// Fire the shutdown signal. Idempotent.
    pub fn trigger(&self) {
        self.signal.cancel();
    }

    /// Whether shutdown has started.
    pub fn is_triggered(&self) -> bool {
        self.signal.is_cancelled()
    }

    /// Number of tracked tasks still running.
    pub fn running(&self) -> usize {
        self.tasks.len()
    }

    /// Fire the signal and wait for tracked tasks, up to the grace period.
    ///
    /// Returns `false` if tasks were still running when the grace period ran out.
    pub async fn drain(&self) -> bool {
        self.trigger();
        let _ = self.tasks.close();
        info!(
            running = self.tasks.len(),
            grace_secs = self.grace.as_secs(),
            "draining tasks"
        );

        if tokio::time::timeout(self.grace, self.tasks.wait())
            .await
            .is_err()
        {
            warn!(
                running = self.tasks.len(),
                "grace period elapsed with tasks still running"
            );
            return false;
        }
        info!("all tasks finished");
        true
    }
}
