use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::core::services::key_vault::KeyVault;

/// Default sweep period.
pub const DEFAULT_REAP_INTERVAL: Duration = Duration::from_secs(1);

/// Periodic eviction of expired keys.
///
/// Each tick is a synchronous sweep, so cancelling the task can only happen
/// between sweeps, never in the middle of one.
pub struct ExpiryReaper {
    vault: Arc<KeyVault>,
    interval: Duration,
}

/// Running reaper task.
pub struct ReaperHandle {
    task: JoinHandle<()>,
}

impl ExpiryReaper {
    pub fn new(vault: Arc<KeyVault>, interval: Duration) -> Self {
        Self {
            vault,
            interval: interval.max(Duration::from_millis(1)),
        }
    }

    /// One sweep. Returns the number of evicted keys.
    pub fn tick(&self) -> usize {
        let evicted = self.vault.sweep_expired();
        if evicted > 0 {
            debug!(evicted, "reaper evicted expired keys");
        }
        evicted
    }

    /// Start ticking on the current tokio runtime.
    pub fn spawn(self) -> ReaperHandle {
        ReaperHandle {
            task: tokio::spawn(self.run()),
        }
    }

    async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.tick();
        }
    }
}

impl ReaperHandle {
    /// Stop ticking and wait for the task to wind down.
    pub async fn shutdown(self) {
        self.task.abort();
        let _ = self.task.await;
    }
}
