//! Periodic removal of expired short links.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::drive::Drive;

/// Running purge loop. Dropping it stops the loop.
#[derive(Debug)]
pub struct PurgeTask(JoinHandle<()>);

impl PurgeTask {
    /// Stop the loop.
    pub fn abort(&self) {
        self.0.abort();
    }

    /// Whether the loop has stopped.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.0.is_finished()
    }
}

impl Drop for PurgeTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

impl Drive {
    /// Purge expired short links every `period`, floored at one second.
    ///
    /// Must be called inside a tokio runtime.
    #[must_use]
    pub fn spawn_purge_loop(&self, period: Duration) -> PurgeTask {
        let drive = self.clone();
        let period = period.max(Duration::from_secs(1));
        PurgeTask(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                match drive.purge_expired_links().await {
                    Ok(removed) => debug!(removed, "link purge pass finished"),
                    Err(e) => warn!(error = %e, "link purge pass failed"),
                }
            }
        }))
    }
}
