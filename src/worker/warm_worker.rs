use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::services::cache::SharedSnapshotCache;

/// Keeps the snapshot cache warm so interactive requests mostly hit the
/// fresh-memory path. Shares the cache's single-flight guard, so it can
/// never race a request-triggered refresh. Failures never stop the loop.
pub async fn run(cache: SharedSnapshotCache, interval: Duration) {
    info!(
        interval_secs = interval.as_secs(),
        "Starting warm worker"
    );

    let mut iteration = 0u64;
    loop {
        iteration += 1;

        match cache.refresh_if_idle().await {
            Ok(true) => info!(iteration, "Warm worker: refresh completed"),
            Ok(false) => info!(iteration, "Warm worker: refresh already in flight, skipped"),
            Err(e) => warn!(iteration, error = %e, "Warm worker: refresh failed"),
        }

        sleep(interval).await;
    }
}
