use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

/// Serializes outbound upstream calls and enforces a minimum spacing
/// between consecutive dispatches.
///
/// The mutex is held for the whole dispatch, so tasks run strictly one at a
/// time in submission order (tokio mutexes queue waiters fairly). The
/// spacing clock starts when the previous dispatch finishes, not when it
/// started.
pub struct RequestQueue {
    delay: Duration,
    last_dispatch: Mutex<Option<Instant>>,
}

impl RequestQueue {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_dispatch: Mutex::new(None),
        }
    }

    /// Run `task` once the inter-request delay has elapsed. Failures are the
    /// task's own business and propagate unchanged to the submitter.
    pub async fn run<F, Fut, T>(&self, task: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let mut last = self.last_dispatch.lock().await;
        if let Some(previous) = *last {
            sleep_until(previous + self.delay).await;
        }
        let result = task().await;
        *last = Some(Instant::now());
        result
    }
}
