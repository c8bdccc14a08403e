use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use super::finnhub::FinnhubError;

/// Bounded exponential backoff for rate-limited upstream calls.
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl BackoffPolicy {
    /// Delay before retry `n` (1-based): `initial * 2^(n-1)`, capped.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.initial_backoff
            .checked_mul(factor)
            .map_or(self.max_backoff, |d| d.min(self.max_backoff))
    }
}

/// Runs `op`, retrying only rate-limit rejections, up to the policy bound.
///
/// Any other failure resolves to `None` immediately, as does retry
/// exhaustion. An absent result tells the caller to skip this symbol; a
/// single symbol must never abort the refresh cycle.
pub async fn retry_rate_limited<F, Fut, T>(
    policy: &BackoffPolicy,
    call: &str,
    mut op: F,
) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FinnhubError>>,
{
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Some(value),
            Err(FinnhubError::RateLimit) => {
                if attempt > policy.max_retries {
                    warn!(call, attempts = attempt, "Rate limit retries exhausted");
                    return None;
                }
                let delay = policy.delay_for(attempt);
                debug!(
                    call,
                    attempt,
                    delay_secs = delay.as_secs_f64(),
                    "Rate limited, backing off"
                );
                sleep(delay).await;
            }
            Err(e) => {
                warn!(call, error = %e, "Upstream call failed");
                return None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn policy() -> BackoffPolicy {
        BackoffPolicy {
            max_retries: 5,
            initial_backoff: Duration::from_secs(2),
            max_backoff: Duration::from_secs(32),
        }
    }

    #[test]
    fn test_delay_doubles_and_caps() {
        let policy = policy();
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for(3), Duration::from_secs(8));
        assert_eq!(policy.delay_for(4), Duration::from_secs(16));
        assert_eq!(policy.delay_for(5), Duration::from_secs(32));
        assert_eq!(policy.delay_for(6), Duration::from_secs(32));
        assert_eq!(policy.delay_for(40), Duration::from_secs(32));
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_rate_limiting() {
        let attempts = AtomicU32::new(0);
        let started = Instant::now();

        let result = retry_rate_limited(&policy(), "quote", || async {
            let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= 3 {
                Err(FinnhubError::RateLimit)
            } else {
                Ok(n)
            }
        })
        .await;

        assert_eq!(result, Some(4));
        // Waits of 2s, 4s and 8s before the three retries.
        assert_eq!(Instant::now() - started, Duration::from_secs(14));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_resolves_to_absent() {
        let attempts = AtomicU32::new(0);

        let result: Option<u32> = retry_rate_limited(&policy(), "quote", || async {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(FinnhubError::RateLimit)
        })
        .await;

        assert_eq!(result, None);
        // Initial attempt plus max_retries retries.
        assert_eq!(attempts.load(Ordering::SeqCst), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_errors_are_not_retried() {
        let attempts = AtomicU32::new(0);
        let started = Instant::now();

        let result: Option<u32> = retry_rate_limited(&policy(), "profile", || async {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err(FinnhubError::InvalidResponse("HTTP 500".to_string()))
        })
        .await;

        assert_eq!(result, None);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(Instant::now(), started);
    }
}
