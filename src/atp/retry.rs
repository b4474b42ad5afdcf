// src/atp/retry.rs
use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::utils::error::FetchError;

/// Bounded retry with linear backoff plus random jitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            jitter: Duration::from_secs(3),
        }
    }
}

/// Random extra wait in `0..=max`.
pub fn jitter(max: Duration) -> Duration {
    let max_ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
    if max_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::rng().random_range(0..=max_ms))
}

impl RetryPolicy {
    /// No retries at all; one attempt.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            jitter: Duration::ZERO,
        }
    }

    /// Wait before retry number `attempt` (1-based count of failures so far).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt) + jitter(self.jitter)
    }

    /// Runs `op` until it succeeds, fails with a non-retryable error, or the
    /// attempt budget is spent. `op` receives the 1-based attempt number.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T, FetchError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let delay = self.delay_for(attempt);
                    tracing::warn!(
                        "Attempt {}/{} for {} failed: {}. Retrying in {:?}",
                        attempt,
                        max_attempts,
                        what,
                        e,
                        delay
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!("Giving up on {} after {} attempt(s): {}", what, attempt, e);
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn instant(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::ZERO,
            jitter: Duration::ZERO,
        }
    }

    fn timeout() -> FetchError {
        FetchError::Timeout {
            url: "https://example.org".into(),
            marker: "ul.pd_left".into(),
            timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn retries_until_success() {
        let calls = Cell::new(0);
        let result = tokio_test::block_on(instant(3).run("profile", |attempt| {
            calls.set(calls.get() + 1);
            async move {
                if attempt < 3 {
                    Err(timeout())
                } else {
                    Ok(attempt)
                }
            }
        }));
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn stops_after_budget() {
        let calls = Cell::new(0);
        let result: Result<(), _> = tokio_test::block_on(instant(2).run("profile", |_| {
            calls.set(calls.get() + 1);
            async { Err(timeout()) }
        }));
        assert!(matches!(result, Err(FetchError::Timeout { .. })));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn non_retryable_errors_fail_fast() {
        let calls = Cell::new(0);
        let result: Result<(), _> = tokio_test::block_on(instant(5).run("profile", |_| {
            calls.set(calls.get() + 1);
            async { Err(FetchError::NotFound("https://example.org/missing".into())) }
        }));
        assert!(matches!(result, Err(FetchError::NotFound(_))));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn delay_grows_linearly_within_jitter() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            jitter: Duration::from_millis(50),
        };
        let second = policy.delay_for(2);
        assert!(second >= Duration::from_millis(200));
        assert!(second <= Duration::from_millis(250));
        assert_eq!(jitter(Duration::ZERO), Duration::ZERO);
    }
}
