//! Attempt-bounded retry with linear backoff.
//!
//! Every acquisition call site goes through [`with_retry`]. The attempt
//! budget is supplied by the caller so scheduled runs and demand-triggered
//! runs can differ.

use std::future::Future;
use std::time::Duration;

use crate::error::ScraperError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first. Values below 1 are treated as 1.
    pub max_attempts: u32,
    /// Sleep after attempt `n` (1-based) is `n * backoff_unit`.
    pub backoff_unit: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_attempts: u32, backoff_unit: Duration) -> Self {
        Self {
            max_attempts,
            backoff_unit,
        }
    }

    /// A policy that never sleeps, for tests and dry runs.
    #[must_use]
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO)
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff_unit.saturating_mul(attempt)
    }
}

/// Runs `operation` until it succeeds or the attempt budget is spent.
///
/// Returns the first success, or the error from the final attempt. Errors
/// for which [`ScraperError::is_retriable`] is false end the loop early.
/// There is no sleep after the last attempt.
///
/// # Errors
///
/// Returns the last error produced by `operation`.
pub async fn with_retry<T, F, Fut>(
    policy: RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let max_attempts = policy.attempts();
    let mut attempt = 1u32;

    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let class = err.class_name();
                if !err.is_retriable() || attempt >= max_attempts {
                    tracing::warn!(
                        operation = operation_name,
                        attempt,
                        max_attempts,
                        class,
                        error = %err,
                        "giving up"
                    );
                    return Err(err);
                }

                let delay = policy.delay_after(attempt);
                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    max_attempts,
                    class,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "attempt failed, retrying"
                );
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        }
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchErrorKind;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn network_error() -> ScraperError {
        ScraperError::fetch(FetchErrorKind::Network, "http://test", "connection refused")
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = with_retry(RetryPolicy::immediate(3), "test", |_| {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, ScraperError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn always_failing_operation_runs_exactly_max_attempts() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = with_retry(RetryPolicy::immediate(4), "test", |attempt| {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(ScraperError::fetch(
                    FetchErrorKind::Network,
                    "http://test",
                    format!("attempt {attempt}"),
                ))
            }
        })
        .await;

        assert_eq!(call_count.load(Ordering::SeqCst), 4);
        let err = result.unwrap_err();
        assert!(
            err.to_string().contains("attempt 4"),
            "expected the last error to be returned, got: {err}"
        );
    }

    #[tokio::test]
    async fn zero_budget_still_attempts_once() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let _ = with_retry(RetryPolicy::immediate(0), "test", |_| {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(network_error())
            }
        })
        .await;
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn recovers_after_transient_failures() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = with_retry(RetryPolicy::immediate(5), "test", |attempt| {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                if attempt < 3 {
                    Err(network_error())
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 3);
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn anti_bot_challenge_stops_immediately() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = with_retry(RetryPolicy::immediate(5), "test", |_| {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(ScraperError::fetch(
                    FetchErrorKind::AntiBotChallenge,
                    "http://test",
                    "Attention Required!",
                ))
            }
        })
        .await;
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
        assert_eq!(result.unwrap_err().kind(), Some(FetchErrorKind::AntiBotChallenge));
    }

    #[tokio::test]
    async fn backoff_is_linear_and_skips_final_sleep() {
        let policy = RetryPolicy::new(3, Duration::from_millis(20));
        let started = std::time::Instant::now();
        let _ = with_retry(policy, "test", |_| async { Err::<(), _>(network_error()) }).await;
        // 20ms after attempt 1, 40ms after attempt 2, nothing after attempt 3.
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(60), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_millis(1000), "elapsed {elapsed:?}");
    }

    #[test]
    fn delay_after_scales_with_attempt() {
        let policy = RetryPolicy::new(10, Duration::from_secs(2));
        assert_eq!(policy.delay_after(1), Duration::from_secs(2));
        assert_eq!(policy.delay_after(4), Duration::from_secs(8));
    }
}
