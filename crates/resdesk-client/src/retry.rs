//! Bounded retry with capped exponential back-off.
//!
//! [`retry_with_backoff`] wraps any fallible async operation. Attempts run
//! strictly one after another; the only suspension points are the operation
//! itself and the sleep between attempts.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// How many times to try and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first. Treated as 1 when 0.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1_000),
            max_delay: Duration::from_millis(5_000),
        }
    }
}

impl RetryPolicy {
    /// Wait after failed attempt `attempt` (1-indexed): `base * 2^(attempt-1)`,
    /// capped at `max_delay`.
    ///
    /// | Attempt | Delay with defaults |
    /// |---------|---------------------|
    /// | 1       | 1 000 ms            |
    /// | 2       | 2 000 ms            |
    /// | 3       | 4 000 ms            |
    /// | 4+      | 5 000 ms            |
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }
}

/// Runs `operation` until it succeeds, fails with an error `is_retriable`
/// rejects, or `policy.max_attempts` attempts have failed.
///
/// Returns the last error seen. No sleep follows the final attempt.
pub async fn retry_with_backoff<T, E, F, Fut, R>(
    policy: &RetryPolicy,
    is_retriable: R,
    mut operation: F,
) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) {
                    tracing::warn!(attempt, error = %err, "non-retriable error, giving up");
                    return Err(err);
                }
                if attempt >= max_attempts {
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        error = %err,
                        "retries exhausted"
                    );
                    return Err(err);
                }
                let delay = policy.delay_for(attempt);
                #[allow(clippy::cast_possible_truncation)]
                let delay_ms = delay.as_millis() as u64;
                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay_ms,
                    error = %err,
                    "attempt failed, retrying after back-off"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Transient(u32),
        Fatal,
    }

    impl Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                TestError::Transient(n) => write!(f, "transient #{n}"),
                TestError::Fatal => write!(f, "fatal"),
            }
        }
    }

    fn always(_: &TestError) -> bool {
        true
    }

    fn only_transient(err: &TestError) -> bool {
        matches!(err, TestError::Transient(_))
    }

    #[test]
    fn delay_doubles_then_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_millis(1_000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(2_000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(4_000));
        assert_eq!(policy.delay_for(4), Duration::from_millis(5_000));
        assert_eq!(policy.delay_for(40), Duration::from_millis(5_000));
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_immediately_on_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let start = Instant::now();
        let result = retry_with_backoff(&RetryPolicy::default(), always, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, TestError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn fails_twice_then_succeeds_after_one_and_two_seconds() {
        let attempt_times = Arc::new(Mutex::new(Vec::new()));
        let times = Arc::clone(&attempt_times);
        let start = Instant::now();
        let result = retry_with_backoff(&RetryPolicy::default(), always, || {
            let times = Arc::clone(&times);
            async move {
                let mut times = times.lock().unwrap();
                times.push(start.elapsed());
                let n = u32::try_from(times.len()).unwrap();
                if n < 3 {
                    Err(TestError::Transient(n))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        let times = attempt_times.lock().unwrap();
        assert_eq!(
            *times,
            vec![
                Duration::ZERO,
                Duration::from_millis(1_000),
                Duration::from_millis(3_000),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_attempts_and_returns_last_error_without_trailing_sleep() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let start = Instant::now();
        let result = retry_with_backoff(&RetryPolicy::default(), always, || {
            let c = Arc::clone(&c);
            async move {
                let n = c.fetch_add(1, Ordering::SeqCst) + 1;
                Err::<u32, _>(TestError::Transient(n))
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(result.unwrap_err(), TestError::Transient(3));
        // 1 s + 2 s of back-off; nothing after the third failure.
        assert_eq!(start.elapsed(), Duration::from_millis(3_000));
    }

    #[tokio::test(start_paused = true)]
    async fn does_not_retry_non_retriable_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(&RetryPolicy::default(), only_transient, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(TestError::Fatal)
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.unwrap_err(), TestError::Fatal);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_max_attempts_still_tries_once() {
        let policy = RetryPolicy {
            max_attempts: 0,
            ..RetryPolicy::default()
        };
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(&policy, always, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(TestError::Transient(1))
            }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
