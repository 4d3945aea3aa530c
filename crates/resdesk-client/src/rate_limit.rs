//! Minimum-interval gate in front of the message-generation relay.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::error::RelayError;

/// Default spacing between accepted relay calls.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(3_000);

/// Admits at most one relay call per `min_interval`.
///
/// Share one instance (behind an `Arc`) between every caller that should be
/// serialized against the same gate. The check and the timestamp update
/// happen under one lock that is never held across an `.await`, so an
/// accepted call claims its slot before any downstream request starts.
#[derive(Debug)]
pub struct MessageRateLimiter {
    min_interval: Duration,
    last_accepted: Mutex<Option<Instant>>,
}

impl Default for MessageRateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL)
    }
}

impl MessageRateLimiter {
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_accepted: Mutex::new(None),
        }
    }

    /// Claims a slot at the current (tokio) time.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::RateLimited`] when the previous accepted call was
    /// less than `min_interval` ago.
    pub fn try_acquire(&self) -> Result<(), RelayError> {
        self.try_acquire_at(Instant::now())
    }

    /// Claims a slot at `now`.
    ///
    /// `retry_after_secs` is the remaining wait rounded up to whole seconds.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::RateLimited`] when `now` is less than
    /// `min_interval` after the previous accepted call.
    pub fn try_acquire_at(&self, now: Instant) -> Result<(), RelayError> {
        let mut last = self
            .last_accepted
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(previous) = *last {
            let elapsed = now.saturating_duration_since(previous);
            if elapsed < self.min_interval {
                let remaining = self.min_interval - elapsed;
                let retry_after_secs = remaining.as_millis().div_ceil(1_000);
                tracing::debug!(retry_after_secs, "relay call rejected by rate limiter");
                return Err(RelayError::RateLimited {
                    retry_after_secs: u64::try_from(retry_after_secs).unwrap_or(u64::MAX),
                });
            }
        }

        *last = Some(now);
        Ok(())
    }
}
