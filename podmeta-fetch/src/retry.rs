//! Retry with exponential backoff and jitter.
//!
//! [`RetryStrategy::execute`] wraps a single-attempt operation. Retryable
//! failures ([`ErrorKind::is_retryable`](crate::ErrorKind::is_retryable)) are
//! retried up to `max_retries` times; everything else propagates at once.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::FetchError;

/// Strategy for retrying failed requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryStrategy {
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry, doubled for each later one.
    pub base_delay: Duration,
    /// Upper bound of the random jitter added to each delay.
    pub max_jitter: Duration,
    /// Cap applied to any single delay.
    pub max_delay: Duration,
}

impl RetryStrategy {
    /// Creates a new retry strategy.
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_secs(2),
            max_jitter: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }

    /// Disables retries.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Sets the base delay.
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Sets the jitter bound.
    pub fn with_max_jitter(mut self, jitter: Duration) -> Self {
        self.max_jitter = jitter;
        self
    }

    /// Returns `base_delay * 2^attempt` without jitter.
    pub fn base_backoff(&self, attempt: u32) -> Duration {
        let base_ms = u64::try_from(self.base_delay.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(base_ms.saturating_mul(2u64.saturating_pow(attempt)))
    }

    /// Calculates the delay before retry number `attempt` (0-indexed).
    ///
    /// The jitter is drawn from `[0, min(max_jitter, base_backoff(attempt)))`,
    /// so every delay is below the next attempt's lower bound and the
    /// sequence never decreases.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let backoff = self.base_backoff(attempt);
        let jitter_bound = u64::try_from(self.max_jitter.min(backoff).as_millis()).unwrap_or(0);
        let jitter = if jitter_bound == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..jitter_bound)
        };
        (backoff + Duration::from_millis(jitter)).min(self.max_delay)
    }

    /// Delay before retrying after `error`, honouring a longer `Retry-After`.
    pub fn delay_for_error(&self, attempt: u32, error: &FetchError) -> Duration {
        let computed = self.delay_for_attempt(attempt);
        match error.retry_after() {
            Some(secs) => computed.max(Duration::from_secs(secs).min(self.max_delay)),
            None => computed,
        }
    }

    /// Runs `op` until it succeeds, fails terminally, or retries run out.
    ///
    /// `op` receives the 0-indexed attempt number. Cancellation is checked
    /// before each attempt and raced against each attempt and each sleep.
    /// A delay is never shorter than the one before it, even after a long
    /// `Retry-After`.
    pub async fn execute<T, F, Fut>(&self, cancel: &CancellationToken, mut op: F) -> RetryOutcome<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let mut delays = Vec::new();
        let mut floor = Duration::ZERO;
        let mut attempt = 0u32;

        loop {
            if cancel.is_cancelled() {
                return RetryOutcome::finish(Err(FetchError::Cancelled), attempt, delays);
            }

            let result = tokio::select! {
                () = cancel.cancelled() => Err(FetchError::Cancelled),
                result = op(attempt) => result,
            };
            let tries = attempt + 1;

            let error = match result {
                Ok(value) => return RetryOutcome::finish(Ok(value), tries, delays),
                Err(error) => error,
            };

            if !error.is_retryable() {
                debug!(attempt, kind = %error.kind(), "Non-retryable failure");
                return RetryOutcome::finish(Err(error), tries, delays);
            }
            if attempt >= self.max_retries {
                warn!(attempts = tries, error = %error, "Retries exhausted");
                return RetryOutcome::finish(Err(error), tries, delays);
            }

            let delay = self.delay_for_error(attempt, &error).max(floor);
            floor = delay;
            warn!(
                attempt = tries,
                max_attempts = self.max_retries + 1,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %error,
                "Retryable failure, backing off"
            );
            delays.push(delay);

            tokio::select! {
                () = cancel.cancelled() => {
                    return RetryOutcome::finish(Err(FetchError::Cancelled), tries, delays);
                }
                () = tokio::time::sleep(delay) => {}
            }
            attempt += 1;
        }
    }
}

impl Default for RetryStrategy {
    fn default() -> Self {
        Self::new(3)
    }
}

// ============================================================================
// Retry Outcome
// ============================================================================

/// Result of a retried operation.
#[derive(Debug)]
pub struct RetryOutcome<T> {
    /// Final result.
    pub result: Result<T, FetchError>,
    /// Number of attempts made.
    pub tries: u32,
    /// Backoff delays slept between attempts.
    pub delays: Vec<Duration>,
}

impl<T> RetryOutcome<T> {
    fn finish(result: Result<T, FetchError>, tries: u32, delays: Vec<Duration>) -> Self {
        Self {
            result,
            tries,
            delays,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
