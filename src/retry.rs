//! Retry with Exponential Backoff
//!
//! Generic re-invocation wrapper: on failure, sleep
//! `initial_delay * backoff_factor^attempt` (plus optional random jitter) and
//! try again until the budget is exhausted, then return the last error
//! unmodified.
//!
//! KNOWN LIMITATION, preserved deliberately: every failure is treated as
//! retryable. There is no error-kind filtering, so permanently-fatal failures
//! (bad credentials, malformed requests) burn the full retry budget too.
//! Callers that must avoid that pre-classify with
//! [`GatewayError::is_retryable`](crate::GatewayError::is_retryable) before
//! wrapping. There is also no cancellation and no overall wall-clock deadline
//! beyond `max_retries * maximum backoff`.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::constants::retry;

/// Backoff policy for [`with_retry`]
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts = `max_retries + 1`
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Geometric growth factor applied per attempt
    pub backoff_factor: f64,
    /// Add random jitter (up to a quarter of the computed delay)
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: retry::DEFAULT_MAX_RETRIES,
            initial_delay: Duration::from_millis(retry::INITIAL_DELAY_MS),
            backoff_factor: retry::BACKOFF_FACTOR,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_delay: Duration, backoff_factor: f64) -> Self {
        Self {
            max_retries,
            initial_delay,
            backoff_factor,
            jitter: false,
        }
    }

    pub fn with_jitter(mut self) -> Self {
        self.jitter = true;
        self
    }

    /// Delay before retrying after the given zero-based failed attempt
    fn delay_for(&self, attempt: u32) -> Duration {
        let scaled = self.initial_delay.as_secs_f64() * self.backoff_factor.powi(attempt as i32);
        let mut delay = Duration::from_secs_f64(scaled);
        if self.jitter {
            delay += random_jitter(delay);
        }
        delay
    }
}

/// Invoke `operation` until it succeeds or the retry budget is exhausted.
///
/// Attempts are strictly sequential; attempt N+1 is never issued before
/// attempt N has settled. On exhaustion the last error is returned unwrapped
/// so callers can still match on it.
pub async fn with_retry<T, E, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt: u32 = 0;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= policy.max_retries {
                    warn!(attempts = attempt + 1, error = %err, "retry budget exhausted");
                    return Err(err);
                }

                let delay = policy.delay_for(attempt);
                debug!(
                    attempt = attempt + 1,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "retrying after backoff"
                );
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Random jitter up to a quarter of the base delay, thread-local RNG
fn random_jitter(base_delay: Duration) -> Duration {
    let max_jitter_ms = (base_delay.as_millis() as u64) / 4;
    if max_jitter_ms == 0 {
        return Duration::ZERO;
    }
    let jitter_ms = rand::rng().random_range(0..max_jitter_ms);
    Duration::from_millis(jitter_ms)
}

// =============================================================================
// Tests
// =============================================================================
