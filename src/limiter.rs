//! Sliding-Window Rate Limiter
//!
//! Per-key call counters over a trailing fixed-duration window. Guarantees no
//! more than N permitted calls in any window of length W, at the cost of
//! slightly pessimistic burst tolerance at window boundaries (this is a
//! sliding-window counter, not a token bucket).
//!
//! An explicit, constructible component: callers inject an instance instead of
//! sharing hidden global state, so test suites can run isolated limiters.
//! Counters are process-local and live for the instance lifetime; there is no
//! cross-process coordination.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;

use crate::constants::rate_limit;

/// Per-key sliding-window rate limiter
pub struct RateLimiter {
    max_calls: usize,
    window: Duration,
    /// Call timestamps per vendor key; the entry guard makes the per-key
    /// prune-and-append atomic with respect to concurrent callers
    windows: DashMap<String, Vec<Instant>>,
}

impl RateLimiter {
    pub fn new(max_calls: usize, window: Duration) -> Self {
        Self {
            max_calls,
            window,
            windows: DashMap::new(),
        }
    }

    /// Whether a new call is permitted for `key` right now.
    ///
    /// Prunes timestamps older than `now - window`, refuses without recording
    /// anything when the remaining count has reached the maximum, and
    /// otherwise records `now` and permits. Denial is purely local; nothing is
    /// queued and the caller decides whether to poll or skip.
    pub fn can_proceed(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut timestamps = self.windows.entry(key.to_string()).or_default();

        timestamps.retain(|t| now.duration_since(*t) < self.window);

        if timestamps.len() >= self.max_calls {
            debug!(
                key,
                calls = timestamps.len(),
                max = self.max_calls,
                "rate limit window exhausted"
            );
            return false;
        }

        timestamps.push(now);
        true
    }

    /// Calls currently counted against `key`'s window (pruned view)
    pub fn active_calls(&self, key: &str) -> usize {
        let now = Instant::now();
        self.windows
            .get(key)
            .map(|timestamps| {
                timestamps
                    .iter()
                    .filter(|t| now.duration_since(**t) < self.window)
                    .count()
            })
            .unwrap_or(0)
    }

    pub fn max_calls(&self) -> usize {
        self.max_calls
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(
            rate_limit::MAX_CALLS,
            Duration::from_millis(rate_limit::WINDOW_MS),
        )
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_burst_within_window_then_denied() {
        let limiter = RateLimiter::new(5, Duration::from_secs(60));

        for _ in 0..5 {
            assert!(limiter.can_proceed("openai"));
        }
        assert!(!limiter.can_proceed("openai"));
        assert_eq!(limiter.active_calls("openai"), 5);
    }

    #[test]
    fn test_denial_records_nothing() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));

        assert!(limiter.can_proceed("k"));
        assert!(limiter.can_proceed("k"));
        assert!(!limiter.can_proceed("k"));
        assert!(!limiter.can_proceed("k"));
        assert_eq!(limiter.active_calls("k"), 2);
    }

    #[test]
    fn test_permitted_again_after_window_expires() {
        let limiter = RateLimiter::new(2, Duration::from_millis(50));

        assert!(limiter.can_proceed("k"));
        assert!(limiter.can_proceed("k"));
        assert!(!limiter.can_proceed("k"));

        std::thread::sleep(Duration::from_millis(60));
        assert!(limiter.can_proceed("k"));
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));

        assert!(limiter.can_proceed("openai"));
        assert!(limiter.can_proceed("anthropic"));
        assert!(!limiter.can_proceed("openai"));
        assert!(!limiter.can_proceed("anthropic"));
    }

    #[test]
    fn test_instances_are_isolated() {
        let a = RateLimiter::new(1, Duration::from_secs(60));
        let b = RateLimiter::new(1, Duration::from_secs(60));

        assert!(a.can_proceed("k"));
        assert!(b.can_proceed("k"));
    }

    #[test]
    fn test_unknown_key_has_no_active_calls() {
        let limiter = RateLimiter::default();
        assert_eq!(limiter.active_calls("never-seen"), 0);
    }

    #[test]
    fn test_concurrent_callers_never_exceed_max() {
        let limiter = Arc::new(RateLimiter::new(10, Duration::from_secs(60)));
        let mut handles = Vec::new();

        for _ in 0..8 {
            let limiter = Arc::clone(&limiter);
            handles.push(std::thread::spawn(move || {
                let mut permitted = 0usize;
                for _ in 0..10 {
                    if limiter.can_proceed("shared") {
                        permitted += 1;
                    }
                }
                permitted
            }));
        }

        let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(total, 10);
    }
}
