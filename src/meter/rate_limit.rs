//! Per-identifier attempt limiting with fixed windows.
//!
//! Each identifier gets a window that starts at its first attempt and resets
//! wholesale once it has elapsed. Every call counts, allowed or not, so
//! repeated probing keeps the identifier throttled until the window ends.

use crate::clock::{Clock, SystemClock};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

/// Map size at which `check` drops expired windows before tracking a new
/// identifier.
pub const PRUNE_THRESHOLD: usize = 1024;

/// Attempt budget for one identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Attempts allowed per window.
    pub max_attempts: u32,
    /// Window length.
    pub window: Duration,
}

impl RateLimitPolicy {
    /// Default redemption policy: 3 attempts per 5 minutes.
    pub const REDEMPTION: RateLimitPolicy = RateLimitPolicy {
        max_attempts: 3,
        window: Duration::from_secs(300),
    };
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self::REDEMPTION
    }
}

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// Whether the attempt may proceed.
    pub allowed: bool,
    /// Attempts left in the window (allowed decisions only).
    pub remaining: Option<u32>,
    /// Seconds until the window resets (denied decisions only).
    pub retry_after_seconds: Option<u64>,
}

impl RateLimitDecision {
    fn allowed(remaining: u32) -> Self {
        Self {
            allowed: true,
            remaining: Some(remaining),
            retry_after_seconds: None,
        }
    }

    fn throttled(retry_after_seconds: u64) -> Self {
        Self {
            allowed: false,
            remaining: None,
            retry_after_seconds: Some(retry_after_seconds),
        }
    }
}

/// Counter state for one identifier.
#[derive(Debug, Clone, Copy)]
struct RateLimitState {
    count: u32,
    /// Unix milliseconds after which the window resets.
    window_reset_at: i64,
}

/// In-memory rate limiter keyed by identifier (username, IP, ...).
///
/// State is never persisted; a process restart clears all windows.
pub struct RateLimiter {
    attempts: Mutex<HashMap<String, RateLimitState>>,
    clock: Arc<dyn Clock>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl RateLimiter {
    /// Create a rate limiter reading time from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            attempts: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Record an attempt for `identifier` and decide whether it may proceed.
    pub fn check(&self, identifier: &str, max_attempts: u32, window: Duration) -> RateLimitDecision {
        let now = self.clock.now_unix_millis();
        let window_ms = i64::try_from(window.as_millis()).unwrap_or(i64::MAX);

        let mut attempts = self.attempts.lock().unwrap_or_else(|e| e.into_inner());
        if attempts.len() >= PRUNE_THRESHOLD && !attempts.contains_key(identifier) {
            let before = attempts.len();
            attempts.retain(|_, state| now <= state.window_reset_at);
            debug!(
                dropped = before - attempts.len(),
                remaining = attempts.len(),
                "pruned expired rate limit windows"
            );
        }

        let state = attempts
            .entry(identifier.to_string())
            .or_insert(RateLimitState {
                count: 0,
                window_reset_at: now.saturating_add(window_ms),
            });

        if now > state.window_reset_at {
            state.count = 0;
            state.window_reset_at = now.saturating_add(window_ms);
        }

        state.count = state.count.saturating_add(1);

        if state.count > max_attempts {
            let wait_ms = state.window_reset_at.saturating_sub(now).max(0);
            let retry_after = (wait_ms as u64).saturating_add(999) / 1000;
            debug!(
                identifier = %identifier,
                count = state.count,
                retry_after,
                "rate limit exceeded"
            );
            return RateLimitDecision::throttled(retry_after);
        }

        RateLimitDecision::allowed(max_attempts - state.count)
    }

    /// Record an attempt using a [`RateLimitPolicy`].
    pub fn check_policy(&self, identifier: &str, policy: &RateLimitPolicy) -> RateLimitDecision {
        self.check(identifier, policy.max_attempts, policy.window)
    }

    /// Drop identifiers whose window has already elapsed.
    pub fn cleanup(&self) {
        let now = self.clock.now_unix_millis();
        let mut attempts = self.attempts.lock().unwrap_or_else(|e| e.into_inner());
        attempts.retain(|_, state| now <= state.window_reset_at);
    }

    /// Number of identifiers currently tracked.
    pub fn tracked_identifiers(&self) -> usize {
        self.attempts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;
    use std::thread;

    fn mock_limiter() -> (Arc<MockClock>, RateLimiter) {
        let clock = Arc::new(MockClock::from_rfc3339("2025-01-15T12:00:00Z"));
        let limiter = RateLimiter::new(clock.clone());
        (clock, limiter)
    }

    #[test]
    fn test_allows_up_to_max_then_throttles() {
        let (_clock, limiter) = mock_limiter();
        let window = Duration::from_millis(1000);

        assert_eq!(limiter.check("alice", 3, window).remaining, Some(2));
        assert_eq!(limiter.check("alice", 3, window).remaining, Some(1));
        assert_eq!(limiter.check("alice", 3, window).remaining, Some(0));

        let denied = limiter.check("alice", 3, window);
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, None);
        assert_eq!(denied.retry_after_seconds, Some(1));
    }

    #[test]
    fn test_window_reset_gives_fresh_count() {
        let (clock, limiter) = mock_limiter();
        let window = Duration::from_millis(1000);

        for _ in 0..4 {
            limiter.check("alice", 3, window);
        }
        assert!(!limiter.check("alice", 3, window).allowed);

        clock.advance(chrono::Duration::milliseconds(1001));

        let fresh = limiter.check("alice", 3, window);
        assert!(fresh.allowed);
        assert_eq!(fresh.remaining, Some(2));
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let (clock, limiter) = mock_limiter();
        let window = Duration::from_millis(1000);

        for _ in 0..3 {
            limiter.check("alice", 3, window);
        }
        // now == window_reset_at is still inside the window
        clock.advance(chrono::Duration::milliseconds(1000));
        assert!(!limiter.check("alice", 3, window).allowed);
    }

    #[test]
    fn test_denied_attempts_still_count() {
        let (clock, limiter) = mock_limiter();
        let window = Duration::from_secs(300);

        for _ in 0..10 {
            limiter.check("alice", 3, window);
        }
        clock.advance(chrono::Duration::seconds(299));

        let denied = limiter.check("alice", 3, window);
        assert!(!denied.allowed);
        assert_eq!(denied.retry_after_seconds, Some(1));
    }

    #[test]
    fn test_retry_after_rounds_up() {
        let (clock, limiter) = mock_limiter();
        let policy = RateLimitPolicy::REDEMPTION;

        for _ in 0..3 {
            assert!(limiter.check_policy("alice", &policy).allowed);
        }
        clock.advance(chrono::Duration::milliseconds(100_500));

        let denied = limiter.check_policy("alice", &policy);
        assert_eq!(denied.retry_after_seconds, Some(200));
    }

    #[test]
    fn test_identifiers_are_independent() {
        let (_clock, limiter) = mock_limiter();
        let window = Duration::from_secs(60);

        for _ in 0..3 {
            limiter.check("alice", 2, window);
        }
        assert!(!limiter.check("alice", 2, window).allowed);
        assert!(limiter.check("bob", 2, window).allowed);
    }

    #[test]
    fn test_zero_budget_denies_everything() {
        let (_clock, limiter) = mock_limiter();
        assert!(!limiter.check("alice", 0, Duration::from_secs(5)).allowed);
    }

    #[test]
    fn test_cleanup_drops_expired_windows() {
        let (clock, limiter) = mock_limiter();
        limiter.check("alice", 3, Duration::from_secs(1));
        limiter.check("bob", 3, Duration::from_secs(10));
        assert_eq!(limiter.tracked_identifiers(), 2);

        clock.advance(chrono::Duration::seconds(2));
        limiter.cleanup();
        assert_eq!(limiter.tracked_identifiers(), 1);
    }

    #[test]
    fn test_check_prunes_expired_windows_past_threshold() {
        let (clock, limiter) = mock_limiter();
        let window = Duration::from_secs(1);

        for i in 0..PRUNE_THRESHOLD {
            limiter.check(&format!("user{}", i), 3, window);
        }
        assert_eq!(limiter.tracked_identifiers(), PRUNE_THRESHOLD);

        clock.advance(chrono::Duration::seconds(2));
        assert!(limiter.check("newcomer", 3, window).allowed);
        assert_eq!(limiter.tracked_identifiers(), 1);
    }

    #[test]
    fn test_pruning_keeps_live_windows() {
        let (clock, limiter) = mock_limiter();

        for _ in 0..4 {
            limiter.check("alice", 3, Duration::from_secs(300));
        }
        for i in 1..PRUNE_THRESHOLD {
            limiter.check(&format!("user{}", i), 3, Duration::from_secs(1));
        }

        clock.advance(chrono::Duration::seconds(2));
        limiter.check("newcomer", 3, Duration::from_secs(1));

        assert_eq!(limiter.tracked_identifiers(), 2);
        assert!(!limiter.check("alice", 3, Duration::from_secs(300)).allowed);
    }

    #[test]
    fn test_default_policy() {
        assert_eq!(RateLimitPolicy::default().max_attempts, 3);
        assert_eq!(RateLimitPolicy::default().window, Duration::from_secs(300));
    }

    #[test]
    fn test_real_clock_window_expiry() {
        let limiter = RateLimiter::default();
        let window = Duration::from_millis(1000);

        for _ in 0..3 {
            assert!(limiter.check("alice", 3, window).allowed);
        }
        let denied = limiter.check("alice", 3, window);
        assert!(!denied.allowed);
        assert!(denied.retry_after_seconds.unwrap() > 0);

        thread::sleep(Duration::from_millis(1100));

        let fresh = limiter.check("alice", 3, window);
        assert!(fresh.allowed);
        assert_eq!(fresh.remaining, Some(2));
    }
}
