//! Queue-level retry policy
//!
//! An explicit policy object rather than ad-hoc timer chains: the queue
//! asks it how long to wait after a given attempt, and the delays go
//! through `tokio::time::sleep` so tests can drive them with a paused
//! clock.

use std::time::Duration;

use cardbox_core::config::RetryConfig;

/// How many times an operation is attempted and how long to back off
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per operation (first try included)
    pub max_attempts: u32,
    /// Base backoff delay; attempt `n` waits `base * 2^(n-1)`
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.base_delay_ms),
        )
    }

    /// The backoff delay after the given 1-based failed attempt
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay * 2u32.pow(exponent)
    }

    /// Whether another attempt is allowed after `attempt` failures
    #[must_use]
    pub fn allows_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_contract() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base_delay, Duration::from_secs(1));
    }

    #[test]
    fn test_exponential_delays() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3), Duration::from_secs(4));
    }

    #[test]
    fn test_allows_retry() {
        let policy = RetryPolicy::default();
        assert!(policy.allows_retry(1));
        assert!(policy.allows_retry(2));
        assert!(!policy.allows_retry(3));
    }

    #[test]
    fn test_zero_attempts_clamped_to_one() {
        let policy = RetryPolicy::new(0, Duration::from_secs(1));
        assert_eq!(policy.max_attempts, 1);
    }

    #[test]
    fn test_exponent_is_capped() {
        let policy = RetryPolicy::new(64, Duration::from_secs(1));
        // Large attempt numbers must not overflow the multiplier.
        assert_eq!(policy.delay_for(40), Duration::from_secs(1) * 65_536);
    }
}
