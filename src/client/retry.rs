//! Retry policy with exponential backoff.

use crate::config::RetryConfig;
use rand::Rng;
use std::time::Duration;

/// How many times a failed request is retried and how long to wait in between.
///
/// The delay before attempt `n + 1` is `2^n * base_delay`; with jitter enabled a
/// random extra of up to half that delay is added, never subtracted.
///
/// ```rust
/// use std::time::Duration;
/// use ticketboard::client::RetryPolicy;
///
/// let policy = RetryPolicy::new(3);
/// assert_eq!(policy.delay_for(0), Duration::from_secs(1));
/// assert_eq!(policy.delay_for(2), Duration::from_secs(4));
/// assert_eq!(policy.max_attempts(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub jitter: bool,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_secs(1),
            jitter: false,
        }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self::new(0)
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Total attempts including the first one.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Whether another attempt follows a failed attempt number `attempt` (0-indexed).
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    /// Backoff before the attempt following failed attempt `attempt` (0-indexed).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        let delay = self.base_delay.saturating_mul(factor);
        if !self.jitter || delay.is_zero() {
            return delay;
        }
        let extra_ms = rand::thread_rng().gen_range(0..=(delay.as_millis() / 2) as u64);
        delay.saturating_add(Duration::from_millis(extra_ms))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(config.max_retries)
            .with_base_delay(Duration::from_millis(config.base_delay_ms))
            .with_jitter(config.jitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_exponential_delays() {
        let policy = RetryPolicy::new(5);
        assert_eq!(policy.delay_for(0), Duration::from_millis(1_000));
        assert_eq!(policy.delay_for(1), Duration::from_millis(2_000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(4_000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(8_000));
    }

    #[test]
    fn test_should_retry_boundary() {
        let policy = RetryPolicy::new(2);
        assert!(policy.should_retry(0));
        assert!(policy.should_retry(1));
        assert!(!policy.should_retry(2));
        assert!(!RetryPolicy::none().should_retry(0));
    }

    #[test]
    fn test_large_attempt_saturates() {
        let policy = RetryPolicy::new(100);
        assert!(policy.delay_for(64) >= policy.delay_for(31));
    }

    #[test]
    fn test_from_config() {
        let config = RetryConfig {
            max_retries: 1,
            base_delay_ms: 250,
            jitter: true,
        };
        let policy = RetryPolicy::from(&config);
        assert_eq!(policy.max_retries, 1);
        assert_eq!(policy.base_delay, Duration::from_millis(250));
        assert!(policy.jitter);
    }

    proptest! {
        #[test]
        fn prop_jitter_never_shortens_backoff(attempt in 0u32..10) {
            let plain = RetryPolicy::new(10);
            let jittered = plain.clone().with_jitter(true);
            let base = plain.delay_for(attempt);
            let delay = jittered.delay_for(attempt);
            prop_assert!(delay >= base);
            prop_assert!(delay <= base + base / 2);
        }
    }
}
