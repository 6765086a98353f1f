//! Retry and backoff configuration

use serde::{Deserialize, Serialize};

/// Retry policy settings shared by every request that doesn't override them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Additional attempts after the first failure
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each further attempt
    pub base_delay_ms: u64,
    /// Add a random extra delay of up to half the computed backoff
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1_000,
            jitter: false,
        }
    }
}
