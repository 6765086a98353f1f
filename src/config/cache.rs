//! Response cache configuration

use serde::{Deserialize, Serialize};

/// GET response cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether GET responses are cached at all
    pub enabled: bool,
    /// Maximum age of a cached response before it is refetched
    pub ttl_seconds: u64,
    /// Maximum number of cached responses; the oldest insert is evicted first
    pub max_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: 300,
            max_size: 100,
        }
    }
}
