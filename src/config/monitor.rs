//! Request monitor configuration

use serde::{Deserialize, Serialize};

/// Retention and reporting settings for request telemetry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Maximum number of retained request metrics (oldest dropped first)
    pub max_metrics: usize,
    /// Number of endpoints reported in `top_endpoints`
    pub top_endpoints: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            max_metrics: 1_000,
            top_endpoints: 10,
        }
    }
}
