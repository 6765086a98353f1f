//! Ticketing API connection settings

use serde::{Deserialize, Serialize};

/// Connection settings for the GLPI ticketing backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every endpoint is joined onto (e.g., "http://localhost:8000/api")
    pub base_url: String,
    /// Per-attempt timeout in milliseconds
    pub timeout_ms: u64,
    /// Path of the aggregated dashboard metrics endpoint
    pub metrics_endpoint: String,
    /// Environment variable holding a bearer token, read at startup
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            timeout_ms: 10_000,
            metrics_endpoint: "/metrics/dashboard".to_string(),
            token_env: None,
        }
    }
}
