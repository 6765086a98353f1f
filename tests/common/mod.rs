//! Shared test utilities for ticketboard integration tests.

#![allow(dead_code)]

use serde_json::{json, Value};
use ticketboard::client::ApiClient;
use ticketboard::config::DashboardConfig;

/// Path of the metrics endpoint under the mock server.
pub const METRICS_PATH: &str = "/api/metrics/dashboard";

/// Configuration pointing at a mock server, with fast retries.
pub fn test_config(server_uri: &str) -> DashboardConfig {
    let mut config = DashboardConfig::default();
    config.api.base_url = format!("{}/api", server_uri);
    config.api.timeout_ms = 2_000;
    config.retry.base_delay_ms = 10;
    config
}

pub fn test_client(config: &DashboardConfig) -> ApiClient {
    ApiClient::new(config).unwrap()
}

/// Successful envelope carrying dashboard totals.
pub fn dashboard_body(total: u64) -> Value {
    json!({
        "success": true,
        "data": {
            "totals": {"new": 2, "in_progress": 3, "pending": 1, "resolved": 4, "closed": 0, "total": total},
            "by_level": {
                "N1": {"new": 2, "total": 6},
                "N2": {"in_progress": 3, "total": 4}
            },
            "technician_ranking": [
                {"id": 7, "name": "Ana Souza", "level": "N1", "total": 12, "resolved": 10}
            ]
        }
    })
}

/// Unsuccessful envelope with a message.
pub fn failure_body(message: &str) -> Value {
    json!({"success": false, "message": message})
}
