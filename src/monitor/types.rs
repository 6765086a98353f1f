//! Type definitions for request telemetry.

use crate::client::Method;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a recorded request attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricStatus {
    Pending,
    Success,
    Error,
}

/// One request attempt (or cache hit) as seen by the monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestMetric {
    pub id: String,
    pub method: Method,
    pub endpoint: String,
    pub started_at: DateTime<Utc>,
    /// Set once when the attempt settles
    pub duration_ms: Option<u64>,
    pub status: MetricStatus,
    pub cache_hit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// 0-indexed retry attempt this metric belongs to
    pub attempt: u32,
}

impl RequestMetric {
    /// A freshly issued, still pending attempt.
    pub fn pending(method: Method, endpoint: impl Into<String>, attempt: u32) -> Self {
        Self {
            id: crate::logging::generate_request_id(),
            method,
            endpoint: endpoint.into(),
            started_at: Utc::now(),
            duration_ms: None,
            status: MetricStatus::Pending,
            cache_hit: false,
            status_code: None,
            attempt,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.status != MetricStatus::Pending
    }
}

/// Aggregate statistics over the retained metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestStats {
    pub total_requests: usize,
    pub successful_requests: usize,
    pub failed_requests: usize,
    pub pending_requests: usize,
    pub cached_requests: usize,
    /// failed / total, 0.0 when nothing was recorded
    pub error_rate: f64,
    /// Mean duration of settled requests in milliseconds
    pub average_response_time_ms: f64,
    /// Requests started within the last 60 seconds
    pub requests_per_minute: usize,
    pub top_endpoints: Vec<EndpointStats>,
}

/// Per-endpoint breakdown, ranked by call count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointStats {
    pub endpoint: String,
    pub count: usize,
    pub average_duration_ms: f64,
    pub error_rate: f64,
}

/// Read-only export of everything the monitor holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorSnapshot {
    pub exported_at: DateTime<Utc>,
    pub stats: RequestStats,
    pub metrics: Vec<RequestMetric>,
}
