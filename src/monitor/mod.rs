//! Request monitor
//!
//! Keeps a bounded, insertion-ordered buffer of request metrics and computes
//! summary statistics on demand. Nothing here panics or divides by zero; an
//! empty monitor reports all-zero statistics.

pub mod types;

pub use types::*;

use crate::client::Method;
use crate::config::MonitorConfig;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

const RATE_WINDOW_SECS: i64 = 60;

/// Ring buffer of request metrics (oldest dropped first).
pub struct RequestMonitor {
    metrics: RwLock<VecDeque<RequestMetric>>,
    capacity: usize,
    top_endpoints: usize,
}

impl RequestMonitor {
    pub fn new(config: &MonitorConfig) -> Self {
        let capacity = config.max_metrics.max(1);
        Self {
            metrics: RwLock::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
            top_endpoints: config.top_endpoints,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(&MonitorConfig {
            max_metrics: capacity,
            ..MonitorConfig::default()
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, VecDeque<RequestMetric>> {
        self.metrics.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, VecDeque<RequestMetric>> {
        self.metrics.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a metric, trimming the oldest entries beyond capacity.
    pub fn record(&self, metric: RequestMetric) {
        let mut metrics = self.write();
        metrics.push_back(metric);
        while metrics.len() > self.capacity {
            metrics.pop_front();
        }
    }

    /// Record a pending attempt and return its id for [`complete`](Self::complete).
    pub fn begin(&self, method: Method, endpoint: &str, attempt: u32) -> String {
        let metric = RequestMetric::pending(method, endpoint, attempt);
        let id = metric.id.clone();
        self.record(metric);
        id
    }

    /// Record a request answered from the cache; it settles immediately.
    pub fn record_cache_hit(&self, method: Method, endpoint: &str) {
        let mut metric = RequestMetric::pending(method, endpoint, 0);
        metric.cache_hit = true;
        metric.status = MetricStatus::Success;
        metric.duration_ms = Some(0);
        self.record(metric);
    }

    /// Settle a pending metric. Returns false if the id is unknown (already
    /// trimmed or cleared) or the metric was settled before.
    pub fn complete(
        &self,
        id: &str,
        success: bool,
        status_code: Option<u16>,
        duration: Duration,
    ) -> bool {
        let mut metrics = self.write();
        let Some(metric) = metrics.iter_mut().rev().find(|m| m.id == id) else {
            return false;
        };
        if metric.is_settled() {
            return false;
        }
        metric.status = if success {
            MetricStatus::Success
        } else {
            MetricStatus::Error
        };
        metric.status_code = status_code;
        metric.duration_ms = Some(duration.as_millis() as u64);
        true
    }

    pub fn stats(&self) -> RequestStats {
        self.stats_at(Utc::now())
    }

    /// Compute statistics as of `now` (used for the requests-per-minute window).
    pub fn stats_at(&self, now: DateTime<Utc>) -> RequestStats {
        let metrics = self.read();
        let total = metrics.len();
        if total == 0 {
            return RequestStats::default();
        }

        let mut stats = RequestStats {
            total_requests: total,
            ..RequestStats::default()
        };
        let mut settled_duration = 0u64;
        let mut settled = 0usize;

        for metric in metrics.iter() {
            match metric.status {
                MetricStatus::Success => stats.successful_requests += 1,
                MetricStatus::Error => stats.failed_requests += 1,
                MetricStatus::Pending => stats.pending_requests += 1,
            }
            if metric.cache_hit {
                stats.cached_requests += 1;
            }
            if let Some(duration) = metric.duration_ms.filter(|_| metric.is_settled()) {
                settled_duration += duration;
                settled += 1;
            }
            let age = now.signed_duration_since(metric.started_at);
            if age >= chrono::Duration::zero() && age < chrono::Duration::seconds(RATE_WINDOW_SECS)
            {
                stats.requests_per_minute += 1;
            }
        }

        stats.error_rate = ratio(stats.failed_requests, total);
        stats.average_response_time_ms = if settled == 0 {
            0.0
        } else {
            settled_duration as f64 / settled as f64
        };
        stats.top_endpoints = rank_endpoints(metrics.iter(), self.top_endpoints);
        stats
    }

    /// The `n` slowest settled requests, longest first; ties keep arrival order.
    pub fn slowest_requests(&self, n: usize) -> Vec<RequestMetric> {
        let mut settled: Vec<RequestMetric> = self
            .read()
            .iter()
            .filter(|m| m.is_settled() && m.duration_ms.is_some())
            .cloned()
            .collect();
        settled.sort_by(|a, b| b.duration_ms.cmp(&a.duration_ms));
        settled.truncate(n);
        settled
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    /// All retained metrics, oldest first.
    pub fn metrics(&self) -> Vec<RequestMetric> {
        self.read().iter().cloned().collect()
    }

    pub fn export_data(&self) -> MonitorSnapshot {
        let now = Utc::now();
        MonitorSnapshot {
            exported_at: now,
            stats: self.stats_at(now),
            metrics: self.metrics(),
        }
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for RequestMonitor {
    fn default() -> Self {
        Self::new(&MonitorConfig::default())
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

fn rank_endpoints<'a>(
    metrics: impl Iterator<Item = &'a RequestMetric>,
    limit: usize,
) -> Vec<EndpointStats> {
    // (endpoint, count, errors, settled duration sum, settled count), first-seen order
    let mut groups: Vec<(String, usize, usize, u64, usize)> = Vec::new();
    for metric in metrics {
        let index = match groups.iter().position(|g| g.0 == metric.endpoint) {
            Some(index) => index,
            None => {
                groups.push((metric.endpoint.clone(), 0, 0, 0, 0));
                groups.len() - 1
            }
        };
        let group = &mut groups[index];
        group.1 += 1;
        if metric.status == MetricStatus::Error {
            group.2 += 1;
        }
        if let Some(duration) = metric.duration_ms.filter(|_| metric.is_settled()) {
            group.3 += duration;
            group.4 += 1;
        }
    }

    groups.sort_by(|a, b| b.1.cmp(&a.1));
    groups
        .into_iter()
        .take(limit)
        .map(|(endpoint, count, errors, duration, settled)| EndpointStats {
            endpoint,
            count,
            average_duration_ms: if settled == 0 {
                0.0
            } else {
                duration as f64 / settled as f64
            },
            error_rate: ratio(errors, count),
        })
        .collect()
}
