//! Request statistics.
//!
//! The REST client reports counters and timings through an injected
//! [`Stats`] handle. [`NoopStats`] discards everything; [`MemoryStats`]
//! keeps totals in a `DashMap` for inspection.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;

pub const METRIC_REQUEST: &str = "performline.clients.rest.request";
pub const METRIC_REQUEST_TIME: &str = "performline.clients.rest.request.time";
pub const METRIC_SUCCESS: &str = "performline.clients.rest.success";
pub const METRIC_ERROR: &str = "performline.clients.rest.error";
pub const METRIC_ERROR_ON_CONNECT: &str = "performline.clients.rest.error_on_connect";

/// Tags attached to a metric, kept sorted for stable keys.
pub type Tags = BTreeMap<String, String>;

/// Sink for client metrics.
pub trait Stats: Send + Sync {
    fn increment(&self, metric: &str, value: u64, tags: &Tags);
    fn timing(&self, metric: &str, elapsed: Duration, tags: &Tags);
    fn gauge(&self, metric: &str, value: f64, tags: &Tags);
}

/// Discards all metrics.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopStats;

impl Stats for NoopStats {
    fn increment(&self, _metric: &str, _value: u64, _tags: &Tags) {}
    fn timing(&self, _metric: &str, _elapsed: Duration, _tags: &Tags) {}
    fn gauge(&self, _metric: &str, _value: f64, _tags: &Tags) {}
}

/// Aggregated timing for one metric key.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimingSummary {
    pub count: u64,
    pub total: Duration,
    pub max: Duration,
}

/// Thread-safe in-memory recorder.
///
/// Keys are `metric,tag1=v1,tag2=v2` with tags in sorted order.
#[derive(Debug, Default)]
pub struct MemoryStats {
    counters: DashMap<String, u64>,
    timings: DashMap<String, TimingSummary>,
    gauges: DashMap<String, f64>,
}

impl MemoryStats {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn counter(&self, key: &str) -> u64 {
        self.counters.get(key).map(|v| *v).unwrap_or(0)
    }

    /// Sums a counter across every tag combination.
    pub fn counter_total(&self, metric: &str) -> u64 {
        self.counters
            .iter()
            .filter(|e| metric_name(e.key()) == metric)
            .map(|e| *e.value())
            .sum()
    }

    pub fn timing_summary(&self, key: &str) -> Option<TimingSummary> {
        self.timings.get(key).map(|v| *v)
    }

    pub fn gauge_value(&self, key: &str) -> Option<f64> {
        self.gauges.get(key).map(|v| *v)
    }

    /// All counters, sorted by key.
    pub fn counters(&self) -> Vec<(String, u64)> {
        let mut out: Vec<_> = self
            .counters
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect();
        out.sort();
        out
    }

    pub fn clear(&self) {
        self.counters.clear();
        self.timings.clear();
        self.gauges.clear();
    }
}

impl Stats for MemoryStats {
    fn increment(&self, metric: &str, value: u64, tags: &Tags) {
        *self.counters.entry(metric_key(metric, tags)).or_insert(0) += value;
    }

    fn timing(&self, metric: &str, elapsed: Duration, tags: &Tags) {
        let mut entry = self.timings.entry(metric_key(metric, tags)).or_default();
        entry.count += 1;
        entry.total += elapsed;
        entry.max = entry.max.max(elapsed);
    }

    fn gauge(&self, metric: &str, value: f64, tags: &Tags) {
        self.gauges.insert(metric_key(metric, tags), value);
    }
}

/// Builds the storage key for a metric and its tags.
pub fn metric_key(metric: &str, tags: &Tags) -> String {
    let mut key = metric.to_string();
    for (k, v) in tags {
        key.push(',');
        key.push_str(&sanitize(k));
        key.push('=');
        key.push_str(&sanitize(v));
    }
    key
}

fn metric_name(key: &str) -> &str {
    key.split(',').next().unwrap_or(key)
}

// Tag separators cannot appear inside tag names or values.
fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| if c == ',' || c == '=' || c.is_whitespace() { '_' } else { c })
        .collect()
}
