//! Core data models for deployment metrics

use serde::{Deserialize, Serialize};

/// Workload CPU usage, reported in millicores
pub const CPU_USAGE_METRIC: &str = "builtin:cloud.kubernetes.workload.cpu.usage";
/// Workload memory usage, reported in bytes
pub const MEMORY_USAGE_METRIC: &str = "builtin:cloud.kubernetes.workload.memory.usage";
/// Heap metric keys in the order they are tried
pub const HEAP_METRIC_CANDIDATES: &[&str] = &[
    "builtin:tech.generic.mem.usedHeap",
    "builtin:tech.jvm.memory.pool.used",
];

/// A Kubernetes deployment as tracked by the monitoring platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentEntity {
    pub entity_id: String,
    pub display_name: String,
    pub namespace: String,
    pub cluster: String,
}

/// One tag attached to an entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityTag {
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub string_representation: Option<String>,
}

impl EntityTag {
    /// Whether this is the Kubernetes tag `name` in any of its spellings
    ///
    /// Matches `name`, `[Kubernetes]name` and `Kubernetes:name`, ignoring case.
    pub fn is_kubernetes_key(&self, name: &str) -> bool {
        let key = self.key.to_ascii_lowercase();
        let name = name.to_ascii_lowercase();
        key == name || key == format!("[kubernetes]{}", name) || key == format!("kubernetes:{}", name)
    }

    /// Tag value, falling back to the value embedded in the string representation
    pub fn tag_value(&self) -> Option<String> {
        if let Some(value) = &self.value {
            return Some(value.clone());
        }
        self.string_representation
            .as_deref()
            .and_then(|repr| repr.rsplit_once(':'))
            .map(|(_, value)| value.to_string())
    }
}

/// A single point of a metric time series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricSample {
    pub timestamp: i64,
    pub value: f64,
}

/// Min/max pair of a metric over the query window
///
/// `(0, 0)` means no data points were returned. That is indistinguishable
/// from a workload that genuinely used nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricRange {
    pub min: f64,
    pub max: f64,
}

impl MetricRange {
    pub const ZERO: MetricRange = MetricRange { min: 0.0, max: 0.0 };

    /// Build a range, swapping the bounds if they arrive reversed
    pub fn new(min: f64, max: f64) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// Reduce the `:min` and `:max` series of a query to one range
    ///
    /// When only one aggregation has data, both bounds come from it.
    pub fn from_samples(min_samples: &[MetricSample], max_samples: &[MetricSample]) -> Self {
        let (min_side, max_side) = match (min_samples.is_empty(), max_samples.is_empty()) {
            (true, true) => return Self::ZERO,
            (false, true) => (min_samples, min_samples),
            (true, false) => (max_samples, max_samples),
            (false, false) => (min_samples, max_samples),
        };

        let min = min_side
            .iter()
            .map(|s| s.value)
            .fold(f64::INFINITY, f64::min);
        let max = max_side
            .iter()
            .map(|s| s.value)
            .fold(f64::NEG_INFINITY, f64::max);

        Self::new(min, max)
    }

    /// Whether any data contributed to this range
    pub fn has_data(&self) -> bool {
        self.min > 0.0 || self.max > 0.0
    }

    /// Combine ranges from several scopes: lowest min, highest max
    pub fn merge<I: IntoIterator<Item = MetricRange>>(ranges: I) -> Option<Self> {
        ranges.into_iter().fold(None, |acc, r| match acc {
            None => Some(r),
            Some(a) => Some(MetricRange::new(a.min.min(r.min), a.max.max(r.max))),
        })
    }
}

/// Query window in epoch milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub from_ms: i64,
    pub to_ms: i64,
}

impl TimeRange {
    /// Window ending now and reaching `hours` back
    pub fn last_hours(hours: u32) -> Self {
        Self::ending_at(chrono::Utc::now().timestamp_millis(), hours)
    }

    pub fn ending_at(to_ms: i64, hours: u32) -> Self {
        Self {
            from_ms: to_ms - i64::from(hours) * 3_600_000,
            to_ms,
        }
    }

    /// Render a bound as local wall-clock time
    pub fn format_bound(ms: i64) -> String {
        chrono::DateTime::from_timestamp_millis(ms)
            .map(|dt| {
                dt.with_timezone(&chrono::Local)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string()
            })
            .unwrap_or_else(|| ms.to_string())
    }
}

/// Process groups whose JVM metrics stand in for a deployment's heap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapScope {
    pub process_group_ids: Vec<String>,
}

/// Aggregated metrics for one deployment
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentMetricRecord {
    pub deployment_name: String,
    pub namespace: String,
    pub cluster: String,
    pub pod_count: u64,
    /// Millicores
    pub cpu: MetricRange,
    /// Bytes
    pub memory: MetricRange,
    /// Bytes; `None` unless heap collection was requested
    pub heap: Option<MetricRange>,
}
