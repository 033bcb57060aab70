//! Table, JSON and CSV rendering of deployment records

use serde::{Deserialize, Serialize};
use tabled::{builder::Builder, settings::Style};

use super::format::{format_cpu, format_memory};
use crate::models::{DeploymentMetricRecord, MetricRange};

/// Output format of a report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Table,
    Json,
    Csv,
}

/// Raw bounds together with their display strings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedRange {
    pub min: f64,
    pub max: f64,
    pub min_formatted: String,
    pub max_formatted: String,
}

impl FormattedRange {
    pub fn cpu(range: MetricRange) -> Self {
        Self::with(range, format_cpu)
    }

    pub fn memory(range: MetricRange) -> Self {
        Self::with(range, format_memory)
    }

    fn with(range: MetricRange, fmt: fn(f64) -> String) -> Self {
        Self {
            min: range.min,
            max: range.max,
            min_formatted: fmt(range.min),
            max_formatted: fmt(range.max),
        }
    }
}

/// JSON shape of one deployment record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordView {
    pub deployment_name: String,
    pub namespace: String,
    pub cluster: String,
    pub pod_count: u64,
    pub cpu: FormattedRange,
    pub memory: FormattedRange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heap: Option<FormattedRange>,
}

impl From<&DeploymentMetricRecord> for RecordView {
    fn from(record: &DeploymentMetricRecord) -> Self {
        Self {
            deployment_name: record.deployment_name.clone(),
            namespace: record.namespace.clone(),
            cluster: record.cluster.clone(),
            pod_count: record.pod_count,
            cpu: FormattedRange::cpu(record.cpu),
            memory: FormattedRange::memory(record.memory),
            heap: record.heap.map(FormattedRange::memory),
        }
    }
}

/// Render records in the requested format
pub fn render(
    records: &[DeploymentMetricRecord],
    format: ReportFormat,
    include_heap: bool,
) -> serde_json::Result<String> {
    match format {
        ReportFormat::Table => Ok(render_table(records, include_heap)),
        ReportFormat::Json => render_json(records),
        ReportFormat::Csv => Ok(render_csv(records, include_heap)),
    }
}

/// Fixed-width table with formatted units
pub fn render_table(records: &[DeploymentMetricRecord], include_heap: bool) -> String {
    let mut builder = Builder::default();

    let mut header = vec!["Deployment", "Pods", "CPU Min", "CPU Max", "Memory Min", "Memory Max"];
    if include_heap {
        header.extend(["Heap Min", "Heap Max"]);
    }
    builder.push_record(header);

    for record in records {
        let mut row = vec![
            record.deployment_name.clone(),
            record.pod_count.to_string(),
            format_cpu(record.cpu.min),
            format_cpu(record.cpu.max),
            format_memory(record.memory.min),
            format_memory(record.memory.max),
        ];
        if include_heap {
            let heap = record.heap.unwrap_or_default();
            row.push(format_memory(heap.min));
            row.push(format_memory(heap.max));
        }
        builder.push_record(row);
    }

    builder.build().with(Style::rounded()).to_string()
}

/// Pretty-printed JSON array of [`RecordView`]s
pub fn render_json(records: &[DeploymentMetricRecord]) -> serde_json::Result<String> {
    let views: Vec<RecordView> = records.iter().map(RecordView::from).collect();
    serde_json::to_string_pretty(&views)
}

/// CSV column names; heap columns sit after the memory columns
pub fn csv_header(include_heap: bool) -> Vec<&'static str> {
    let mut header = vec![
        "cluster",
        "deployment",
        "cpu_usage_min",
        "cpu_usage_max",
        "memory_usage_min",
        "memory_usage_max",
    ];
    if include_heap {
        header.extend(["heap_usage_min", "heap_usage_max"]);
    }
    header.push("number_of_pods");
    header
}

/// CSV with raw, unformatted values
pub fn render_csv(records: &[DeploymentMetricRecord], include_heap: bool) -> String {
    let mut out = csv_header(include_heap).join(",");
    out.push('\n');

    for record in records {
        let mut fields = vec![
            csv_field(&record.cluster),
            csv_field(&record.deployment_name),
            record.cpu.min.to_string(),
            record.cpu.max.to_string(),
            record.memory.min.to_string(),
            record.memory.max.to_string(),
        ];
        if include_heap {
            let heap = record.heap.unwrap_or_default();
            fields.push(heap.min.to_string());
            fields.push(heap.max.to_string());
        }
        fields.push(record.pod_count.to_string());

        out.push_str(&fields.join(","));
        out.push('\n');
    }

    out
}

fn csv_field(value: &str) -> String {
    if value.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_field_quoting() {
        assert_eq!(csv_field("cart"), "cart");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_csv_header_positions_heap_after_memory() {
        assert_eq!(
            csv_header(false),
            vec![
                "cluster",
                "deployment",
                "cpu_usage_min",
                "cpu_usage_max",
                "memory_usage_min",
                "memory_usage_max",
                "number_of_pods"
            ]
        );
        let with_heap = csv_header(true);
        let memory_max = with_heap.iter().position(|c| *c == "memory_usage_max").unwrap();
        assert_eq!(with_heap[memory_max + 1], "heap_usage_min");
        assert_eq!(with_heap[memory_max + 2], "heap_usage_max");
    }
}
