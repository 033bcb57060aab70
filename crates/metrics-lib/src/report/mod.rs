//! Report building
//!
//! Collects one record per deployment through a [`WorkloadApi`] and renders
//! the records as a table, JSON or CSV. Each deployment is collected inside
//! its own failure boundary: a non-fatal error skips that deployment and is
//! reported alongside the successful records.

mod format;
mod render;


pub use format::{format_cpu, format_memory};
pub use render::{csv_header, render, render_csv, render_json, render_table, FormattedRange, RecordView, ReportFormat};

use tracing::info;

use crate::api::WorkloadApi;
use crate::error::{MetricsError, Result};
use crate::models::{
    DeploymentEntity, DeploymentMetricRecord, MetricRange, TimeRange, CPU_USAGE_METRIC,
    MEMORY_USAGE_METRIC,
};
use crate::observability;

/// What to collect
#[derive(Debug, Clone)]
pub struct MetricsRequest {
    pub cluster: String,
    pub namespace: String,
    /// Look-back window in hours
    pub hours: u32,
    pub include_heap: bool,
}

/// A deployment whose metrics could not be collected
#[derive(Debug)]
pub struct DeploymentFailure {
    pub deployment: String,
    pub error: MetricsError,
}

/// Outcome of one collection run
#[derive(Debug)]
pub struct CollectionReport {
    pub records: Vec<DeploymentMetricRecord>,
    pub failures: Vec<DeploymentFailure>,
    pub time_range: TimeRange,
}

impl CollectionReport {
    /// Number of deployments discovered, collected or not
    pub fn deployment_count(&self) -> usize {
        self.records.len() + self.failures.len()
    }
}

/// Collect metrics for every deployment over the last `request.hours`
pub async fn collect(api: &dyn WorkloadApi, request: &MetricsRequest) -> Result<CollectionReport> {
    collect_in(api, request, TimeRange::last_hours(request.hours)).await
}

/// Collect metrics for every deployment over an explicit window
///
/// Deployments are processed one at a time in listing order. Failing to list
/// deployments, or an authentication error at any point, aborts the run; any
/// other error skips only the deployment it occurred on.
pub async fn collect_in(
    api: &dyn WorkloadApi,
    request: &MetricsRequest,
    time_range: TimeRange,
) -> Result<CollectionReport> {
    let deployments = api
        .list_deployments(&request.cluster, &request.namespace)
        .await?;
    info!(
        cluster = %request.cluster,
        namespace = %request.namespace,
        count = deployments.len(),
        "Collecting deployment metrics"
    );

    let mut records = Vec::with_capacity(deployments.len());
    let mut failures = Vec::new();

    for deployment in &deployments {
        match collect_deployment(api, deployment, &time_range, request.include_heap).await {
            Ok(record) => records.push(record),
            Err(error) if error.is_fatal() => return Err(error),
            Err(error) => {
                observability::log_deployment_failure(&deployment.display_name, &error);
                failures.push(DeploymentFailure {
                    deployment: deployment.display_name.clone(),
                    error,
                });
            }
        }
    }

    if !failures.is_empty() {
        info!(
            failed = failures.len(),
            succeeded = records.len(),
            "Some deployments could not be collected"
        );
    }

    Ok(CollectionReport {
        records,
        failures,
        time_range,
    })
}

/// Pod count, CPU, memory and optionally heap for one deployment
pub async fn collect_deployment(
    api: &dyn WorkloadApi,
    deployment: &DeploymentEntity,
    time_range: &TimeRange,
    include_heap: bool,
) -> Result<DeploymentMetricRecord> {
    info!(deployment = %deployment.display_name, "Fetching deployment metrics");

    let pod_count = api.pod_count(deployment).await?;
    let cpu = api
        .query_metric(CPU_USAGE_METRIC, &deployment.entity_id, time_range)
        .await?;
    let memory = api
        .query_metric(MEMORY_USAGE_METRIC, &deployment.entity_id, time_range)
        .await?;

    let heap = if include_heap {
        match api.resolve_heap_scope(deployment).await? {
            Some(scope) => Some(api.query_heap(&scope, time_range).await?),
            None => Some(MetricRange::ZERO),
        }
    } else {
        None
    };

    Ok(DeploymentMetricRecord {
        deployment_name: deployment.display_name.clone(),
        namespace: deployment.namespace.clone(),
        cluster: deployment.cluster.clone(),
        pod_count,
        cpu,
        memory,
        heap,
    })
}
