//! Dynatrace API access
//!
//! This module wraps the entity, metrics, entity type and dashboard
//! endpoints behind an authenticated client, and resolves a
//! (cluster, namespace) pair to deployments, pods and process groups.

mod client;
mod discovery;
mod metrics;
mod types;


pub use client::{ApiClient, AuthScheme, ClientConfig};
pub use discovery::{matches_namespace, DiscoveryStrategy, DISCOVERY_STRATEGIES};
pub use types::{
    DashboardCreated, EntitiesResponse, Entity, EntityTypeEntry, EntityTypesResponse,
    MetricQueryResponse, MetricSeries, MetricSeriesCollection,
};

use crate::error::Result;
use crate::models::{DeploymentEntity, HeapScope, MetricRange, TimeRange};

pub use async_trait::async_trait;

/// Operations the report builder needs from the monitoring platform
#[async_trait]
pub trait WorkloadApi: Send + Sync {
    /// Deployments in a cluster namespace, in listing order
    async fn list_deployments(&self, cluster: &str, namespace: &str) -> Result<Vec<DeploymentEntity>>;

    /// Number of pods linked to a deployment
    async fn pod_count(&self, deployment: &DeploymentEntity) -> Result<u64>;

    /// Min/max of a metric for one entity over the window
    async fn query_metric(&self, metric_key: &str, entity_id: &str, range: &TimeRange) -> Result<MetricRange>;

    /// Process groups carrying the deployment's JVM metrics, if any
    async fn resolve_heap_scope(&self, deployment: &DeploymentEntity) -> Result<Option<HeapScope>>;

    /// Heap min/max over a scope, trying each heap metric key in order
    async fn query_heap(&self, scope: &HeapScope, range: &TimeRange) -> Result<MetricRange>;
}

/// Selector for one or more entity ids: `entityId("a","b")`
pub fn entity_id_selector<S: AsRef<str>>(ids: &[S]) -> String {
    let quoted: Vec<String> = ids.iter().map(|id| format!("\"{}\"", id.as_ref())).collect();
    format!("entityId({})", quoted.join(","))
}
