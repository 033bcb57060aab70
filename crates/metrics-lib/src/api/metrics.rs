//! Metric queries and heap scope resolution

use tracing::{debug, info};

use super::client::{ApiClient, METRICS_QUERY_PATH};
use super::discovery::pods_of;
use super::entity_id_selector;
use super::types::MetricQueryResponse;
use crate::error::Result;
use crate::models::{
    DeploymentEntity, HeapScope, MetricRange, MetricSample, TimeRange, HEAP_METRIC_CANDIDATES,
};

/// Pods consulted when process groups are not linked to the deployment directly
const MAX_PODS_FOR_HEAP_LOOKUP: usize = 10;

/// Reduce a `<key>:min,<key>:max` query response to one range
pub fn range_from_response(response: &MetricQueryResponse) -> MetricRange {
    let mut min_samples: Vec<MetricSample> = Vec::new();
    let mut max_samples: Vec<MetricSample> = Vec::new();

    for collection in &response.result {
        let samples = collection.data.iter().flat_map(|series| series.samples());
        if collection.metric_id.ends_with(":min") {
            min_samples.extend(samples);
        } else if collection.metric_id.ends_with(":max") {
            max_samples.extend(samples);
        } else {
            let samples: Vec<MetricSample> = samples.collect();
            min_samples.extend(samples.iter().copied());
            max_samples.extend(samples);
        }
    }

    MetricRange::from_samples(&min_samples, &max_samples)
}

impl ApiClient {
    /// Min/max of a metric for one entity; `(0, 0)` when there are no data points
    pub async fn query_metric(&self, metric_key: &str, entity_id: &str, range: &TimeRange) -> Result<MetricRange> {
        let query = [
            ("metricSelector", format!("{key}:min,{key}:max", key = metric_key)),
            ("entitySelector", entity_id_selector(&[entity_id])),
            ("from", range.from_ms.to_string()),
            ("to", range.to_ms.to_string()),
            ("resolution", "1h".to_string()),
        ];

        let response: MetricQueryResponse = self.get(METRICS_QUERY_PATH, &query).await?;
        let result = range_from_response(&response);
        debug!(metric_key, entity_id, min = result.min, max = result.max, "Metric range");
        Ok(result)
    }

    /// Process groups linked to a deployment, directly or through its pods
    pub async fn resolve_heap_scope(&self, deployment: &DeploymentEntity) -> Result<Option<HeapScope>> {
        let direct = format!(
            "type(\"PROCESS_GROUP\"),fromRelationships.runsOn({})",
            entity_id_selector(&[&deployment.entity_id])
        );
        let mut groups = self.list_entities(&direct, Some("+properties")).await?;

        if groups.is_empty() {
            let pods = self.list_entities(&pods_of(&deployment.entity_id), None).await?;
            if !pods.is_empty() {
                let pod_ids: Vec<&str> = pods
                    .iter()
                    .take(MAX_PODS_FOR_HEAP_LOOKUP)
                    .map(|p| p.entity_id.as_str())
                    .collect();
                let via_pods = format!(
                    "type(\"PROCESS_GROUP\"),toRelationships.runsOn({})",
                    entity_id_selector(&pod_ids)
                );
                groups = self.list_entities(&via_pods, None).await?;
            }
        }

        if groups.is_empty() {
            info!(deployment = %deployment.display_name, "No process groups found for heap metrics");
            return Ok(None);
        }

        Ok(Some(HeapScope {
            process_group_ids: groups.into_iter().map(|g| g.entity_id).collect(),
        }))
    }

    /// Heap range over a scope
    ///
    /// Each candidate key is tried in order; the first one for which any
    /// process group reports data wins.
    pub async fn query_heap(&self, scope: &HeapScope, range: &TimeRange) -> Result<MetricRange> {
        for metric_key in HEAP_METRIC_CANDIDATES {
            let mut ranges = Vec::new();
            for group_id in &scope.process_group_ids {
                let group_range = self.query_metric(metric_key, group_id, range).await?;
                if group_range.has_data() {
                    ranges.push(group_range);
                }
            }

            if let Some(merged) = MetricRange::merge(ranges) {
                debug!(metric_key, "Heap metric resolved");
                return Ok(merged);
            }
            debug!(metric_key, "No heap data, trying next metric");
        }

        Ok(MetricRange::ZERO)
    }
}
