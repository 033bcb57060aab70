// Wire types for the Dynatrace API v2 and config v1 endpoints

use serde::{Deserialize, Serialize};

use crate::models::{EntityTag, MetricSample};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitiesResponse {
    #[serde(default)]
    pub total_count: Option<u64>,
    #[serde(default)]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub next_page_key: Option<String>,
    #[serde(default)]
    pub entities: Vec<Entity>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub entity_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default, rename = "type")]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub tags: Vec<EntityTag>,
    #[serde(default)]
    pub properties: Option<serde_json::Map<String, serde_json::Value>>,
}

impl Entity {
    /// Value of the first Kubernetes tag named `name`
    pub fn kubernetes_tag(&self, name: &str) -> Option<String> {
        self.tags
            .iter()
            .find(|t| t.is_kubernetes_key(name))
            .and_then(EntityTag::tag_value)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricQueryResponse {
    #[serde(default)]
    pub total_count: Option<u64>,
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub result: Vec<MetricSeriesCollection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSeriesCollection {
    pub metric_id: String,
    #[serde(default)]
    pub data: Vec<MetricSeries>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSeries {
    #[serde(default)]
    pub dimensions: Vec<String>,
    #[serde(default)]
    pub timestamps: Vec<i64>,
    #[serde(default)]
    pub values: Vec<Option<f64>>,
}

impl MetricSeries {
    /// Non-null points of the series
    pub fn samples(&self) -> impl Iterator<Item = MetricSample> + '_ {
        self.timestamps
            .iter()
            .zip(self.values.iter())
            .filter_map(|(ts, v)| v.map(|value| MetricSample { timestamp: *ts, value }))
    }
}

/// Entity type listings come back either as bare names or as descriptors
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityTypeEntry {
    Name(String),
    Descriptor {
        #[serde(rename = "type")]
        type_name: String,
        #[serde(default, rename = "displayName")]
        display_name: Option<String>,
    },
}

impl EntityTypeEntry {
    pub fn type_name(&self) -> &str {
        match self {
            EntityTypeEntry::Name(name) => name,
            EntityTypeEntry::Descriptor { type_name, .. } => type_name,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityTypesResponse {
    #[serde(default)]
    pub total_count: Option<u64>,
    #[serde(default)]
    pub next_page_key: Option<String>,
    #[serde(default)]
    pub types: Vec<EntityTypeEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardCreated {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ApiErrorEnvelope {
    pub error: Option<ApiErrorBody>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}
