//! Dashboard definitions for deployment metrics
//!
//! One data-explorer tile per deployment per metric type, laid out
//! left to right on a four column grid.

use serde::{Deserialize, Serialize};

use crate::models::{DeploymentEntity, CPU_USAGE_METRIC, HEAP_METRIC_CANDIDATES, MEMORY_USAGE_METRIC};

const TILE_SIZE: u32 = 304;
const TILES_PER_ROW: u32 = 4;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub dashboard_metadata: DashboardMetadata,
    pub tiles: Vec<Tile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetadata {
    pub name: String,
    pub shared: bool,
    pub owner: String,
    pub sharing_details: SharingDetails,
    pub dashboard_filter: DashboardFilter,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharingDetails {
    pub link_shared: bool,
    pub published: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardFilter {
    pub timeframe: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tile {
    pub name: String,
    pub tile_type: String,
    pub configured: bool,
    pub bounds: Bounds,
    pub tile_filter: serde_json::Map<String, serde_json::Value>,
    pub custom_name: String,
    pub queries: Vec<TileQuery>,
    pub visual_config: VisualConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub top: u32,
    pub left: u32,
    pub width: u32,
    pub height: u32,
}

impl Bounds {
    /// Grid cell for the n-th tile
    pub fn for_slot(slot: u32) -> Self {
        Self {
            top: (slot / TILES_PER_ROW) * TILE_SIZE,
            left: (slot % TILES_PER_ROW) * TILE_SIZE,
            width: TILE_SIZE,
            height: TILE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileQuery {
    pub id: String,
    pub metric: String,
    pub space_aggregation: String,
    pub time_aggregation: String,
    pub split_by: Vec<String>,
    pub filter_by: FilterBy,
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterBy {
    pub filter_operator: String,
    pub nested_filters: Vec<FilterBy>,
    pub criteria: Vec<Criterion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Criterion {
    pub value: String,
    pub evaluator: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualConfig {
    #[serde(rename = "type")]
    pub chart_type: String,
    pub global: serde_json::Map<String, serde_json::Value>,
    pub rules: Vec<VisualRule>,
    pub axes: Axes,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualRule {
    pub matcher: String,
    pub properties: RuleProperties,
    pub series_overrides: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleProperties {
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Axes {
    pub x_axis: XAxis,
    pub y_axes: Vec<YAxis>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XAxis {
    pub display_name: String,
    pub visible: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YAxis {
    pub display_name: String,
    pub visible: bool,
    pub min: String,
    pub max: String,
    pub position: String,
    pub query_ids: Vec<String>,
}

/// Metric shown by a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileKind {
    Cpu,
    Memory,
    Heap,
}

impl TileKind {
    fn metric(self) -> &'static str {
        match self {
            TileKind::Cpu => CPU_USAGE_METRIC,
            TileKind::Memory => MEMORY_USAGE_METRIC,
            TileKind::Heap => HEAP_METRIC_CANDIDATES[0],
        }
    }

    fn short_label(self) -> &'static str {
        match self {
            TileKind::Cpu => "CPU",
            TileKind::Memory => "Memory",
            TileKind::Heap => "JVM Heap",
        }
    }

    fn long_label(self) -> &'static str {
        match self {
            TileKind::Cpu => "CPU Usage",
            TileKind::Memory => "Memory Usage",
            TileKind::Heap => "JVM Heap Memory",
        }
    }

    fn axis_label(self) -> &'static str {
        match self {
            TileKind::Cpu => "CPU (millicores)",
            TileKind::Memory => "Memory (bytes)",
            TileKind::Heap => "Heap Memory (bytes)",
        }
    }
}

/// Data-explorer tile for one deployment metric
pub fn build_tile(deployment: &DeploymentEntity, kind: TileKind, slot: u32) -> Tile {
    // Heap lives on process groups, so that tile splits instead of filtering
    let (split_by, criteria) = match kind {
        TileKind::Heap => (vec!["dt.entity.process_group".to_string()], Vec::new()),
        TileKind::Cpu | TileKind::Memory => (
            Vec::new(),
            vec![Criterion {
                value: deployment.entity_id.clone(),
                evaluator: "IN".to_string(),
            }],
        ),
    };

    Tile {
        name: format!("{} - {}", deployment.display_name, kind.short_label()),
        tile_type: "DATA_EXPLORER".to_string(),
        configured: true,
        bounds: Bounds::for_slot(slot),
        tile_filter: serde_json::Map::new(),
        custom_name: format!("{} - {}", deployment.display_name, kind.long_label()),
        queries: vec![TileQuery {
            id: "A".to_string(),
            metric: kind.metric().to_string(),
            space_aggregation: "AVG".to_string(),
            time_aggregation: "DEFAULT".to_string(),
            split_by,
            filter_by: FilterBy {
                filter_operator: "AND".to_string(),
                nested_filters: Vec::new(),
                criteria,
            },
            enabled: true,
        }],
        visual_config: VisualConfig {
            chart_type: "GRAPH_CHART".to_string(),
            global: serde_json::Map::new(),
            rules: vec![VisualRule {
                matcher: "A:".to_string(),
                properties: RuleProperties {
                    color: "DEFAULT".to_string(),
                },
                series_overrides: Vec::new(),
            }],
            axes: Axes {
                x_axis: XAxis {
                    display_name: String::new(),
                    visible: true,
                },
                y_axes: vec![YAxis {
                    display_name: kind.axis_label().to_string(),
                    visible: true,
                    min: "AUTO".to_string(),
                    max: "AUTO".to_string(),
                    position: "LEFT".to_string(),
                    query_ids: vec!["A".to_string()],
                }],
            },
        },
    }
}

/// Dashboard covering every deployment of a cluster namespace
pub fn build_dashboard(
    cluster: &str,
    namespace: &str,
    deployments: &[DeploymentEntity],
    include_heap: bool,
) -> Dashboard {
    let kinds: &[TileKind] = if include_heap {
        &[TileKind::Cpu, TileKind::Memory, TileKind::Heap]
    } else {
        &[TileKind::Cpu, TileKind::Memory]
    };

    let tiles = deployments
        .iter()
        .flat_map(|d| kinds.iter().map(move |kind| (d, *kind)))
        .enumerate()
        .map(|(slot, (deployment, kind))| build_tile(deployment, kind, slot as u32))
        .collect();

    Dashboard {
        dashboard_metadata: DashboardMetadata {
            name: format!("K8s Deployments - {}/{}", cluster, namespace),
            shared: true,
            owner: "Dynatrace API".to_string(),
            sharing_details: SharingDetails {
                link_shared: true,
                published: false,
            },
            dashboard_filter: DashboardFilter {
                timeframe: "-2h".to_string(),
            },
        },
        tiles,
    }
}
