//! Deployment discovery
//!
//! Environments tag Kubernetes workloads differently, so discovery walks an
//! ordered list of selector strategies and keeps the first that returns
//! anything. Strategies that cannot filter on the namespace server-side
//! filter the returned entities on their tags instead.

use tracing::{debug, info, warn};

use super::client::ApiClient;
use super::types::Entity;
use crate::error::{MetricsError, Result};
use crate::models::DeploymentEntity;

const DEPLOYMENT_ENTITY_TYPE: &str = "CLOUD_APPLICATION";
const ENTITY_FIELDS: &str = "+properties,+tags";

/// How deployments are located for a cluster namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryStrategy {
    /// `[Kubernetes]cluster` and `[Kubernetes]namespace` tags
    BracketedTags,
    /// `Kubernetes:cluster` and `Kubernetes:namespace` tags
    PlainTags,
    /// Cluster tag only; namespace filtered locally
    ClusterOnly,
    /// Every deployment entity; namespace filtered locally
    Unfiltered,
}

/// Strategies in the order they are tried
pub const DISCOVERY_STRATEGIES: &[DiscoveryStrategy] = &[
    DiscoveryStrategy::BracketedTags,
    DiscoveryStrategy::PlainTags,
    DiscoveryStrategy::ClusterOnly,
    DiscoveryStrategy::Unfiltered,
];

impl DiscoveryStrategy {
    /// Entity selector sent for this strategy
    pub fn selector(self, cluster: &str, namespace: &str) -> String {
        let base = format!("type(\"{}\")", DEPLOYMENT_ENTITY_TYPE);
        match self {
            DiscoveryStrategy::BracketedTags => format!(
                "{},tag(\"[Kubernetes]cluster:{}\"),tag(\"[Kubernetes]namespace:{}\")",
                base, cluster, namespace
            ),
            DiscoveryStrategy::PlainTags => format!(
                "{},tag(\"Kubernetes:cluster:{}\"),tag(\"Kubernetes:namespace:{}\")",
                base, cluster, namespace
            ),
            DiscoveryStrategy::ClusterOnly => {
                format!("{},tag(\"[Kubernetes]cluster:{}\")", base, cluster)
            }
            DiscoveryStrategy::Unfiltered => base,
        }
    }

    /// Whether the namespace still has to be checked on the returned entities
    pub fn filters_locally(self) -> bool {
        matches!(self, DiscoveryStrategy::ClusterOnly | DiscoveryStrategy::Unfiltered)
    }

    pub fn describe(self) -> &'static str {
        match self {
            DiscoveryStrategy::BracketedTags => "[Kubernetes]cluster and [Kubernetes]namespace tags",
            DiscoveryStrategy::PlainTags => "Kubernetes:cluster and Kubernetes:namespace tags",
            DiscoveryStrategy::ClusterOnly => "cluster tag only, namespace filtered locally",
            DiscoveryStrategy::Unfiltered => "all deployments, namespace filtered locally",
        }
    }
}

/// Whether an entity carries a namespace tag equal to `namespace`
pub fn matches_namespace(entity: &Entity, namespace: &str) -> bool {
    entity
        .tags
        .iter()
        .filter(|t| t.is_kubernetes_key("namespace"))
        .any(|t| t.tag_value().as_deref() == Some(namespace))
}

fn to_deployment(entity: Entity, cluster: &str, namespace: &str) -> DeploymentEntity {
    let tagged_namespace = entity.kubernetes_tag("namespace");
    let tagged_cluster = entity.kubernetes_tag("cluster");
    DeploymentEntity {
        display_name: entity
            .display_name
            .clone()
            .unwrap_or_else(|| entity.entity_id.clone()),
        namespace: tagged_namespace.unwrap_or_else(|| namespace.to_string()),
        cluster: tagged_cluster.unwrap_or_else(|| cluster.to_string()),
        entity_id: entity.entity_id,
    }
}

impl ApiClient {
    /// Deployments in a cluster namespace, in the order the API lists them
    ///
    /// An empty list means no strategy matched anything; it is not an error.
    pub async fn list_deployments(&self, cluster: &str, namespace: &str) -> Result<Vec<DeploymentEntity>> {
        for strategy in DISCOVERY_STRATEGIES {
            debug!(strategy = strategy.describe(), "Trying discovery strategy");
            let selector = strategy.selector(cluster, namespace);

            let mut entities = match self.list_entities(&selector, Some(ENTITY_FIELDS)).await {
                Ok(entities) => entities,
                // The environment does not understand this selector
                Err(MetricsError::Api { status: 400 | 404, message, .. }) => {
                    debug!(strategy = strategy.describe(), %message, "Selector rejected");
                    continue;
                }
                Err(e) => return Err(e),
            };

            if strategy.filters_locally() {
                entities.retain(|e| matches_namespace(e, namespace));
            }

            if !entities.is_empty() {
                info!(
                    count = entities.len(),
                    strategy = strategy.describe(),
                    "Discovered deployments"
                );
                return Ok(entities
                    .into_iter()
                    .map(|e| to_deployment(e, cluster, namespace))
                    .collect());
            }
        }

        warn!(cluster, namespace, "No deployments found with any discovery strategy");
        Ok(Vec::new())
    }

    /// Number of pods linked to a deployment
    pub async fn pod_count(&self, deployment: &DeploymentEntity) -> Result<u64> {
        self.count_entities(&pods_of(&deployment.entity_id)).await
    }
}

/// Selector for the pods that are instances of a deployment
pub(crate) fn pods_of(deployment_id: &str) -> String {
    format!(
        "type(\"CLOUD_APPLICATION_INSTANCE\"),fromRelationships.isInstanceOf(entityId(\"{}\"))",
        deployment_id
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntityTag;

    fn entity_with_namespace(id: &str, namespace: &str) -> Entity {
        Entity {
            entity_id: id.to_string(),
            display_name: Some(id.to_lowercase()),
            tags: vec![EntityTag {
                context: Some("CONTEXTLESS".into()),
                key: "[Kubernetes]namespace".into(),
                value: Some(namespace.into()),
                string_representation: Some(format!("[Kubernetes]namespace:{}", namespace)),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_strategy_selectors() {
        assert_eq!(
            DiscoveryStrategy::BracketedTags.selector("aks", "shop"),
            r#"type("CLOUD_APPLICATION"),tag("[Kubernetes]cluster:aks"),tag("[Kubernetes]namespace:shop")"#
        );
        assert_eq!(
            DiscoveryStrategy::PlainTags.selector("aks", "shop"),
            r#"type("CLOUD_APPLICATION"),tag("Kubernetes:cluster:aks"),tag("Kubernetes:namespace:shop")"#
        );
        assert_eq!(
            DiscoveryStrategy::ClusterOnly.selector("aks", "shop"),
            r#"type("CLOUD_APPLICATION"),tag("[Kubernetes]cluster:aks")"#
        );
        assert_eq!(
            DiscoveryStrategy::Unfiltered.selector("aks", "shop"),
            r#"type("CLOUD_APPLICATION")"#
        );
    }

    #[test]
    fn test_namespace_match_is_exact() {
        let entity = entity_with_namespace("CLOUD_APPLICATION-1", "production");
        assert!(matches_namespace(&entity, "production"));
        assert!(!matches_namespace(&entity, "prod"));
    }

    #[test]
    fn test_deployment_falls_back_to_requested_scope() {
        let entity = Entity {
            entity_id: "CLOUD_APPLICATION-9".into(),
            ..Default::default()
        };
        let deployment = to_deployment(entity, "aks", "shop");
        assert_eq!(deployment.display_name, "CLOUD_APPLICATION-9");
        assert_eq!(deployment.cluster, "aks");
        assert_eq!(deployment.namespace, "shop");
    }

    #[test]
    fn test_pods_selector() {
        assert_eq!(
            pods_of("CLOUD_APPLICATION-1"),
            r#"type("CLOUD_APPLICATION_INSTANCE"),fromRelationships.isInstanceOf(entityId("CLOUD_APPLICATION-1"))"#
        );
    }
}
