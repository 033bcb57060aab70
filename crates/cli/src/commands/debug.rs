//! Debug and troubleshooting CLI commands

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use colored::Colorize;
use tabled::Tabled;

use metrics_lib::api::Entity;
use metrics_lib::ApiClient;

use crate::output::{print_info, print_warning};

const KUBERNETES_TYPE_MARKERS: &[&str] = &["CLOUD", "KUBERNETES", "WORKLOAD", "K8S"];

/// Row for the entities table
#[derive(Tabled)]
struct EntityRow {
    #[tabled(rename = "Entity ID")]
    entity_id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    entity_type: String,
    #[tabled(rename = "Tags")]
    tags: String,
}

impl From<&Entity> for EntityRow {
    fn from(entity: &Entity) -> Self {
        let tags = entity
            .tags
            .iter()
            .map(|t| t.string_representation.clone().unwrap_or_else(|| t.key.clone()))
            .collect::<Vec<_>>()
            .join("\n");
        Self {
            entity_id: entity.entity_id.clone(),
            name: entity.display_name.clone().unwrap_or_default(),
            entity_type: entity.entity_type.clone().unwrap_or_default(),
            tags,
        }
    }
}

/// Whether an entity type relates to Kubernetes or cloud workloads
pub fn is_kubernetes_type(name: &str) -> bool {
    let upper = name.to_ascii_uppercase();
    KUBERNETES_TYPE_MARKERS.iter().any(|m| upper.contains(m))
}

/// Selector for `debug entities`, narrowed by the standard Kubernetes tags
pub fn entity_selector(entity_type: &str, cluster: Option<&str>, namespace: Option<&str>) -> String {
    let mut selector = format!("type(\"{}\")", entity_type);
    if let Some(cluster) = cluster {
        selector.push_str(&format!(",tag(\"[Kubernetes]cluster:{}\")", cluster));
    }
    if let Some(namespace) = namespace {
        selector.push_str(&format!(",tag(\"[Kubernetes]namespace:{}\")", namespace));
    }
    selector
}

/// List all entity types, highlighting Kubernetes related ones
pub async fn show_entity_types(client: &ApiClient) -> Result<()> {
    let mut types = client
        .entity_types()
        .await
        .context("Failed to fetch entity types")?;
    types.sort();

    println!("{}", "Entity Types".bold());
    println!("{}", "=".repeat(50));
    for name in &types {
        if is_kubernetes_type(name) {
            println!("  {}", name.green().bold());
        } else {
            println!("  {}", name);
        }
    }

    let kubernetes = types.iter().filter(|t| is_kubernetes_type(t)).count();
    println!("\nTotal: {} types ({} Kubernetes related)", types.len(), kubernetes);
    Ok(())
}

/// Show entities of a type with their tags
pub async fn show_entities(
    client: &ApiClient,
    entity_type: &str,
    cluster: Option<&str>,
    namespace: Option<&str>,
    limit: u32,
) -> Result<()> {
    let selector = entity_selector(entity_type, cluster, namespace);
    print_info(&format!("Entity selector: {}", selector));

    let page = client
        .entities_page(&selector, Some("+tags,+properties"), limit)
        .await
        .context("Failed to query entities")?;

    if page.entities.is_empty() {
        print_warning(&format!("No {} entities found", entity_type));
        return Ok(());
    }

    let rows: Vec<EntityRow> = page.entities.iter().map(EntityRow::from).collect();
    let table = tabled::Table::new(rows)
        .with(tabled::settings::Style::rounded())
        .to_string();
    println!("{}", table);

    match page.total_count {
        Some(total) => println!("\nShowing {} of {} entities", page.entities.len(), total),
        None => println!("\nShowing {} entities", page.entities.len()),
    }

    let summary = tag_summary(&page.entities);
    println!();
    println!("{}", "Kubernetes Tags".bold());
    println!("{}", "-".repeat(50));
    println!("Clusters:   {}", join_or_none(&summary.clusters).cyan());
    println!("Namespaces: {}", join_or_none(&summary.namespaces).cyan());
    println!();
    println!("{}", "Tag Keys".bold());
    println!("{}", "-".repeat(50));
    if summary.tag_keys.is_empty() {
        println!("  (none)");
    }
    for key in &summary.tag_keys {
        println!("  {}", key);
    }

    Ok(())
}

/// Distinct tag values and keys seen across a set of entities
#[derive(Debug, Default)]
pub struct TagSummary {
    pub clusters: BTreeSet<String>,
    pub namespaces: BTreeSet<String>,
    /// Every tag key, including non-standard spellings of the Kubernetes tags
    pub tag_keys: BTreeSet<String>,
}

pub fn tag_summary(entities: &[Entity]) -> TagSummary {
    TagSummary {
        clusters: entities.iter().filter_map(|e| e.kubernetes_tag("cluster")).collect(),
        namespaces: entities.iter().filter_map(|e| e.kubernetes_tag("namespace")).collect(),
        tag_keys: entities
            .iter()
            .flat_map(|e| e.tags.iter().map(|t| t.key.clone()))
            .collect(),
    }
}

fn join_or_none(values: &BTreeSet<String>) -> String {
    if values.is_empty() {
        "(none)".to_string()
    } else {
        values.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}
