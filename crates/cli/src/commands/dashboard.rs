//! Dashboard creation

use anyhow::{Context, Result};
use colored::Colorize;

use metrics_lib::dashboard::build_dashboard;
use metrics_lib::ApiClient;

use crate::output::{print_info, print_success, print_warning};

/// Create a dashboard with CPU, memory and optionally heap tiles per deployment
pub async fn create_dashboard(
    client: &ApiClient,
    cluster: &str,
    namespace: &str,
    include_heap: bool,
) -> Result<()> {
    let deployments = client
        .list_deployments(cluster, namespace)
        .await
        .context("Failed to list deployments")?;

    if deployments.is_empty() {
        print_warning(&format!(
            "No deployments found in cluster '{}' namespace '{}'; no dashboard created",
            cluster, namespace
        ));
        return Ok(());
    }

    let dashboard = build_dashboard(cluster, namespace, &deployments, include_heap);
    print_info(&format!(
        "Creating dashboard '{}' with {} tiles for {} deployments",
        dashboard.dashboard_metadata.name,
        dashboard.tiles.len(),
        deployments.len()
    ));

    let created = client
        .create_dashboard(&dashboard)
        .await
        .context("Failed to create dashboard")?;

    print_success(&format!("Dashboard created with ID {}", created.id.cyan()));
    println!("{}", client.dashboard_url(&created.id));

    Ok(())
}
