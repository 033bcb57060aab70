//! Deployment metrics report

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;

use metrics_lib::report::{self, render, CollectionReport, MetricsRequest};
use metrics_lib::{TimeRange, WorkloadApi};

use crate::output::{self, print_error, print_info, print_success, print_warning, OutputFormat};

/// Collect and print min/max usage for every deployment in a namespace
pub async fn show_metrics(
    api: &dyn WorkloadApi,
    request: MetricsRequest,
    format: OutputFormat,
    output_path: Option<PathBuf>,
) -> Result<()> {
    print_info(&format!(
        "Collecting metrics for {}/{} over the last {} hours",
        request.cluster.cyan(),
        request.namespace.cyan(),
        request.hours
    ));

    let report = report::collect(api, &request)
        .await
        .context("Failed to collect deployment metrics")?;

    if report.deployment_count() == 0 {
        print_warning(&format!(
            "No deployments found in cluster '{}' namespace '{}'",
            request.cluster, request.namespace
        ));
        return Ok(());
    }

    report_failures(&report);

    let rendered = render(&report.records, format.into(), request.include_heap)
        .context("Failed to render report")?;

    match output::destination(format, output_path, &request.cluster, &request.namespace) {
        Some(path) => {
            output::write_report(&path, &rendered)?;
            print_success(&format!(
                "Metrics for {} deployments written to {}",
                report.records.len(),
                path.display()
            ));
        }
        None => println!("{}", rendered),
    }

    print_info(&format!(
        "Time range: {} to {}",
        TimeRange::format_bound(report.time_range.from_ms),
        TimeRange::format_bound(report.time_range.to_ms)
    ));

    Ok(())
}

fn report_failures(report: &CollectionReport) {
    for failure in &report.failures {
        print_error(&format!("{}: {}", failure.deployment.bold(), failure.error));
    }
    if !report.failures.is_empty() {
        print_warning(&format!(
            "{} of {} deployments could not be collected",
            report.failures.len(),
            report.deployment_count()
        ));
    }
}
