//! Output formatting utilities
//!
//! Reports go to stdout or a file; status messages go to stderr.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use clap::ValueEnum;
use colored::Colorize;

use metrics_lib::report::ReportFormat;

/// Output format for the metrics report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
    /// CSV with raw values, written to a file
    Csv,
}

impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Table => ReportFormat::Table,
            OutputFormat::Json => ReportFormat::Json,
            OutputFormat::Csv => ReportFormat::Csv,
        }
    }
}

/// File name used for CSV output when none is given
pub fn csv_file_name(cluster: &str, namespace: &str, now: DateTime<Local>) -> String {
    format!(
        "deployment_metrics_{}_{}_{}.csv",
        cluster,
        namespace,
        now.format("%Y%m%d_%H%M%S")
    )
}

/// Where a rendered report goes; `None` means stdout
pub fn destination(
    format: OutputFormat,
    output: Option<PathBuf>,
    cluster: &str,
    namespace: &str,
) -> Option<PathBuf> {
    match (output, format) {
        (Some(path), _) => Some(path),
        (None, OutputFormat::Csv) => Some(PathBuf::from(csv_file_name(cluster, namespace, Local::now()))),
        (None, _) => None,
    }
}

/// Write a rendered report, adding a trailing newline if missing
pub fn write_report(path: &Path, contents: &str) -> Result<()> {
    let mut contents = contents.to_string();
    if !contents.ends_with('\n') {
        contents.push('\n');
    }
    std::fs::write(path, contents)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue().bold(), message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_csv_file_name() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(
            csv_file_name("aks-prod", "shop", now),
            "deployment_metrics_aks-prod_shop_20240309_070501.csv"
        );
    }

    #[test]
    fn test_destination() {
        assert_eq!(destination(OutputFormat::Table, None, "c", "n"), None);
        assert_eq!(destination(OutputFormat::Json, None, "c", "n"), None);
        assert_eq!(
            destination(OutputFormat::Json, Some("out.json".into()), "c", "n"),
            Some(PathBuf::from("out.json"))
        );

        let csv = destination(OutputFormat::Csv, None, "c", "n").unwrap();
        let name = csv.to_string_lossy();
        assert!(name.starts_with("deployment_metrics_c_n_"));
        assert!(name.ends_with(".csv"));
    }

    #[test]
    fn test_write_report_appends_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");

        write_report(&path, "a,b\n1,2").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a,b\n1,2\n");
    }

    #[test]
    fn test_write_report_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("report.csv");

        let err = write_report(&path, "x").unwrap_err();
        assert!(err.to_string().contains("Failed to write report"));
    }
}
