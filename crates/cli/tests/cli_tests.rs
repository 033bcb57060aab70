//! CLI integration tests

use std::path::Path;
use std::process::{Command, Output};

use mockito::{Matcher, Server};
use serde_json::json;

use metrics_lib::api::DiscoveryStrategy;
use metrics_lib::{CPU_USAGE_METRIC, MEMORY_USAGE_METRIC};

/// Command for the built binary with no ambient credentials, settings file or .env
fn dtm(settings_dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_dtm"));
    cmd.env_remove("DYNATRACE_URL")
        .env_remove("DYNATRACE_API_TOKEN")
        .env_remove("RUST_LOG")
        .env("DTM_CONFIG", settings_dir.join("config.toml"))
        .env("NO_COLOR", "1")
        .current_dir(settings_dir);
    cmd
}

fn run(cmd: &mut Command) -> Output {
    cmd.output().expect("Failed to execute command")
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(dtm(dir.path()).arg("--help"));
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("metrics"), "Should show metrics command");
    assert!(stdout.contains("dashboard"), "Should show dashboard command");
    assert!(stdout.contains("debug"), "Should show debug command");
    assert!(stdout.contains("DYNATRACE_URL"), "Should show URL env var");
    assert!(stdout.contains("DYNATRACE_API_TOKEN"), "Should show token env var");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(dtm(dir.path()).arg("--version"));
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("dtm"), "Should show binary name");
}

/// Test metrics subcommand help
#[test]
fn test_metrics_help() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(dtm(dir.path()).args(["metrics", "--help"]));
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Metrics help should succeed");
    for option in ["--cluster", "--namespace", "--hours", "--format", "--output", "--include-heap"] {
        assert!(stdout.contains(option), "Should show {} option", option);
    }
    assert!(stdout.contains("table"), "Should show table format");
    assert!(stdout.contains("json"), "Should show json format");
    assert!(stdout.contains("csv"), "Should show csv format");
}

/// Test dashboard subcommand help
#[test]
fn test_dashboard_help() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(dtm(dir.path()).args(["dashboard", "--help"]));
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Dashboard help should succeed");
    assert!(stdout.contains("--cluster"), "Should show cluster option");
    assert!(stdout.contains("--include-heap"), "Should show include-heap option");
}

/// Test debug entities subcommand help
#[test]
fn test_debug_entities_help() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(dtm(dir.path()).args(["debug", "entities", "--help"]));
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Debug entities help should succeed");
    assert!(stdout.contains("--entity-type"), "Should show entity-type option");
    assert!(stdout.contains("--limit"), "Should show limit option");
    assert!(stdout.contains("CLOUD_APPLICATION"), "Should show default type");
}

/// Test invalid command error handling
#[test]
fn test_invalid_command() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(dtm(dir.path()).arg("invalid-command"));

    assert!(!output.status.success(), "Invalid command should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error"), "Should show error message");
}

/// Test missing required argument error handling
#[test]
fn test_missing_argument() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(dtm(dir.path()).args(["metrics", "--cluster", "aks"]));

    assert_eq!(output.status.code(), Some(2), "Missing argument is a usage error");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--namespace"), "Should name the missing argument");
}

/// Test that missing credentials fail before any request
#[test]
fn test_missing_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(dtm(dir.path()).args(["metrics", "--cluster", "aks", "--namespace", "shop"]));

    assert_eq!(output.status.code(), Some(2), "Configuration errors exit with 2");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("DYNATRACE_URL"), "Should name the missing variable: {}", stderr);
}

/// Test that an invalid URL is a configuration error
#[test]
fn test_invalid_url() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(dtm(dir.path())
        .env("DYNATRACE_URL", "ftp://example.com")
        .env("DYNATRACE_API_TOKEN", "dt0c01.test")
        .args(["metrics", "--cluster", "aks", "--namespace", "shop"]));

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("http or https"), "Should explain the URL problem: {}", stderr);
}

/// Test that credentials can come from the settings file
#[test]
fn test_settings_file_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/api/v2/entityTypes")
        .match_query(Matcher::Any)
        .match_header("authorization", "Bearer file-token")
        .with_status(200)
        .with_body(json!({"types": ["HOST", "CLOUD_APPLICATION"]}).to_string())
        .create();

    std::fs::write(
        dir.path().join("config.toml"),
        format!(
            "url = \"{}\"\napi_token = \"file-token\"\nauth_scheme = \"bearer\"\n",
            server.url()
        ),
    )
    .unwrap();

    let output = run(dtm(dir.path()).args(["debug", "entity-types"]));
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("CLOUD_APPLICATION"));
    assert!(stdout.contains("HOST"));
    mock.assert();
}

fn mock_entity_types(server: &mut Server, authorization: &str) -> mockito::Mock {
    server
        .mock("GET", "/api/v2/entityTypes")
        .match_query(Matcher::Any)
        .match_header("authorization", authorization)
        .with_status(200)
        .with_body(json!({"types": ["CLOUD_APPLICATION"]}).to_string())
        .create()
}

/// Test that credentials are read from a .env file in the working directory
#[test]
fn test_dotenv_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = Server::new();
    let mock = mock_entity_types(&mut server, "Api-Token dt0c01.from-dotenv");

    std::fs::write(
        dir.path().join(".env"),
        format!(
            "DYNATRACE_URL={}\nDYNATRACE_API_TOKEN=dt0c01.from-dotenv\n",
            server.url()
        ),
    )
    .unwrap();

    let output = run(dtm(dir.path()).args(["debug", "entity-types"]));

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).contains("CLOUD_APPLICATION"));
    mock.assert();
}

/// Test that real environment variables take precedence over .env
#[test]
fn test_environment_wins_over_dotenv() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = Server::new();
    let mock = mock_entity_types(&mut server, "Api-Token dt0c01.from-env");

    std::fs::write(
        dir.path().join(".env"),
        format!(
            "DYNATRACE_URL={}\nDYNATRACE_API_TOKEN=dt0c01.from-dotenv\n",
            server.url()
        ),
    )
    .unwrap();

    let output = run(dtm(dir.path())
        .env("DYNATRACE_API_TOKEN", "dt0c01.from-env")
        .args(["debug", "entity-types"]));

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    mock.assert();
}

/// Test that a zero page size is rejected before any request
#[test]
fn test_debug_entities_rejects_zero_limit() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(dtm(dir.path()).args(["debug", "entities", "--limit", "0"]));

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--limit"), "stderr: {}", stderr);
}

fn mock_single_deployment(server: &mut Server) {
    server
        .mock("GET", "/api/v2/entities")
        .match_query(Matcher::UrlEncoded(
            "entitySelector".into(),
            DiscoveryStrategy::BracketedTags.selector("aks", "shop"),
        ))
        .with_status(200)
        .with_body(
            json!({
                "totalCount": 1,
                "entities": [{"entityId": "CLOUD_APPLICATION-1", "displayName": "cart"}]
            })
            .to_string(),
        )
        .create();

    server
        .mock("GET", "/api/v2/entities")
        .match_query(Matcher::UrlEncoded(
            "entitySelector".into(),
            "type(\"CLOUD_APPLICATION_INSTANCE\"),fromRelationships.isInstanceOf(entityId(\"CLOUD_APPLICATION-1\"))"
                .into(),
        ))
        .with_status(200)
        .with_body(json!({"totalCount": 2, "entities": []}).to_string())
        .create();

    for (metric_key, min, max) in [(CPU_USAGE_METRIC, 120.0, 480.0), (MEMORY_USAGE_METRIC, 1_048_576.0, 3_145_728.0)] {
        server
            .mock("GET", "/api/v2/metrics/query")
            .match_query(Matcher::UrlEncoded(
                "metricSelector".into(),
                format!("{0}:min,{0}:max", metric_key),
            ))
            .with_status(200)
            .with_body(
                json!({
                    "result": [
                        {"metricId": format!("{}:min", metric_key), "data": [{"timestamps": [0], "values": [min]}]},
                        {"metricId": format!("{}:max", metric_key), "data": [{"timestamps": [0], "values": [max]}]}
                    ]
                })
                .to_string(),
            )
            .create();
    }
}

/// Test a CSV report written to an explicit path
#[test]
fn test_metrics_csv_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = Server::new();
    mock_single_deployment(&mut server);
    let report_path = dir.path().join("report.csv");

    let output = run(dtm(dir.path())
        .env("DYNATRACE_URL", server.url())
        .env("DYNATRACE_API_TOKEN", "dt0c01.test")
        .args(["metrics", "--cluster", "aks", "--namespace", "shop", "--format", "csv", "-o"])
        .arg(&report_path));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "stderr: {}", stderr);
    assert!(stderr.contains("Time range:"), "Should print the collection window");

    let csv = std::fs::read_to_string(&report_path).unwrap();
    assert_eq!(
        csv,
        "cluster,deployment,cpu_usage_min,cpu_usage_max,memory_usage_min,memory_usage_max,number_of_pods\n\
         aks,cart,120,480,1048576,3145728,2\n"
    );
}

/// Test a table report on stdout
#[test]
fn test_metrics_table_on_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = Server::new();
    mock_single_deployment(&mut server);

    let output = run(dtm(dir.path())
        .env("DYNATRACE_URL", server.url())
        .env("DYNATRACE_API_TOKEN", "dt0c01.test")
        .args(["metrics", "--cluster", "aks", "--namespace", "shop"]));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("cart"));
    assert!(stdout.contains("120.00 millicores"));
    assert!(stdout.contains("480.00 millicores"));
    assert!(stdout.contains("1.00 MB"));
    assert!(stdout.contains("3.00 MB"));
    assert!(!stdout.contains("Time range:"), "Status lines belong on stderr");
}

/// Test that an authentication failure exits with 1
#[test]
fn test_auth_failure() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = Server::new();
    server
        .mock("GET", "/api/v2/entities")
        .match_query(Matcher::Any)
        .with_status(401)
        .with_body(json!({"error": {"code": 401, "message": "Token is missing required scope"}}).to_string())
        .create();

    let output = run(dtm(dir.path())
        .env("DYNATRACE_URL", server.url())
        .env("DYNATRACE_API_TOKEN", "dt0c01.bad")
        .args(["metrics", "--cluster", "aks", "--namespace", "shop"]));

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Authentication failed"), "stderr: {}", stderr);
    assert!(stderr.contains("401"));
}
