//! CLI integration tests

use std::process::{Command, Output};
use tempfile::TempDir;

/// Run the binary with an isolated home directory and no colors
fn fleetctl(home: &TempDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_fleetctl"))
        .args(args)
        .env("HOME", home.path())
        .env("NO_COLOR", "1")
        .env_remove("FLEETCTL_API_URL")
        .output()
        .expect("Failed to execute command")
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let home = TempDir::new().unwrap();
    let output = fleetctl(&home, &["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(
        stdout.contains("fleet utilization scanner"),
        "Should show app description"
    );
    for command in ["report", "costs", "underutilized", "history"] {
        assert!(stdout.contains(command), "Should show {} command", command);
    }
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let home = TempDir::new().unwrap();
    let output = fleetctl(&home, &["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("fleetctl"), "Should show binary name");
}

/// Test costs subcommand help
#[test]
fn test_costs_help() {
    let home = TempDir::new().unwrap();
    let output = fleetctl(&home, &["costs", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("--top"), "Should show top option");
    assert!(stdout.contains("--region"), "Should show region option");
}

/// Test history subcommand requires a resource
#[test]
fn test_history_requires_resource_id() {
    let home = TempDir::new().unwrap();
    let output = fleetctl(&home, &["history"]);

    assert!(!output.status.success(), "History without an ID should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("RESOURCE_ID"));
}

/// Test report before the first cycle is a warning, not a failure
#[test]
fn test_report_before_first_cycle() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("GET", "/api/v1/report")
        .with_status(404)
        .with_body(r#"{"error":"No scan cycle completed yet"}"#)
        .create();

    let home = TempDir::new().unwrap();
    let output = fleetctl(&home, &["--api-url", &server.url(), "report"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("No scan cycle completed yet"));
}

/// Test JSON output round-trips the server response
#[test]
fn test_underutilized_json_output() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("GET", "/api/v1/underutilized")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"cycle_id":3,"report":"Underutilized resources (1)",
                "resources":[{"resource_id":"i-idle","region":"us-east-1",
                "resource_type":"m5.large","avg_cpu":2.0,"history_days_used":7,
                "monthly_forecast":35.04,"expensive":true}]}"#,
        )
        .create();

    let home = TempDir::new().unwrap();
    let output = fleetctl(
        &home,
        &["--api-url", &server.url(), "--format", "json", "underutilized"],
    );

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["resources"][0]["resource_id"], "i-idle");
    assert_eq!(json["resources"][0]["monthly_forecast"], 35.04);
}

/// Test the config file supplies the API URL
#[test]
fn test_api_url_from_config_file() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/api/v1/report")
        .with_status(404)
        .with_body(r#"{"error":"No scan cycle completed yet"}"#)
        .create();

    let home = TempDir::new().unwrap();
    let config_dir = home.path().join(".config").join("fleetctl");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("config.json"),
        format!(r#"{{"api_url": "{}"}}"#, server.url()),
    )
    .unwrap();

    let output = fleetctl(&home, &["report"]);

    assert!(output.status.success());
    mock.assert();
}

/// Test an unreachable scanner is an error
#[test]
fn test_unreachable_scanner_fails() {
    let home = TempDir::new().unwrap();
    let output = fleetctl(&home, &["--api-url", "http://127.0.0.1:1", "report"]);

    assert!(!output.status.success());
}
