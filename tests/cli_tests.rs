//! CLI tests for junos-provider
//!
//! This test suite covers the commands that work without a device:
//! - Argument parsing and help output
//! - Listing resources and printing schemas
//! - Validating JSON and YAML documents
//! - Planning set lines, with and without a prior state
//! - Exit codes and diagnostics on stderr
//! - Configuration errors

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::{tempdir, NamedTempFile};

// Helper to get a command for testing, isolated from user configuration
fn junos_cmd() -> Command {
    let mut cmd = Command::cargo_bin("junos-provider").unwrap();
    cmd.env_remove("JUNOS_PROVIDER_CONFIG")
        .env_remove("JUNOS_HOST")
        .env("NO_COLOR", "1")
        .env("RUST_LOG", "error");
    cmd
}

// Helper to write a document with the given extension
fn document(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    write!(file, "{}", content).unwrap();
    file
}

// ============================================================================
// Basic Commands
// ============================================================================

#[test]
fn test_help() {
    junos_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("import"));
}

#[test]
fn test_version() {
    junos_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("junos-provider"));
}

#[test]
fn test_missing_subcommand() {
    junos_cmd().assert().failure();
}

#[test]
fn test_resources_lists_types() {
    junos_cmd()
        .arg("resources")
        .assert()
        .success()
        .stdout(predicate::str::contains("junos_application\n"))
        .stdout(predicate::str::contains("junos_vlan\n"));
}

#[test]
fn test_resources_json() {
    let output = junos_cmd()
        .args(["resources", "--output", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let names: Vec<String> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(names.len(), 10);
    assert!(names.contains(&"junos_security_address_book".to_string()));
}

#[test]
fn test_schema() {
    let output = junos_cmd()
        .args(["schema", "junos_static_route", "--output", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let schema: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(schema["attributes"]["destination"].is_object());
    assert!(schema["blocks"]["qualified_next_hop"].is_object());
}

#[test]
fn test_schema_unknown_type() {
    junos_cmd()
        .args(["schema", "junos_interface"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("junos_interface"));
}

// ============================================================================
// Validate
// ============================================================================

#[test]
fn test_validate_valid_yaml() {
    let doc = document(".yaml", "name: v100\nvlan_id: 100\n");
    junos_cmd()
        .arg("validate")
        .arg("junos_vlan")
        .arg(doc.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("is a valid junos_vlan"));
}

#[test]
fn test_validate_invalid_document() {
    let doc = document(".json", r#"{"name": "v100", "vlan_id": 5000}"#);
    junos_cmd()
        .arg("validate")
        .arg("junos_vlan")
        .arg(doc.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error: Invalid Attribute Value (vlan_id)"));
}

#[test]
fn test_validate_unknown_attribute() {
    let doc = document(".json", r#"{"name": "v100", "vlan": 10}"#);
    junos_cmd()
        .arg("validate")
        .arg("junos_vlan")
        .arg(doc.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unsupported Attribute (vlan)"));
}

#[test]
fn test_validate_json_diagnostics() {
    let doc = document(
        ".json",
        r#"{"destination": "192.0.2.0/24", "discard": true, "reject": true}"#,
    );
    let output = junos_cmd()
        .args(["validate", "junos_static_route"])
        .arg(doc.path())
        .args(["--output", "json"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8(output.stderr).unwrap();
    let first = stderr.lines().next().unwrap();
    let diag: serde_json::Value = serde_json::from_str(first).unwrap();
    assert_eq!(diag["severity"], "error");
}

#[test]
fn test_validate_missing_file() {
    junos_cmd()
        .args(["validate", "junos_vlan", "/nonexistent/vlan.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read document"));
}

// ============================================================================
// Plan
// ============================================================================

#[test]
fn test_plan_prints_set_lines() {
    let doc = document(".json", r#"{"name": "v100", "vlan_id": 100}"#);
    junos_cmd()
        .arg("plan")
        .arg("junos_vlan")
        .arg(doc.path())
        .assert()
        .success()
        .stdout("set vlans v100\nset vlans v100 vlan-id 100\n");
}

#[test]
fn test_plan_diff_against_state() {
    let state = document(".json", r#"{"id": "v100", "name": "v100", "vlan_id": 100}"#);
    let plan = document(".yaml", "name: v100\nvlan_id: 200\n");
    junos_cmd()
        .arg("plan")
        .arg("junos_vlan")
        .arg(plan.path())
        .arg("--state")
        .arg(state.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("  set vlans v100\n"))
        .stdout(predicate::str::contains("- set vlans v100 vlan-id 100\n"))
        .stdout(predicate::str::contains("+ set vlans v100 vlan-id 200\n"));
}

#[test]
fn test_plan_diff_json() {
    let state = document(".json", r#"{"name": "r1", "community": "c1", "next_hop": ["10.0.0.1"]}"#);
    let plan = document(".json", r#"{"destination": "192.0.2.0/24", "next_hop": ["10.0.0.2"]}"#);
    // the state is not a valid static route
    junos_cmd()
        .args(["plan", "junos_static_route"])
        .arg(plan.path())
        .arg("--state")
        .arg(state.path())
        .assert()
        .code(1);

    let state = document(
        ".json",
        r#"{"destination": "192.0.2.0/24", "next_hop": ["10.0.0.1"]}"#,
    );
    let output = junos_cmd()
        .args(["plan", "junos_static_route", "--output", "json"])
        .arg(plan.path())
        .arg("--state")
        .arg(state.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let diff: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        diff["remove"],
        serde_json::json!(["set routing-options static route 192.0.2.0/24 next-hop 10.0.0.1"])
    );
    assert_eq!(
        diff["add"],
        serde_json::json!(["set routing-options static route 192.0.2.0/24 next-hop 10.0.0.2"])
    );
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_missing_config_file() {
    junos_cmd()
        .args(["--config", "/nonexistent/junos.toml", "resources"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration file not found"));
}

#[test]
fn test_device_command_requires_host() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("junos.toml");
    std::fs::write(&config, "port = 830\n").unwrap();
    let doc = document(".json", r#"{"name": "v100", "vlan_id": 100}"#);

    junos_cmd()
        .arg("--config")
        .arg(&config)
        .arg("create")
        .arg("junos_vlan")
        .arg(doc.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("host is required"));
}

#[test]
fn test_fake_create_without_device() {
    let dir = tempdir().unwrap();
    let setfile = dir.path().join("junos.set");
    let config = dir.path().join("junos.toml");
    std::fs::write(
        &config,
        format!("fake_create_setfile = {:?}\n", setfile.display().to_string()),
    )
    .unwrap();
    let doc = document(".json", r#"{"name": "v100", "vlan_id": 100}"#);

    let output = junos_cmd()
        .arg("--config")
        .arg(&config)
        .args(["--output", "json", "create", "junos_vlan"])
        .arg(doc.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let state: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(state["id"], "v100");
    assert_eq!(
        std::fs::read_to_string(&setfile).unwrap(),
        "set vlans v100\nset vlans v100 vlan-id 100\n"
    );
}
