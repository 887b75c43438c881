//! Integration tests for the `bundles` binary

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn bundles_cmd() -> Command {
    Command::cargo_bin("bundles").expect("Failed to find bundles binary")
}

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../test-fixtures/bundles")
        .join(name)
}

// ============================================================================
// resolve
// ============================================================================

#[test]
fn test_resolve_lists_workspace_plugins() {
    bundles_cmd()
        .arg("resolve")
        .arg(fixture("workspace.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Workspace plugins (ship 2.4)"))
        .stdout(predicate::str::contains("fleet.kotlin"))
        .stdout(predicate::str::contains("2.4.1"))
        .stdout(predicate::str::contains("fleet.legacy").not())
        .stdout(predicate::str::contains("fleet.android").not())
        .stdout(predicate::str::contains("fleet.preview").not());
}

#[test]
fn test_resolve_frontend_adds_frontend_section() {
    bundles_cmd()
        .arg("resolve")
        .arg(fixture("workspace.toml"))
        .arg("--frontend")
        .assert()
        .success()
        .stdout(predicate::str::contains("Frontend plugins"))
        .stdout(predicate::str::contains("fleet.preview"));
}

#[test]
fn test_resolve_reports_problems_as_warnings() {
    bundles_cmd()
        .arg("resolve")
        .arg(fixture("conflict.toml"))
        .assert()
        .success()
        .stderr(predicate::str::contains("plugin 'app.missing' not found"))
        .stderr(predicate::str::contains(
            "'app.tokenizer' requires app.text ^4.0, but app.text 3.0 was already taken",
        ));
}

#[test]
fn test_resolve_json_output() {
    let output = bundles_cmd()
        .arg("resolve")
        .arg(fixture("conflict.toml"))
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let problems = value["workspace"]["problems"].as_array().unwrap();
    assert_eq!(problems.len(), 2);
    assert_eq!(problems[0]["kind"], "plugin_not_found");
    assert_eq!(problems[1]["kind"], "conflict");
    assert_eq!(value["workspace"]["config"]["ship_version"], "3.0");
    assert!(value["frontend"].is_null());
}

#[test]
fn test_resolve_missing_manifest_fails() {
    bundles_cmd()
        .args(["resolve", "does-not-exist.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"))
        .stderr(predicate::str::contains("bundle manifest not found"));
}

#[test]
fn test_resolve_invalid_manifest_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bundles.toml");
    std::fs::write(&path, "ship_version = \"SNAPSHOT\"\n").unwrap();

    bundles_cmd()
        .arg("resolve")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse bundle manifest"));
}

// ============================================================================
// layers
// ============================================================================

#[test]
fn test_layers_sort_puts_dependencies_first() {
    bundles_cmd()
        .args(["layers", "sort", "frontendImpl", "commonApi"])
        .assert()
        .success()
        .stdout("commonApi\nfrontendImpl\n");
}

#[test]
fn test_layers_sort_skips_unknown_selectors() {
    bundles_cmd()
        .args(["layers", "sort", "backend", "workspaceApi"])
        .assert()
        .success()
        .stdout("workspaceApi\n")
        .stderr(predicate::str::contains("unknown layer selector: backend"));
}

#[test]
fn test_layers_sort_rejects_only_unknown_selectors() {
    bundles_cmd()
        .args(["layers", "sort", "backend"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no known layer selectors"));
}

#[test]
fn test_layers_dedupe_moves_shared_code() {
    let output = bundles_cmd()
        .args(["layers", "dedupe"])
        .arg(fixture("parts.json"))
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        value["common"]["modules"],
        serde_json::json!(["shared.text"])
    );
    assert_eq!(value["frontend"]["modules"], serde_json::json!(["editor"]));
    assert_eq!(value["workspace"]["modules"], serde_json::json!(["indexer"]));
    assert_eq!(
        value["commonApi"]["modules"],
        serde_json::json!(["api.common"])
    );
    assert_eq!(value["frontendApi"]["modules"], serde_json::json!(["api.ui"]));
}

#[test]
fn test_layers_dedupe_missing_file_fails() {
    bundles_cmd()
        .args(["layers", "dedupe", "nope.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("parts file not found"));
}
