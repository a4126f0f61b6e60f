//! Integration tests for argument handling and the `mpbio config` commands.
//!
//! None of these reach the network.

mod common;

use predicates::prelude::*;
use tempfile::TempDir;

use common::{mpbio_cmd, write_config};

#[test]
fn test_help_lists_commands() {
    let home = TempDir::new().expect("create temp dir");
    mpbio_cmd(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("resolve"))
        .stdout(predicate::str::contains("evidence"))
        .stdout(predicate::str::contains("search"))
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_version_flag() {
    let home = TempDir::new().expect("create temp dir");
    mpbio_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("mpbio "));
}

#[test]
fn test_config_path_uses_explicit_file() {
    let home = TempDir::new().expect("create temp dir");
    let path = home.path().join("custom.yaml");
    mpbio_cmd(home.path())
        .args(["config", "path", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("custom.yaml"));
}

#[test]
fn test_config_path_defaults_to_home() {
    let home = TempDir::new().expect("create temp dir");
    mpbio_cmd(home.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(".mpbio"))
        .stdout(predicate::str::contains("config.yaml"));
}

#[test]
fn test_config_validate_valid_file() {
    let home = TempDir::new().expect("create temp dir");
    let path = write_config(home.path(), "search:\n  result_cap: 12\n");
    mpbio_cmd(home.path())
        .args(["config", "validate", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"));
}

#[test]
fn test_config_validate_rejects_bad_threshold() {
    let home = TempDir::new().expect("create temp dir");
    let path = write_config(home.path(), "resolver:\n  auto_select_threshold: 1.5\n");
    mpbio_cmd(home.path())
        .args(["config", "validate", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("auto_select_threshold"));
}

#[test]
fn test_config_rejects_unparseable_yaml() {
    let home = TempDir::new().expect("create temp dir");
    let path = write_config(home.path(), "search: [unclosed\n");
    mpbio_cmd(home.path())
        .args(["config", "show", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}

#[test]
fn test_config_show_json_merges_defaults() {
    let home = TempDir::new().expect("create temp dir");
    let path = write_config(home.path(), "search:\n  result_cap: 12\n");
    let output = mpbio_cmd(home.path())
        .args(["config", "show", "--json", "--config"])
        .arg(&path)
        .output()
        .expect("run mpbio");
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(json["search"]["result_cap"], 12);
    assert_eq!(json["archive"]["web_url"], "https://hansard.parliament.uk");
}

#[test]
fn test_config_env_var() {
    let home = TempDir::new().expect("create temp dir");
    let path = write_config(home.path(), "search:\n  window_months: 6\n");
    let output = mpbio_cmd(home.path())
        .env("MPBIO_CONFIG", &path)
        .args(["config", "show", "--json"])
        .output()
        .expect("run mpbio");
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(json["search"]["window_months"], 6);
}

#[test]
fn test_search_requires_topic() {
    let home = TempDir::new().expect("create temp dir");
    mpbio_cmd(home.path())
        .args(["search", "Jane Doe"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--topic"));
}

#[test]
fn test_notes_conflict_with_notes_file() {
    let home = TempDir::new().expect("create temp dir");
    mpbio_cmd(home.path())
        .args(["evidence", "Jane Doe", "--notes", "x", "--notes-file", "notes.txt"])
        .assert()
        .failure();
}
