//! Integration tests for failures caught before or at the first remote call.
//!
//! Remote endpoints point at a closed local port so nothing leaves the machine.

mod common;

use predicates::prelude::*;
use tempfile::TempDir;

use common::{mpbio_cmd, write_config};

const OFFLINE_CONFIG: &str = "\
http:
  timeout_secs: 2
roster:
  api_url: http://127.0.0.1:9
encyclopedia:
  api_url: http://127.0.0.1:9/w/api.php
archive:
  api_url: http://127.0.0.1:9
generator:
  api_url: http://127.0.0.1:9/v1/messages
";

#[test]
fn test_resolve_reports_roster_failure() {
    let home = TempDir::new().expect("create temp dir");
    let path = write_config(home.path(), OFFLINE_CONFIG);
    mpbio_cmd(home.path())
        .args(["resolve", "Jane Doe", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("search error"));
}

#[test]
fn test_generate_rejects_missing_exemplars_dir() {
    let home = TempDir::new().expect("create temp dir");
    let path = write_config(home.path(), OFFLINE_CONFIG);
    let missing = home.path().join("no-such-dir");
    mpbio_cmd(home.path())
        .args(["generate", "Jane Doe", "--no-save", "--config"])
        .arg(&path)
        .arg("--exemplars")
        .arg(&missing)
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_search_rejects_bad_date() {
    let home = TempDir::new().expect("create temp dir");
    let path = write_config(home.path(), OFFLINE_CONFIG);
    mpbio_cmd(home.path())
        .args(["search", "Jane Doe", "--topic", "housing", "--from", "2025-13-01", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid date"));
}

#[test]
fn test_generate_rejects_reversed_window() {
    let home = TempDir::new().expect("create temp dir");
    let path = write_config(home.path(), OFFLINE_CONFIG);
    mpbio_cmd(home.path())
        .args([
            "generate", "Jane Doe", "--no-save", "--from", "2025-06-01", "--to", "2025-01-01",
            "--config",
        ])
        .arg(&path)
        .assert()
        .failure();
}

#[test]
fn test_evidence_reports_unreadable_pdf_notes() {
    let home = TempDir::new().expect("create temp dir");
    let path = write_config(home.path(), OFFLINE_CONFIG);
    let brief = home.path().join("brief.pdf");
    std::fs::write(&brief, "not a PDF at all").expect("write brief");
    mpbio_cmd(home.path())
        .args(["evidence", "Jane Doe", "--config"])
        .arg(&path)
        .arg("--notes-file")
        .arg(&brief)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not extract text from PDF"));
}
