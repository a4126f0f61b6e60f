//! Shared test utilities for mpbio-cli integration tests.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;

/// Get a Command for the mpbio binary with a sandboxed home directory.
///
/// # Panics
///
/// Panics if the mpbio binary cannot be found.
#[allow(deprecated)]
pub fn mpbio_cmd(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("mpbio").expect("mpbio binary should exist");
    cmd.env("HOME", home)
        .env_remove("MPBIO_CONFIG")
        .env_remove("MPBIO_EXEMPLARS")
        .env("NO_COLOR", "1");
    cmd
}

/// Write `content` as a config file under `dir` and return its path.
pub fn write_config(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("config.yaml");
    fs::write(&path, content).expect("write config");
    path
}
