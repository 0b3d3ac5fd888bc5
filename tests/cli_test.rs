//! Smoke tests for the `muninn` binary.
//!
//! Every run gets its own config file and cache directory so nothing
//! touches the user's home or the network.

#![cfg(feature = "cli")]

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

/// Write a config that keeps snapshots inside `dir` and disables Yahoo.
fn write_config(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("config.toml");
    let cache_dir = dir.join("cache");
    std::fs::write(
        &path,
        format!(
            "[cache]\ndir = '{}'\n\n[providers.yahoo]\nenabled = false\n",
            cache_dir.display()
        ),
    )
    .unwrap();
    path
}

#[allow(deprecated)]
fn cli(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("muninn").unwrap();
    cmd.env_remove("MUNINN_MODE")
        .arg("--config")
        .arg(write_config(dir.path()));
    cmd
}

#[test]
fn help_lists_commands() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("resolve"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("clear-cache"));
}

#[test]
fn resolve_mock_json_prints_success() {
    let dir = TempDir::new().unwrap();
    let output = cli(&dir)
        .args(["--mode", "mock", "resolve", "google", "--json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).expect("JSON on stdout");
    assert_eq!(json["type"], "success");
    assert_eq!(json["symbol"], "ACME");
    assert_eq!(json["source"], "Mock");
    assert_eq!(json["from_cache"], false);
}

#[test]
fn resolve_mock_plain_text() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .args(["--mode", "mock", "resolve", "gogle"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("ACME  ACME Corp"))
        .stdout(predicate::str::contains("source: Mock"));
}

#[test]
fn unknown_query_exits_with_failure() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .args(["--mode", "mock", "resolve", "unknowncorp"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("UNKNOWNCORP"));
}

#[test]
fn status_reports_mode_as_json() {
    let dir = TempDir::new().unwrap();
    let output = cli(&dir).args(["--mode", "mock", "status"]).output().unwrap();

    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["mode"], "mock");
    assert_eq!(json["providers"].as_array().map(Vec::len), Some(0));
}

#[test]
fn clear_cache_writes_empty_snapshots() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .args(["--mode", "mock", "clear-cache"])
        .assert()
        .success()
        .stdout(predicate::str::contains("caches cleared"));

    assert!(dir.path().join("cache/ticker_name_to_symbol.json").exists());
    assert!(dir.path().join("cache/ticker_symbol_to_name.json").exists());
}

#[test]
fn invalid_mode_is_rejected() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .args(["--mode", "paper", "status"])
        .assert()
        .failure();
}
