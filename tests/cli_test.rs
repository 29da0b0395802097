//! Integration tests for the apifactory CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("apifactory").unwrap();
    cmd.arg("--apis-dir").arg(fixtures().join("apis"));
    cmd
}

#[test]
fn test_list_command() {
    cli()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("drive"))
        .stdout(predicate::str::contains("youtubeAnalytics"));
}

#[test]
fn test_versions_command() {
    cli()
        .args(["versions", "drive"])
        .assert()
        .success()
        .stdout(predicate::str::contains("v2\nv3"));
}

#[test]
fn test_load_command() {
    cli()
        .args(["load", "drive", "v3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("API: drive"))
        .stdout(predicate::str::contains("Title: Drive API"))
        .stdout(predicate::str::contains("drive.files.get"));
}

#[test]
fn test_load_command_with_options() {
    cli()
        .args([
            "load",
            "storage",
            "v1",
            "--options",
            r#"{"rootUrl": "http://localhost:9000/"}"#,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Base URL: http://localhost:9000/storage/v1/",
        ));
}

#[test]
fn test_load_command_uses_embedded_documents_by_default() {
    Command::cargo_bin("apifactory")
        .unwrap()
        .args(["load", "gmail", "v1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("API: gmail"))
        .stdout(predicate::str::contains(
            "Base URL: https://www.googleapis.com/gmail/v1/",
        ));
}

#[test]
fn test_load_unknown_version_fails() {
    cli()
        .args(["load", "drive", "v999"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unable to load endpoint drive(\"v999\")"));
}

#[test]
fn test_load_unknown_api_fails() {
    cli()
        .args(["load", "notanapi", "v1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown API 'notanapi'"));
}

#[test]
fn test_discover_command() {
    cli()
        .arg("discover")
        .arg(fixtures().join("discovery/index.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("someapi: v1"))
        .stdout(predicate::str::contains("otherapi: v2"))
        .stdout(predicate::str::contains("Registered 2 API(s)"));
}

#[test]
fn test_inspect_command() {
    cli()
        .arg("inspect")
        .arg(fixtures().join("discovery/otherapi-v2.json"))
        .args(["--root-url", "http://localhost:7000/"])
        .assert()
        .success()
        .stdout(predicate::str::contains("API: otherapi"))
        .stdout(predicate::str::contains("Base URL: http://localhost:7000/"))
        .stdout(predicate::str::contains("otherapi.items.list"));
}
