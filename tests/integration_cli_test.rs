use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

mod common;

fn write_log(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn sso_metrics() -> Command {
    Command::cargo_bin("sso-metrics").unwrap()
}

#[test]
fn summary_json_reports_totals() {
    let dir = TempDir::new().unwrap();
    let log = write_log(&dir, "events.json", &common::as_array(&common::reference_dataset()));

    let output = sso_metrics()
        .arg(&log)
        .args(["summary", "--json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let parsed: Value = serde_json::from_slice(&output.stdout).unwrap();
    let summary = &parsed["summary"];
    assert_eq!(summary["totalRecords"], 3);
    assert_eq!(summary["totalUsers"], 1);
    assert_eq!(summary["totalApps"], 2);
    assert_eq!(summary["dateRange"]["min"], "2024-01-01");
    assert_eq!(summary["dateRange"]["max"], "2024-01-02");
}

#[test]
fn default_command_is_summary() {
    let dir = TempDir::new().unwrap();
    let log = write_log(&dir, "events.jsonl", &common::as_jsonl(&common::reference_dataset()));

    sso_metrics()
        .arg(&log)
        .assert()
        .success()
        .stdout(predicate::str::contains("SSO Usage Report - Summary"));
}

#[test]
fn users_json_applies_filters() {
    let dir = TempDir::new().unwrap();
    let events = vec![
        common::event(
            true,
            Some("2024-01-01T10:00:00Z"),
            Some(("u1", "Alice")),
            Some(("crm", None)),
        ),
        common::event(
            true,
            Some("2024-02-01T10:00:00Z"),
            Some(("u2", "bob")),
            Some(("crm", None)),
        ),
    ];
    let log = write_log(&dir, "events.jsonl", &common::as_jsonl(&events));

    let output = sso_metrics()
        .arg(&log)
        .args([
            "users",
            "--json",
            "--since",
            "2024-01-01",
            "--until",
            "2024-01-31",
            "--user",
            "ali",
        ])
        .output()
        .unwrap();

    assert!(output.status.success());
    let parsed: Value = serde_json::from_slice(&output.stdout).unwrap();
    let users = parsed["users"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["userId"], "u1");
    assert_eq!(users[0]["username"], "Alice");
    assert_eq!(users[0]["appsInRange"], serde_json::json!(["crm"]));
}

#[test]
fn apps_json_ranks_by_unique_users() {
    let dir = TempDir::new().unwrap();
    let events = vec![
        common::event(
            true,
            Some("2024-01-01T10:00:00Z"),
            Some(("u1", "alice")),
            Some(("wiki", None)),
        ),
        common::event(
            true,
            Some("2024-01-01T11:00:00Z"),
            Some(("u2", "bob")),
            Some(("wiki", None)),
        ),
        common::event(
            true,
            Some("2024-01-02T10:00:00Z"),
            Some(("u1", "alice")),
            Some(("crm", None)),
        ),
    ];
    let log = write_log(&dir, "events.json", &common::as_array(&events));

    let output = sso_metrics()
        .arg(&log)
        .args(["apps", "--json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let parsed: Value = serde_json::from_slice(&output.stdout).unwrap();
    let apps = parsed["applications"].as_array().unwrap();
    assert_eq!(apps.len(), 2);
    assert_eq!(apps[0]["name"], "wiki");
    assert_eq!(apps[0]["userCount"], 2);
    assert_eq!(apps[1]["name"], "crm");
    assert_eq!(apps[1]["sessionCount"], 1);
}

#[test]
fn missing_file_fails_with_error() {
    sso_metrics()
        .arg("/nonexistent/events.json")
        .arg("summary")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn empty_file_fails_with_message() {
    let dir = TempDir::new().unwrap();
    let log = write_log(&dir, "empty.jsonl", "");

    sso_metrics()
        .arg(&log)
        .arg("summary")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No authentication records found"));
}

#[test]
fn empty_input_reports_json_error_object() {
    let dir = TempDir::new().unwrap();
    let log = write_log(&dir, "empty.jsonl", "not json at all");

    let output = sso_metrics()
        .arg(&log)
        .args(["summary", "--json"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let parsed: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(parsed["error"].as_str().unwrap().contains("No authentication records"));
}

#[test]
fn invalid_since_flag_fails() {
    let dir = TempDir::new().unwrap();
    let log = write_log(&dir, "events.json", &common::as_array(&common::reference_dataset()));

    sso_metrics()
        .arg(&log)
        .args(["users", "--since", "01/01/2024"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid date"));
}
