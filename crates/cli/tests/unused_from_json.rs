use std::fs;

use predicates::prelude::*;
use predicates::str::contains;
use tempfile::tempdir;

/// A usage report as the `--out`/`--raw` modes serialize it.
fn fixture_json() -> String {
    serde_json::json!([
        {
            "name": "colr_dead_helper",
            "kind": "function",
            "files": {
                "colr.c": { "count": 2, "lines": [ { "number": 10, "text": "colr_dead_helper();" } ] }
            },
            "total": 2,
            "library_count": 2,
            "tool_count": 0,
            "test_count": 0,
            "example_count": 0,
            "false_positive": false
        },
        {
            "name": "colr_popular",
            "kind": "function",
            "files": {
                "colr.c": { "count": 5, "lines": [] },
                "colr_tool.c": { "count": 3, "lines": [] }
            },
            "total": 8,
            "library_count": 5,
            "tool_count": 3,
            "test_count": 0,
            "example_count": 0,
            "false_positive": false
        }
    ])
    .to_string()
}

#[test]
fn json_input_reports_only_unused_names_by_default() {
    let dir = tempdir().expect("tempdir");
    let json = dir.path().join("usage.json");
    fs::write(&json, fixture_json()).expect("write fixture");

    assert_cmd::cargo::cargo_bin_cmd!("cdev")
        .arg("unused")
        .arg("--json")
        .arg(&json)
        .arg("--names")
        .assert()
        .success()
        .stdout(contains("colr_dead_helper").and(contains("colr_popular").not()));
}

#[test]
fn all_mode_keeps_used_names_in_the_report() {
    let dir = tempdir().expect("tempdir");
    let json = dir.path().join("usage.json");
    fs::write(&json, fixture_json()).expect("write fixture");

    assert_cmd::cargo::cargo_bin_cmd!("cdev")
        .arg("unused")
        .arg("--json")
        .arg(&json)
        .arg("--all")
        .assert()
        .success()
        .stdout(contains("colr_dead_helper").and(contains("colr_popular")));
}

#[test]
fn pattern_filters_the_loaded_names() {
    let dir = tempdir().expect("tempdir");
    let json = dir.path().join("usage.json");
    fs::write(&json, fixture_json()).expect("write fixture");

    assert_cmd::cargo::cargo_bin_cmd!("cdev")
        .arg("unused")
        .arg("--json")
        .arg(&json)
        .arg("--list-names")
        .arg("popular")
        .assert()
        .success()
        .stdout(contains("colr_popular").and(contains("colr_dead_helper").not()));
}

#[test]
fn raw_mode_round_trips_through_json() {
    let dir = tempdir().expect("tempdir");
    let json = dir.path().join("usage.json");
    fs::write(&json, fixture_json()).expect("write fixture");

    let assert = assert_cmd::cargo::cargo_bin_cmd!("cdev")
        .arg("unused")
        .arg("--json")
        .arg(&json)
        .arg("--all")
        .arg("--raw")
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    let names: Vec<serde_json::Value> = serde_json::from_str(&stdout).expect("raw JSON output");
    assert_eq!(names.len(), 2);
}

#[test]
fn legend_prints_without_a_project() {
    assert_cmd::cargo::cargo_bin_cmd!("cdev")
        .arg("unused")
        .arg("--legend")
        .assert()
        .success()
        .stdout(contains("Current Color Code"));
}

#[test]
fn unreadable_json_fails_cleanly() {
    assert_cmd::cargo::cargo_bin_cmd!("cdev")
        .arg("unused")
        .arg("--json")
        .arg("missing.json")
        .assert()
        .failure()
        .stderr(contains("Cannot load JSON"));
}
