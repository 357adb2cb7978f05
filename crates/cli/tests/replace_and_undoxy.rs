use std::fs;

use predicates::prelude::*;
use predicates::str::contains;
use tempfile::tempdir;

#[test]
fn replace_rewrites_a_file_pair() {
    let dir = tempdir().expect("tempdir");
    let input = dir.path().join("in.txt");
    let output = dir.path().join("out.txt");
    fs::write(&input, "the color of colors\n").expect("write input");

    assert_cmd::cargo::cargo_bin_cmd!("cdev")
        .arg("replace")
        .arg("color")
        .arg("colr")
        .arg("--file")
        .arg(&input)
        .arg("--out")
        .arg(&output)
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&output).expect("read output"), "the colr of colrs\n");
}

/// Nothing matched means exit code 1, with the input passed through.
#[test]
fn replace_with_no_matches_fails() {
    let dir = tempdir().expect("tempdir");
    let input = dir.path().join("in.txt");
    let output = dir.path().join("out.txt");
    fs::write(&input, "plain text\n").expect("write input");

    assert_cmd::cargo::cargo_bin_cmd!("cdev")
        .arg("replace")
        .arg("missing")
        .arg("x")
        .arg("--file")
        .arg(&input)
        .arg("--out")
        .arg(&output)
        .assert()
        .failure()
        .code(1);
    assert_eq!(fs::read_to_string(&output).expect("read output"), "plain text\n");
}

#[test]
fn replace_rejects_invalid_patterns() {
    assert_cmd::cargo::cargo_bin_cmd!("cdev")
        .arg("replace")
        .arg("def(")
        .arg("x")
        .arg("--file")
        .arg("whatever.txt")
        .assert()
        .failure()
        .stderr(contains("Invalid argument"));
}

#[test]
fn replace_list_files_shows_refactor_candidates() {
    let dir = tempdir().expect("tempdir");
    fs::write(dir.path().join("keep.c"), "").expect("file");
    fs::write(dir.path().join("skip.bin"), "").expect("file");

    assert_cmd::cargo::cargo_bin_cmd!("cdev")
        .current_dir(dir.path())
        .arg("replace")
        .arg("--list-files")
        .assert()
        .success()
        .stdout(contains("keep.c").and(contains("skip.bin").not()));
}

#[test]
fn replace_rewrites_files_in_place() {
    let dir = tempdir().expect("tempdir");
    let target = dir.path().join("code.c");
    fs::write(&target, "int color = 1;\nint other = 2;\n").expect("write target");

    assert_cmd::cargo::cargo_bin_cmd!("cdev")
        .arg("replace")
        .arg("color")
        .arg("colr")
        .arg("--rewrite")
        .arg(&target)
        .assert()
        .success()
        .stdout(contains("Replaced 1 lines"));
    assert_eq!(
        fs::read_to_string(&target).expect("read back"),
        "int colr = 1;\nint other = 2;\n"
    );
}

#[test]
fn undoxy_converts_to_stdout() {
    let dir = tempdir().expect("tempdir");
    let input = dir.path().join("doc.md");
    fs::write(&input, "# Doxygen Title\n\n# Welcome\n\\anchor top\nBody.\n").expect("write input");

    assert_cmd::cargo::cargo_bin_cmd!("cdev")
        .arg("undoxy")
        .arg(&input)
        .arg("--title")
        .arg("ColrC")
        .assert()
        .success()
        .stdout(contains("# ColrC").and(contains("## Welcome")).and(contains("anchor").not()));
}

#[test]
fn undoxy_writes_an_output_file() {
    let dir = tempdir().expect("tempdir");
    let input = dir.path().join("doc.md");
    let output = dir.path().join("out.md");
    fs::write(&input, "# Doxygen Title\n\nBody.\n").expect("write input");

    assert_cmd::cargo::cargo_bin_cmd!("cdev")
        .arg("undoxy")
        .arg(&input)
        .arg(&output)
        .assert()
        .success();
    assert_eq!(fs::read_to_string(&output).expect("read output"), "Body.\n");
}

#[test]
fn undoxy_fails_for_missing_input() {
    assert_cmd::cargo::cargo_bin_cmd!("cdev")
        .arg("undoxy")
        .arg("no-such-file.md")
        .assert()
        .failure()
        .stderr(contains("doesn't exist"));
}
