//! Drives the disasm command against canned objdump output through the
//! `CDEV_FAKE_OBJDUMP` env hook, so no disassembler needs to be
//! installed.

use predicates::prelude::*;
use predicates::str::contains;
use tempfile::tempdir;

const OBJDUMP_OUT: &str = "\
fixture:     file format elf64-x86-64

0000000000401000 <_start>:
  401000:\t31 ed\txor    %ebp,%ebp

0000000000401106 <main>:
  401106:\t55\tpush   %rbp
";

#[test]
fn formats_sections_from_canned_disassembler_output() {
    let dir = tempdir().expect("tempdir");
    let binary = dir.path().join("fixture.bin");
    std::fs::write(&binary, b"\x7fELF").expect("write binary");
    let canned = dir.path().join("objdump.txt");
    std::fs::write(&canned, OBJDUMP_OUT).expect("write canned output");

    assert_cmd::cargo::cargo_bin_cmd!("cdev")
        .env("CDEV_FAKE_OBJDUMP", &canned)
        .arg("--color")
        .arg("never")
        .arg("disasm")
        .arg(&binary)
        .assert()
        .success()
        .stdout(
            contains("<main>")
                .and(contains("<_start>"))
                .and(contains("push   %rbp"))
                .and(contains("55")),
        );
}

#[test]
fn section_allow_list_restricts_the_listing() {
    let dir = tempdir().expect("tempdir");
    let binary = dir.path().join("fixture.bin");
    std::fs::write(&binary, b"\x7fELF").expect("write binary");
    let canned = dir.path().join("objdump.txt");
    std::fs::write(&canned, OBJDUMP_OUT).expect("write canned output");

    assert_cmd::cargo::cargo_bin_cmd!("cdev")
        .env("CDEV_FAKE_OBJDUMP", &canned)
        .arg("--color")
        .arg("never")
        .arg("disasm")
        .arg(&binary)
        .arg("--section")
        .arg("main")
        .assert()
        .success()
        .stdout(contains("<main>").and(contains("_start").not()));
}

#[test]
fn empty_disassembler_output_is_a_failure_not_a_crash() {
    let dir = tempdir().expect("tempdir");
    let binary = dir.path().join("fixture.bin");
    std::fs::write(&binary, b"\x7fELF").expect("write binary");
    let canned = dir.path().join("objdump.txt");
    std::fs::write(&canned, "").expect("write empty output");

    assert_cmd::cargo::cargo_bin_cmd!("cdev")
        .env("CDEV_FAKE_OBJDUMP", &canned)
        .arg("disasm")
        .arg(&binary)
        .assert()
        .failure()
        .code(1)
        .stderr(contains("no output"));
}
