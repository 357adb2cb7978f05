use std::fs;

use cdev_core::replace::{
    changed_lines, collect_source_files, filter_files, parse_exts, parse_target, replace_text,
    rewrite_file, SOURCE_EXTS,
};
use tempfile::tempdir;

#[test]
fn replaces_matches_and_counts_changed_lines() {
    let pat = parse_target("colou?r", false).expect("pattern");
    let (out, changed) = replace_text("color here\nplain line\ncolour there\n", &pat, "colr");
    assert_eq!(out, "colr here\nplain line\ncolr there\n");
    assert_eq!(changed, 2);
}

#[test]
fn no_matches_changes_nothing() {
    let pat = parse_target("missing", false).expect("pattern");
    let (out, changed) = replace_text("line one\nline two\n", &pat, "x");
    assert_eq!(out, "line one\nline two\n");
    assert_eq!(changed, 0);
}

#[test]
fn case_insensitive_flag_widens_the_match() {
    let pat = parse_target("colr", true).expect("pattern");
    let (_, changed) = replace_text("COLR\ncolr\nColr\n", &pat, "x");
    assert_eq!(changed, 3);
}

#[test]
fn capture_groups_work_in_the_replacement() {
    let pat = parse_target(r"fore\((\w+)\)", false).expect("pattern");
    let (out, _) = replace_text("fore(BLUE);\n", &pat, "colr_fore($1)");
    assert_eq!(out, "colr_fore(BLUE);\n");
}

#[test]
fn invalid_pattern_is_an_invalid_arg() {
    let err = parse_target("def(", false).unwrap_err();
    assert!(err.to_string().starts_with("Invalid argument"));
}

#[test]
fn changed_lines_reports_before_and_after() {
    let pat = parse_target("a", false).expect("pattern");
    let changes = changed_lines("a line\nno match\n", &pat, "b");
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0], (1, "a line".to_string(), "b line".to_string()));
}

#[test]
fn rewrite_file_leaves_unmatched_files_untouched() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("sample.c");
    fs::write(&path, "int color;\n").expect("write fixture");

    let pat = parse_target("nothing", false).expect("pattern");
    assert_eq!(rewrite_file(&path, &pat, "x").expect("rewrite"), 0);
    assert_eq!(fs::read_to_string(&path).expect("read back"), "int color;\n");

    let pat = parse_target("color", false).expect("pattern");
    assert_eq!(rewrite_file(&path, &pat, "colr").expect("rewrite"), 1);
    assert_eq!(fs::read_to_string(&path).expect("read back"), "int colr;\n");
}

#[test]
fn collects_source_files_recursively_skipping_hidden_dirs() {
    let dir = tempdir().expect("tempdir");
    fs::create_dir_all(dir.path().join("src/.git")).expect("dirs");
    fs::write(dir.path().join("src/main.c"), "").expect("file");
    fs::write(dir.path().join("src/notes.md"), "").expect("file");
    fs::write(dir.path().join("src/blob.bin"), "").expect("file");
    fs::write(dir.path().join("src/.git/config.c"), "").expect("file");

    let exts = parse_exts(None);
    let files = collect_source_files(dir.path(), &exts);
    let names: Vec<String> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["main.c".to_string(), "notes.md".to_string()]);
}

#[test]
fn extension_list_parsing_tolerates_dots_commas_and_spaces() {
    let exts = parse_exts(Some(".c, h rs"));
    assert!(exts.contains("c"));
    assert!(exts.contains("h"));
    assert!(exts.contains("rs"));
    assert_eq!(exts.len(), 3);

    assert_eq!(parse_exts(None).len(), SOURCE_EXTS.len());
}

#[test]
fn include_and_exclude_patterns_filter_paths() {
    let files = vec![
        std::path::PathBuf::from("src/colr.c"),
        std::path::PathBuf::from("src/test_colr.c"),
        std::path::PathBuf::from("docs/readme.md"),
    ];
    let include = regex::Regex::new(r"\.c$").expect("include");
    let exclude = regex::Regex::new("test_").expect("exclude");
    let kept = filter_files(files, Some(&include), Some(&exclude));
    assert_eq!(kept, vec![std::path::PathBuf::from("src/colr.c")]);
}
