use std::fs;
use std::path::PathBuf;

use cdev_core::usage::{check_files, file_macro_names, macro_names, NameKind, NameUsage};
use tempfile::tempdir;

fn write(dir: &std::path::Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).expect("write fixture");
    path
}

#[test]
fn counts_word_boundary_occurrences_per_file() {
    let dir = tempdir().expect("tempdir");
    let colr = write(
        dir.path(),
        "colr.c",
        "char* colr_cat(void);\nint other = colr_cat();\nint nocolr_cat = 0;\n",
    );

    let names = vec![NameUsage::new("colr_cat", NameKind::Function)];
    let found = check_files(&[colr], names).expect("scan");
    assert_eq!(found.len(), 1);
    let usage = &found[0];
    // Lines 1 and 2 count; `nocolr_cat` is glued to a word character.
    assert_eq!(usage.library_count, 2);
    let hits = usage.files.get("colr.c").expect("file hits");
    assert_eq!(hits.count, 2);
    assert_eq!(hits.lines.len(), 2);
    assert_eq!(hits.lines[0].number, 1);
}

#[test]
fn comment_lines_and_block_comments_are_skipped() {
    let dir = tempdir().expect("tempdir");
    let colr = write(
        dir.path(),
        "colr.c",
        "// colr_cat in a line comment\n/* colr_cat in\n   a block comment\n*/\ncolr_cat();\n",
    );

    let names = vec![NameUsage::new("colr_cat", NameKind::Function)];
    let found = check_files(&[colr], names).expect("scan");
    assert_eq!(found[0].library_count, 1);
    assert_eq!(found[0].files["colr.c"].lines[0].number, 5);
}

#[test]
fn names_with_no_occurrences_are_dropped() {
    let dir = tempdir().expect("tempdir");
    let colr = write(dir.path(), "colr.c", "int main(void) { return 0; }\n");

    let names = vec![NameUsage::new("ghost_symbol", NameKind::Function)];
    let found = check_files(&[colr], names).expect("scan");
    assert!(found.is_empty());
}

#[test]
fn all_occurrences_on_a_line_count_once_one_is_freestanding() {
    let dir = tempdir().expect("tempdir");
    let colr = write(dir.path(), "colr.c", "colr_cat(colr_cat_helper());\n");

    let names = vec![NameUsage::new("colr_cat", NameKind::Function)];
    let found = check_files(&[colr], names).expect("scan");
    // Both the freestanding call and the prefix of the helper name count,
    // the way the line scan has always counted them.
    assert_eq!(found[0].library_count, 2);
}

#[test]
fn macro_scan_finds_function_like_defines_only() {
    let dir = tempdir().expect("tempdir");
    let header = write(
        dir.path(),
        "colr.h",
        "#define COLR_VERSION \"1.0\"\n\
         #define colr_max(a, b) ((a) > (b) ? (a) : (b))\n\
         #define fore(x) colr_fore(x)\n\
         #define NOT_FUNC 1\n",
    );

    let found = file_macro_names(&header).expect("macro scan");
    assert_eq!(found, vec!["colr_max".to_string(), "fore".to_string()]);
}

#[test]
fn macro_names_applies_kind_and_pattern() {
    let dir = tempdir().expect("tempdir");
    let header = write(dir.path(), "colr.h", "#define fore(x) (x)\n#define back(x) (x)\n");

    let pat = regex::Regex::new("^fore$").expect("pattern");
    let names = macro_names(&[header], NameKind::Macro, Some(&pat)).expect("macro names");
    assert_eq!(names.len(), 1);
    assert_eq!(names[0].name, "fore");
    assert_eq!(names[0].kind, NameKind::Macro);
}
