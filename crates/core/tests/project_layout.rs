use std::fs;

use cdev_core::project::{categorize, FileCategory, ProjectLayout};
use tempfile::tempdir;

#[test]
fn layout_paths_derive_from_the_root_without_io() {
    let layout = ProjectLayout::new("/proj");
    assert_eq!(layout.lib_source, std::path::Path::new("/proj/colr.c"));
    assert_eq!(layout.tool_header, std::path::Path::new("/proj/colr_tool.h"));
    assert_eq!(layout.test_dir, std::path::Path::new("/proj/test"));
    assert_eq!(layout.usage_cache_path, std::path::Path::new("/proj/tools/cppcheck.cached.json"));
    assert_eq!(layout.snippet_settings_path, std::path::Path::new("/proj/tools/snippet.json"));
}

#[test]
fn categorize_checks_conventions_in_priority_order() {
    assert_eq!(categorize("test_colr.c"), FileCategory::Test);
    assert_eq!(categorize("test_colr_tool.c"), FileCategory::Test);
    assert_eq!(categorize("rainbow_example.c"), FileCategory::Example);
    assert_eq!(categorize("colr_tool.c"), FileCategory::Tool);
    assert_eq!(categorize("colr_tool.h"), FileCategory::Tool);
    assert_eq!(categorize("colr.c"), FileCategory::Library);
    assert_eq!(categorize("colr.controls.h"), FileCategory::Library);
    assert_eq!(categorize("README.md"), FileCategory::Other);
}

#[test]
fn test_file_listing_skips_the_vendored_framework() {
    let dir = tempdir().expect("tempdir");
    let layout = ProjectLayout::new(dir.path());
    fs::create_dir_all(&layout.test_dir).expect("test dir");
    fs::write(layout.test_dir.join("test_colr.c"), "").expect("file");
    fs::write(layout.test_dir.join("test_colr.h"), "").expect("file");
    fs::write(layout.test_dir.join("snow.h"), "").expect("file");
    fs::write(layout.test_dir.join("notes.txt"), "").expect("file");

    let files = layout.test_files().expect("list test files");
    let names: Vec<String> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["test_colr.c".to_string(), "test_colr.h".to_string()]);

    let sources = layout.test_sources().expect("list test sources");
    assert_eq!(sources.len(), 1);
}

#[test]
fn example_listing_keeps_only_c_files() {
    let dir = tempdir().expect("tempdir");
    let layout = ProjectLayout::new(dir.path());
    fs::create_dir_all(&layout.examples_dir).expect("examples dir");
    fs::write(layout.examples_dir.join("rainbow_example.c"), "").expect("file");
    fs::write(layout.examples_dir.join("README.md"), "").expect("file");

    let files = layout.example_files().expect("list examples");
    assert_eq!(files.len(), 1);
}
