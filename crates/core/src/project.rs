//! Logical layout of the C project's source corpus on disk.
//!
//! This is derived from a chosen root path. It does *not* perform any IO
//! in construction; the enumeration helpers that list directories are the
//! only functions that touch the filesystem. The CLI is responsible for
//! deciding which root to use.

use std::io;
use std::path::{Path, PathBuf};

/// Name of the vendored test-framework header to skip in the test dir.
const IGNORED_TEST_PREFIX: &str = "snow";

/// Which report bucket a file's occurrences count toward, derived from
/// the project's file-naming conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    Library,
    Tool,
    Test,
    Example,
    Other,
}

/// Classify a file name (no directory components) into its bucket.
///
/// The match order matters: `test_colr_tool.c` is a test file, not a tool
/// file.
pub fn categorize(file_name: &str) -> FileCategory {
    if file_name.starts_with("test_") {
        FileCategory::Test
    } else if file_name.ends_with("_example.c") {
        FileCategory::Example
    } else if file_name.ends_with("_tool.c") || file_name.ends_with("_tool.h") {
        FileCategory::Tool
    } else if file_name.starts_with("colr") {
        FileCategory::Library
    } else {
        FileCategory::Other
    }
}

/// Paths to the project's sources, caches, and settings, rooted at the
/// C project checkout.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    /// Root directory of the C project.
    pub root: PathBuf,
    /// Main library header (colr.h).
    pub lib_header: PathBuf,
    /// Main library source (colr.c).
    pub lib_source: PathBuf,
    /// Debug helper header included by snippets (dbug.h).
    pub debug_header: PathBuf,
    /// CLI tool header (colr_tool.h).
    pub tool_header: PathBuf,
    /// CLI tool source (colr_tool.c).
    pub tool_source: PathBuf,
    /// Directory of BDD-style test sources (test/).
    pub test_dir: PathBuf,
    /// Directory of example programs (examples/).
    pub examples_dir: PathBuf,
    /// Directory holding tool state (tools/): caches, settings.
    pub tools_dir: PathBuf,
    /// Cache of the unused-function analysis over the project sources.
    pub usage_cache_path: PathBuf,
    /// Cache of the unused-function analysis over the test sources.
    pub usage_test_cache_path: PathBuf,
    /// Optional cppcheck suppressions list.
    pub suppress_path: PathBuf,
    /// Snippet-runner settings file (last snippet/binary, editor).
    pub snippet_settings_path: PathBuf,
}

impl ProjectLayout {
    /// Compute the layout for a project rooted at `root`.
    ///
    /// This does *not* touch the filesystem.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let tools_dir = root.join("tools");
        Self {
            lib_header: root.join("colr.h"),
            lib_source: root.join("colr.c"),
            debug_header: root.join("dbug.h"),
            tool_header: root.join("colr_tool.h"),
            tool_source: root.join("colr_tool.c"),
            test_dir: root.join("test"),
            examples_dir: root.join("examples"),
            usage_cache_path: tools_dir.join("cppcheck.cached.json"),
            usage_test_cache_path: tools_dir.join("cppcheck.cached.test.json"),
            suppress_path: tools_dir.join("cppcheck.suppress.txt"),
            snippet_settings_path: tools_dir.join("snippet.json"),
            tools_dir,
            root,
        }
    }

    /// Library header and source, in scan order.
    pub fn library_files(&self) -> Vec<PathBuf> {
        vec![self.lib_header.clone(), self.lib_source.clone()]
    }

    /// CLI-tool header and source, in scan order.
    pub fn tool_files(&self) -> Vec<PathBuf> {
        vec![self.tool_header.clone(), self.tool_source.clone()]
    }

    /// Headers scanned for function-like macro definitions.
    pub fn macro_headers(&self) -> Vec<PathBuf> {
        vec![self.lib_header.clone(), self.tool_header.clone()]
    }

    /// All `.c`/`.h` files in the test directory, minus the vendored
    /// test-framework header.
    pub fn test_files(&self) -> io::Result<Vec<PathBuf>> {
        self.list_dir(&self.test_dir, &["c", "h"])
    }

    /// Test headers only; these carry the test-suite helper macros.
    pub fn test_macro_headers(&self) -> io::Result<Vec<PathBuf>> {
        self.list_dir(&self.test_dir, &["h"])
    }

    /// Test implementation files only (`.c`), the set the static analyzer
    /// runs over in test mode.
    pub fn test_sources(&self) -> io::Result<Vec<PathBuf>> {
        self.list_dir(&self.test_dir, &["c"])
    }

    /// Example programs (`.c`) under examples/.
    pub fn example_files(&self) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.examples_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("c") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// The full corpus scanned for symbol occurrences: library, tool,
    /// test, and example sources.
    pub fn scan_corpus(&self) -> io::Result<Vec<PathBuf>> {
        let mut files = self.library_files();
        files.extend(self.tool_files());
        files.extend(self.test_files()?);
        files.extend(self.example_files()?);
        Ok(files)
    }

    fn list_dir(&self, dir: &Path, exts: &[&str]) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name.starts_with(IGNORED_TEST_PREFIX) {
                continue;
            }
            let ext = path.extension().and_then(|e| e.to_str());
            if ext.is_some_and(|e| exts.contains(&e)) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

/// Returns true when `path` is at least as new as every file in `others`.
///
/// Missing or unreadable `others` entries are skipped; a missing or
/// unreadable `path` makes this `false` (the caller should regenerate).
pub fn file_newer(path: &Path, others: &[PathBuf]) -> bool {
    let Ok(meta) = std::fs::metadata(path) else {
        return false;
    };
    let Ok(mtime) = meta.modified() else {
        return false;
    };
    for other in others {
        let Ok(other_meta) = std::fs::metadata(other) else {
            log::debug!("stat failed for check file: {}", other.display());
            continue;
        };
        if let Ok(other_mtime) = other_meta.modified() {
            if other_mtime > mtime {
                log::debug!("other file is newer: {}", other.display());
                return false;
            }
        }
    }
    true
}
