//! Regex string replacement over files.
//!
//! A simpler `sed s/TARGET/REPL/`: one pattern, one replacement, applied
//! to stdin/stdout, a file pair, or rewriting a set of source files in
//! place. The refactor mode collects files recursively and filters them
//! by extension and include/exclude patterns; binary files are never
//! touched (anything that fails UTF-8 reading is skipped).

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use regex::{Regex, RegexBuilder};
use thiserror::Error;

use crate::error::InvalidArg;

#[derive(Debug, Error)]
pub enum ReplaceError {
    #[error(transparent)]
    InvalidArg(#[from] InvalidArg),
    #[error("Cannot read file: {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Cannot write file: {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// File extensions the refactor mode includes by default.
pub const SOURCE_EXTS: [&str; 27] = [
    "asm", "bash", "c", "coffee", "cpp", "cs", "cson", "css", "h", "hpp", "hs", "htm", "html",
    "js", "json", "log", "md", "pl", "py", "rs", "rst", "scss", "sh", "tex", "toml", "txt", "xml",
];

/// Compile the target pattern, optionally case-insensitive.
pub fn parse_target(pattern: &str, ignore_case: bool) -> Result<Regex, InvalidArg> {
    RegexBuilder::new(pattern)
        .case_insensitive(ignore_case)
        .build()
        .map_err(|e| InvalidArg(format!("invalid pattern: {pattern}\n{e}")))
}

/// Parse a comma or space separated extension list, falling back to the
/// default source extensions. Leading dots are tolerated.
pub fn parse_exts(arg: Option<&str>) -> BTreeSet<String> {
    match arg {
        None => SOURCE_EXTS.iter().map(|s| s.to_string()).collect(),
        Some(s) => s
            .split([',', ' '])
            .map(|e| e.trim().trim_start_matches('.').to_string())
            .filter(|e| !e.is_empty())
            .collect(),
    }
}

/// One replacement pass over a block of text.
///
/// Returns the rewritten text and how many lines changed.
pub fn replace_text(text: &str, pattern: &Regex, replacement: &str) -> (String, usize) {
    let mut changed = 0;
    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        let replaced = pattern.replace_all(line, replacement);
        if replaced != line {
            changed += 1;
        }
        out.push_str(&replaced);
    }
    (out, changed)
}

/// Rewritten lines for preview: (line number, before, after).
pub fn changed_lines(text: &str, pattern: &Regex, replacement: &str) -> Vec<(usize, String, String)> {
    let mut changes = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let replaced = pattern.replace_all(line, replacement);
        if replaced != line {
            changes.push((i + 1, line.to_string(), replaced.to_string()));
        }
    }
    changes
}

/// Rewrite one file in place. Returns the number of changed lines; the
/// file is left untouched when nothing matched.
pub fn rewrite_file(path: &Path, pattern: &Regex, replacement: &str) -> Result<usize, ReplaceError> {
    let body = std::fs::read_to_string(path)
        .map_err(|e| ReplaceError::Read { path: path.to_path_buf(), source: e })?;
    let (replaced, changed) = replace_text(&body, pattern, replacement);
    if changed == 0 {
        return Ok(0);
    }
    std::fs::write(path, replaced)
        .map_err(|e| ReplaceError::Write { path: path.to_path_buf(), source: e })?;
    Ok(changed)
}

/// Collect candidate source files under `root`, recursively, keeping only
/// the wanted extensions. Hidden directories are skipped.
pub fn collect_source_files(root: &Path, exts: &BTreeSet<String>) -> Vec<PathBuf> {
    let mut files = Vec::new();
    walk(root, exts, &mut files);
    files.sort();
    files
}

fn walk(dir: &Path, exts: &BTreeSet<String>, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        if path.is_dir() {
            walk(&path, exts, out);
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| exts.contains(e))
        {
            out.push(path);
        }
    }
}

/// Apply include/exclude path filters to a file list.
pub fn filter_files(
    files: Vec<PathBuf>,
    include: Option<&Regex>,
    exclude: Option<&Regex>,
) -> Vec<PathBuf> {
    files
        .into_iter()
        .filter(|p| {
            let s = p.display().to_string();
            if include.is_some_and(|pat| pat.find(&s).is_none()) {
                return false;
            }
            !exclude.is_some_and(|pat| pat.find(&s).is_some())
        })
        .collect()
}
