//! cppcheck integration.
//!
//! Two modes are wrapped here: the unused-function scan feeding the usage
//! analyzer (expensive, so its results are cached to disk keyed by source
//! modification times), and the `--errorlist` dump of every diagnostic
//! cppcheck knows, reformatted for reading.
//!
//! The error list arrives as fixed-shape XML
//! (`<errors><error id=... severity=... msg=... verbose=.../></errors>`);
//! the attributes are extracted with regexes rather than an XML parser,
//! which is all this shape needs.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::color::{self, Painter};
use crate::error::InvalidArg;
use crate::exec;
use crate::project::{file_newer, ProjectLayout};
use crate::usage::{NameKind, NameUsage, UsageError};

/// Fixed analyzer arguments; behavioral parity requires this exact list.
fn cppcheck_args(layout: &ProjectLayout) -> Vec<String> {
    let mut args = vec![
        "--std=c11".to_string(),
        "--enable=unusedFunction".to_string(),
        "--force".to_string(),
        "--inconclusive".to_string(),
        "--inline-suppr".to_string(),
        "--error-exitcode=1".to_string(),
        "-DIS_C11".to_string(),
        "-D__GNUC__".to_string(),
        "-DDEBUG".to_string(),
        "-DCOLR_DEBUG".to_string(),
        format!("-I{}", layout.root.display()),
        format!("-I{}", layout.test_dir.display()),
    ];
    if layout.suppress_path.exists() {
        args.push(format!("--suppressions-list={}", layout.suppress_path.display()));
    }
    args
}

fn resolve_cppcheck() -> PathBuf {
    env::var_os("CDEV_CPPCHECK").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("cppcheck"))
}

/// The `.c` files whose modification times key the cache for a mode.
fn scanned_sources(layout: &ProjectLayout, use_tests: bool) -> Result<Vec<PathBuf>, UsageError> {
    let mut files = Vec::new();
    if use_tests {
        files.extend(
            layout
                .test_sources()
                .map_err(|e| UsageError::Read { path: layout.test_dir.clone(), source: e })?,
        );
    } else {
        files.push(layout.lib_source.clone());
        files.push(layout.tool_source.clone());
    }
    Ok(files)
}

fn cache_path(layout: &ProjectLayout, use_tests: bool) -> PathBuf {
    if use_tests {
        layout.usage_test_cache_path.clone()
    } else {
        layout.usage_cache_path.clone()
    }
}

/// Returns true when the cached analyzer results are out of date: the
/// cache is missing, or any scanned source is strictly newer than it.
pub fn cache_is_stale(layout: &ProjectLayout, use_tests: bool) -> Result<bool, UsageError> {
    let cache = cache_path(layout, use_tests);
    let sources = scanned_sources(layout, use_tests)?;
    let stale = !file_newer(&cache, &sources);
    log::debug!("cache is {}: {}", if stale { "old" } else { "good" }, cache.display());
    Ok(stale)
}

/// On-disk shape of the cached analyzer pass.
#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    generated_at: String,
    names: Vec<NameUsage>,
}

fn save_cache(path: &Path, names: &[NameUsage]) {
    let cache = CacheFile { generated_at: Utc::now().to_rfc3339(), names: names.to_vec() };
    let result = serde_json::to_string_pretty(&cache)
        .map_err(|e| e.to_string())
        .and_then(|body| fs::write(path, body).map_err(|e| e.to_string()));
    // Cache write failures only cost a rerun next time.
    match result {
        Ok(()) => log::debug!("analyzer results were cached: {}", path.display()),
        Err(e) => log::debug!("unable to save cache file: {}: {e}", path.display()),
    }
}

fn load_cache(path: &Path) -> Result<Vec<NameUsage>, UsageError> {
    let body = fs::read_to_string(path)
        .map_err(|e| UsageError::InvalidJson { path: path.to_path_buf(), reason: e.to_string() })?;
    let cache: CacheFile = serde_json::from_str(&body)
        .map_err(|e| UsageError::InvalidJson { path: path.to_path_buf(), reason: e.to_string() })?;
    Ok(cache.names)
}

/// Run the analyzer's unused-function pass and collect candidate names.
///
/// Candidates are reported on stderr as ``The function 'name' is never
/// used.``; everything else is ignored. Results are written to the cache
/// on the way out.
pub fn unused_function_names(
    layout: &ProjectLayout,
    use_tests: bool,
    pat: Option<&Regex>,
) -> Result<Vec<NameUsage>, UsageError> {
    let kind = if use_tests { NameKind::TestFunction } else { NameKind::Function };

    // Tests can feed canned analyzer stderr via env instead of installing
    // cppcheck.
    let stderr = if let Some(fake) = env::var_os("CDEV_FAKE_CPPCHECK") {
        fs::read_to_string(&fake)
            .map_err(|e| UsageError::Analyzer(format!("failed to read CDEV_FAKE_CPPCHECK: {e}")))?
    } else {
        let mut args = cppcheck_args(layout);
        for path in scanned_sources(layout, use_tests)? {
            args.push(path.display().to_string());
        }
        let cppcheck = resolve_cppcheck();
        log::debug!("running: {} {}", cppcheck.display(), args.join(" "));
        let captured = exec::run_capture(&cppcheck, &args)
            .map_err(|e| UsageError::Analyzer(e.to_string()))?;
        captured.stderr
    };

    let name_pat =
        Regex::new(r"'([^']+)' is never used\.\s*$").expect("BUG: Malformed Regex");
    let mut names = Vec::new();
    for line in stderr.lines() {
        let Some(caps) = name_pat.captures(line) else {
            continue;
        };
        let name = &caps[1];
        if pat.is_some_and(|p| p.find(name).is_none()) {
            continue;
        }
        names.push(NameUsage::new(name, kind));
    }
    save_cache(&cache_path(layout, use_tests), &names);
    Ok(names)
}

/// Cached front to [`unused_function_names`]: reruns the analyzer only
/// when the cache is stale or unreadable.
pub fn cached_unused_names(
    layout: &ProjectLayout,
    use_tests: bool,
    pat: Option<&Regex>,
) -> Result<Vec<NameUsage>, UsageError> {
    if cache_is_stale(layout, use_tests)? {
        return unused_function_names(layout, use_tests, pat);
    }
    match load_cache(&cache_path(layout, use_tests)) {
        Ok(names) => Ok(names
            .into_iter()
            .filter(|n| pat.is_none_or(|p| p.find(&n.name).is_some()))
            .collect()),
        Err(e) => {
            log::debug!("{e}");
            unused_function_names(layout, use_tests, pat)
        }
    }
}

/// The severities cppcheck assigns, in the order the flag help lists them.
pub const SEVERITIES: [&str; 5] = ["warning", "performance", "portability", "error", "style"];

/// One diagnostic from `cppcheck --errorlist`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckError {
    pub id: String,
    pub cwe: Option<u32>,
    pub severity: String,
    pub msg: String,
    pub verbose: String,
}

/// Run `cppcheck --errorlist` and parse the diagnostic catalog.
pub fn error_list() -> Result<Vec<CheckError>, UsageError> {
    let output = if let Some(fake) = env::var_os("CDEV_FAKE_CPPCHECK_ERRORLIST") {
        fs::read_to_string(&fake).map_err(|e| {
            UsageError::Analyzer(format!("failed to read CDEV_FAKE_CPPCHECK_ERRORLIST: {e}"))
        })?
    } else {
        let cppcheck = resolve_cppcheck();
        exec::check_output(&cppcheck, ["--errorlist"])
            .map_err(|e| UsageError::Analyzer(e.to_string()))?
    };
    if output.trim().is_empty() {
        return Err(UsageError::Analyzer("No output from cppcheck!".to_string()));
    }
    parse_error_list(&output)
}

/// Parse the errorlist XML body into sorted [`CheckError`] records.
pub fn parse_error_list(body: &str) -> Result<Vec<CheckError>, UsageError> {
    let error_pat = Regex::new(r"<error\s[^>]*>").expect("BUG: Malformed Regex");
    let mut errors = Vec::new();
    for tag in error_pat.find_iter(body) {
        let tag = tag.as_str();
        let id = attr(tag, "id")
            .ok_or_else(|| UsageError::Analyzer(format!("error element without id: {tag}")))?;
        let cwe = attr(tag, "cwe").and_then(|s| s.parse::<u32>().ok()).filter(|c| *c != 0);
        let severity = attr(tag, "severity").unwrap_or_default();
        let msg = attr(tag, "msg").unwrap_or_default();
        let verbose = attr(tag, "verbose").unwrap_or_default().replace("\\012", "\n");
        errors.push(CheckError { id, cwe, severity, msg, verbose });
    }
    errors.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(errors)
}

/// Extract one XML attribute value from a start tag, unescaping the
/// entities cppcheck actually emits.
fn attr(tag: &str, name: &str) -> Option<String> {
    let pat = Regex::new(&format!(r#"\b{name}="([^"]*)""#)).expect("BUG: Malformed Regex");
    pat.captures(tag).map(|caps| unescape_xml(&caps[1]))
}

fn unescape_xml(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Validate a user-supplied severity filter list.
pub fn check_severities(severities: &[String]) -> Result<Vec<String>, InvalidArg> {
    let mut cleaned = Vec::new();
    for s in severities {
        let s = s.trim().to_lowercase();
        if !SEVERITIES.contains(&s.as_str()) {
            return Err(InvalidArg(format!(
                "not a valid \"severity\": {s}\nExpecting one of: {}",
                SEVERITIES.join(", ")
            )));
        }
        cleaned.push(s);
    }
    Ok(cleaned)
}

/// Render the error catalog with a header line per diagnostic and the
/// verbose description wrapped underneath.
pub fn render_error_list(errors: &[CheckError], painter: &Painter, width: usize) -> String {
    let mut out = String::new();
    for (i, err) in errors.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let cwe = err.cwe.map(|c| c.to_string()).unwrap_or_default();
        out.push_str(&format!(
            "{} {} {}\n",
            painter.paint(color::CYAN, &format!("{:<40}", err.id)),
            painter.paint(color::BRIGHT_BLUE, &format!("{cwe:>4}")),
            painter.paint(color::YELLOW, &err.severity),
        ));
        for line in wrap_text(&err.verbose, width.saturating_sub(4)) {
            out.push_str("    ");
            out.push_str(&line);
            out.push('\n');
        }
    }
    out
}

/// Greedy word-wrap; existing newlines are respected.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(16);
    let mut lines = Vec::new();
    for para in text.lines() {
        let mut line = String::new();
        for word in para.split_whitespace() {
            if !line.is_empty() && line.len() + word.len() + 1 > width {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
        }
        lines.push(line);
    }
    lines
}
