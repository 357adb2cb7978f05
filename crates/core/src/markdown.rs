//! Doxygen-markdown to plain markdown conversion.
//!
//! The project's doc pages are written for doxygen; publishing them as
//! normal markdown means dropping doxygen's own title header, rewriting
//! `\ref` and `\includesrc` tags, and optionally replacing the first real
//! h1 header with a new title (the old one is demoted to h2).

use std::path::{Path, PathBuf};

use regex::Regex;

/// Options for one conversion pass.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Replacement for the first non-doxygen h1 header. The old header
    /// becomes an h2 underneath it.
    pub title: Option<String>,
    /// Body lines placed directly under the replacement title.
    pub header_lines: Vec<String>,
    /// Where to resolve `\includesrc{...}` paths that are not found
    /// as-is (normally the project root).
    pub source_root: Option<PathBuf>,
}

/// Convert doxygen-style markdown to plain markdown.
pub fn convert(input: &str, opts: &ConvertOptions) -> String {
    let ref_pat = Regex::new(r#"\\ref ([\w\-\. ]+) ?("[\w\. ]+")?"#).expect("BUG: Malformed Regex");
    let includesrc_pat = Regex::new(r"\\includesrc\{.+\}").expect("BUG: Malformed Regex");

    let mut out = String::new();
    let mut did_header = false;
    let mut did_blank = false;
    let mut did_replace = opts.title.is_none();

    for line in input.lines() {
        let stripped = line.trim();
        if !did_header && line.starts_with("# ") {
            // The doxygen title; the output gets its own.
            did_header = true;
            continue;
        } else if stripped.is_empty() && !did_blank {
            // Blank lines following the doxygen header.
            continue;
        } else if !did_replace && line.starts_with("# ") {
            let title = opts.title.as_deref().unwrap_or_default();
            out.push_str(&format!("# {title}\n\n"));
            for body_line in &opts.header_lines {
                out.push_str(body_line);
                out.push('\n');
            }
            if !opts.header_lines.is_empty() {
                out.push('\n');
            }
            out.push_str(&format!("#{line}\n"));
            did_replace = true;
            continue;
        } else if stripped.starts_with("\\anchor ") {
            // Single-line anchors have no markdown equivalent.
            continue;
        } else if !did_blank {
            did_blank = true;
        }

        if includesrc_pat.is_match(line) {
            out.push_str(&replace_includesrc(line, opts.source_root.as_deref()));
            continue;
        }
        let replaced = ref_pat.replace_all(line, |caps: &regex::Captures| replace_ref(caps));
        out.push_str(&replaced);
        out.push('\n');
    }
    out
}

/// Rewrite a `\ref name "Title"` tag into a markdown link.
///
/// Doxygen's reference anchors have no predictable public URL; titled refs
/// become same-page fragment links, example refs point into examples/,
/// and anything else is left as bare text.
fn replace_ref(caps: &regex::Captures) -> String {
    let reference = caps.get(1).map(|m| m.as_str().trim_end()).unwrap_or_default();
    let title = caps.get(2).map(|m| m.as_str().trim_matches('"'));
    if let Some(title) = title {
        return format!("[{title}](#{reference})");
    }
    if reference.ends_with("_example.c") {
        return format!("[{reference}](examples/{reference})");
    }
    reference.to_string()
}

/// Expand an `\includesrc{<filepath>}` tag into a fenced code block.
fn replace_includesrc(line: &str, source_root: Option<&Path>) -> String {
    let Some(filepath) = line
        .split_once('{')
        .map(|(_, rest)| rest.trim().trim_end_matches('}').to_string())
        .filter(|s| !s.is_empty())
    else {
        log::debug!("missing filepath in \\includesrc line: {line}");
        return String::new();
    };

    let lang = match Path::new(&filepath).extension().and_then(|e| e.to_str()) {
        Some("bash") | Some("sh") => "bash",
        Some("c") => "c",
        Some("cpp") => "cpp",
        Some("js") => "javascript",
        Some("json") => "json",
        Some("py") => "python",
        Some("zsh") => "zsh",
        _ => "",
    };

    let mut path = PathBuf::from(&filepath);
    if !path.exists() {
        if let Some(root) = source_root {
            let candidate = root.join(&filepath);
            if candidate.exists() {
                path = candidate;
            }
        }
    }
    let Ok(body) = std::fs::read_to_string(&path) else {
        log::debug!("can't find source file: {filepath}");
        return String::new();
    };
    let mut out = format!("```{lang}\n");
    out.push_str(&body);
    if !body.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("```\n");
    out
}
