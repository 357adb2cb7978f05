//! Symbol usage analysis.
//!
//! Classifies project-defined function and macro names as used / unused /
//! untested / test-only-dependency / false-positive, based on where and
//! how often they are referenced across the project's file corpus.
//!
//! Candidate names come from two independent sources: the static
//! analyzer's "never used" diagnostics (see [`cppcheck`]) and a regex scan
//! of the headers for function-like macro definitions. Occurrences are
//! then counted per file with a line-oriented scan and aggregated into
//! {library, tool, test, example} buckets by filename convention.
//!
//! The scanning is heuristic, not a C tokenizer: it skips comment lines
//! and guards matches with pre/post substitution checks rather than a true
//! word boundary, which tolerates names containing characters a `\w`
//! boundary would split on. Unusual formatting can miscount; that is a
//! documented limitation of the approach, not a bug to patch case-by-case.

pub mod cppcheck;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::color::{self, Painter};
use crate::error::InvalidArg;
use crate::project::{categorize, FileCategory};

#[derive(Debug, Error)]
pub enum UsageError {
    #[error("Cannot read file: {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Cannot load JSON from {}: {reason}", path.display())]
    InvalidJson { path: PathBuf, reason: String },
    #[error("Static analyzer error: {0}")]
    Analyzer(String),
    #[error(transparent)]
    InvalidArg(#[from] InvalidArg),
}

/// What kind of symbol a candidate name is, and which corpus defined it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameKind {
    Function,
    Macro,
    TestFunction,
    TestMacro,
}

impl NameKind {
    pub fn is_macro(self) -> bool {
        matches!(self, NameKind::Macro | NameKind::TestMacro)
    }

    pub fn is_test(self) -> bool {
        matches!(self, NameKind::TestFunction | NameKind::TestMacro)
    }

    fn describe(self) -> &'static str {
        match self {
            NameKind::Function => "func.",
            NameKind::Macro => "macro",
            NameKind::TestFunction => "test func.",
            NameKind::TestMacro => "test macro",
        }
    }
}

/// Derived classification for a candidate name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageLabel {
    Normal,
    Untested,
    Unused,
    TestDependency,
    FalsePositive,
}

impl fmt::Display for UsageLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UsageLabel::Normal => "normal",
            UsageLabel::Untested => "untested",
            UsageLabel::Unused => "unused",
            UsageLabel::TestDependency => "test dep.",
            UsageLabel::FalsePositive => "false-positive",
        };
        f.write_str(s)
    }
}

/// One matched source line, kept for the full report's excerpts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRef {
    pub number: usize,
    pub text: String,
}

/// Occurrences of one name within one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHits {
    pub count: usize,
    pub lines: Vec<LineRef>,
}

/// A candidate name with its per-file and per-bucket occurrence counts.
///
/// Built once per run: discovered, counted, then classified. The
/// classification predicates are pure functions of the bucket counts and
/// the kind, so identical counts always classify identically regardless of
/// which files contributed them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameUsage {
    pub name: String,
    pub kind: NameKind,
    /// Per-file hits, keyed by bare file name.
    pub files: BTreeMap<String, FileHits>,
    pub total: usize,
    pub library_count: usize,
    pub tool_count: usize,
    pub test_count: usize,
    pub example_count: usize,
    #[serde(default)]
    pub false_positive: bool,
}

impl NameUsage {
    pub fn new(name: impl Into<String>, kind: NameKind) -> Self {
        Self {
            name: name.into(),
            kind,
            files: BTreeMap::new(),
            total: 0,
            library_count: 0,
            tool_count: 0,
            test_count: 0,
            example_count: 0,
            false_positive: false,
        }
    }

    /// Recompute the bucket counts from the per-file map.
    pub fn set_counts(&mut self) {
        self.library_count = 0;
        self.tool_count = 0;
        self.test_count = 0;
        self.example_count = 0;
        for (file_name, hits) in &self.files {
            match categorize(file_name) {
                FileCategory::Test => self.test_count += hits.count,
                FileCategory::Example => self.example_count += hits.count,
                FileCategory::Tool => self.tool_count += hits.count,
                FileCategory::Library => self.library_count += hits.count,
                FileCategory::Other => {}
            }
        }
    }

    pub fn is_example(&self) -> bool {
        self.example_count > 0
    }

    /// A symbol referenced more than twice within the tests is presumed to
    /// be test infrastructure rather than a genuinely-called symbol.
    pub fn is_test_dep(&self) -> bool {
        self.test_count > 2
    }

    /// Test-suite symbols legitimately self-reference their own helpers a
    /// few times, so they use a stricter threshold than project symbols.
    pub fn is_untested(&self) -> bool {
        match self.kind {
            NameKind::TestFunction => self.test_count < 3,
            NameKind::TestMacro => self.test_count < 2,
            _ => self.test_count == 0,
        }
    }

    /// "Low" usage in exactly one of {library, tool} while the other is
    /// absent flags a symbol as unused; symbols legitimately shared across
    /// both binaries are not flagged.
    ///
    /// The numeric thresholds here are the tuned values the reports were
    /// calibrated against; they are empirical, not derived.
    pub fn is_unused(&self) -> bool {
        match self.kind {
            NameKind::TestFunction => self.test_count < 3,
            NameKind::TestMacro => self.test_count < 2,
            _ => {
                let lib = self.library_count;
                let tool = self.tool_count;
                (lib < 3 && lib > 0 && tool == 0) || (tool < 3 && tool > 0 && lib == 0)
            }
        }
    }

    pub fn is_used(&self) -> bool {
        !self.is_unused()
    }

    pub fn label(&self) -> UsageLabel {
        if self.false_positive {
            UsageLabel::FalsePositive
        } else if self.is_test_dep() {
            UsageLabel::TestDependency
        } else if self.is_untested() {
            UsageLabel::Untested
        } else if self.is_unused() {
            UsageLabel::Unused
        } else {
            UsageLabel::Normal
        }
    }

    /// Label plus kind suffix, as shown in the reports.
    pub fn describe(&self) -> String {
        format!("{} {}", self.label(), self.kind.describe())
    }

    /// Color code for this name's current classification.
    fn label_color(&self) -> &'static str {
        match (self.label(), self.kind.is_macro()) {
            (UsageLabel::FalsePositive, false) => color::GREEN,
            (UsageLabel::FalsePositive, true) => color::BRIGHT_GREEN,
            (UsageLabel::TestDependency, false) => color::YELLOW,
            (UsageLabel::TestDependency, true) => color::BRIGHT_MAGENTA,
            (UsageLabel::Untested, _) => color::BRIGHT_RED,
            (UsageLabel::Unused, false) => color::RED,
            (UsageLabel::Unused, true) => color::MAGENTA,
            (UsageLabel::Normal, false) => color::BLUE,
            (UsageLabel::Normal, true) => color::BRIGHT_BLUE,
        }
    }
}

/// Pattern used to find function-like macro definitions in a header.
fn macro_pattern() -> Regex {
    Regex::new(r"#define ([\w_]+)([ \t]+)?\([^\(]").expect("BUG: Malformed Regex")
}

/// Collect function-like macro names from one header file.
pub fn file_macro_names(path: &Path) -> Result<Vec<String>, UsageError> {
    let pat = macro_pattern();
    let body = std::fs::read_to_string(path)
        .map_err(|e| UsageError::Read { path: path.to_path_buf(), source: e })?;
    let mut names = Vec::new();
    for line in body.lines() {
        if let Some(caps) = pat.captures(line) {
            names.push(caps[1].to_string());
        }
    }
    log::debug!("macros found: {} - {}", names.len(), path.display());
    Ok(names)
}

/// Collect macro candidates from several headers, optionally filtered.
pub fn macro_names(
    headers: &[PathBuf],
    kind: NameKind,
    pat: Option<&Regex>,
) -> Result<Vec<NameUsage>, UsageError> {
    let mut names = Vec::new();
    for path in headers {
        for name in file_macro_names(path)? {
            if pat.is_some_and(|p| p.find(&name).is_none()) {
                continue;
            }
            names.push(NameUsage::new(name, kind));
        }
    }
    Ok(names)
}

/// Matcher for one candidate name, with the pre/post guards precompiled.
struct NameMatcher {
    name: String,
    pre: Regex,
    suf: Regex,
}

impl NameMatcher {
    fn new(name: &str) -> Self {
        let esc = regex::escape(name);
        Self {
            name: name.to_string(),
            pre: Regex::new(&format!(r"[\w_]{esc}")).expect("BUG: Malformed Regex"),
            suf: Regex::new(&format!(r"{esc}[\w_]")).expect("BUG: Malformed Regex"),
        }
    }

    /// Count occurrences in a line of code.
    ///
    /// If every occurrence is glued to a word character on the left or on
    /// the right the line does not reference this name; otherwise all
    /// occurrences on the line are counted.
    fn line_hits(&self, line: &str) -> usize {
        if !line.contains(&self.name) {
            return 0;
        }
        if !self.pre.replace_all(line, "").contains(&self.name) {
            return 0;
        }
        if !self.suf.replace_all(line, "").contains(&self.name) {
            return 0;
        }
        line.matches(&self.name).count()
    }
}

/// Scan one file for all candidate names, skipping comment lines.
///
/// Returns hits keyed by index into `matchers`.
fn check_file(path: &Path, matchers: &[NameMatcher]) -> Result<BTreeMap<usize, FileHits>, UsageError> {
    let body = std::fs::read_to_string(path)
        .map_err(|e| UsageError::Read { path: path.to_path_buf(), source: e })?;
    let mut hits: BTreeMap<usize, FileHits> = BTreeMap::new();
    let mut in_comment = false;
    for (i, line) in body.lines().enumerate() {
        let stripped = line.trim();
        if stripped.starts_with("/*") {
            in_comment = true;
        }
        if in_comment {
            if line.contains("*/") {
                in_comment = false;
            }
            continue;
        }
        if stripped.starts_with("//") {
            continue;
        }
        for (idx, matcher) in matchers.iter().enumerate() {
            let count = matcher.line_hits(line);
            if count == 0 {
                continue;
            }
            let entry = hits.entry(idx).or_default();
            entry.count += count;
            entry.lines.push(LineRef { number: i + 1, text: line.to_string() });
        }
    }
    Ok(hits)
}

/// Scan the corpus for every candidate name and aggregate counts.
///
/// Names with no occurrences anywhere are dropped from the result, the
/// same way the reports drop them: a symbol that appears nowhere (not even
/// its own definition) has nothing to report.
pub fn check_files(
    paths: &[PathBuf],
    mut names: Vec<NameUsage>,
) -> Result<Vec<NameUsage>, UsageError> {
    let matchers: Vec<NameMatcher> = names.iter().map(|n| NameMatcher::new(&n.name)).collect();
    for path in paths {
        let file_hits = match check_file(path, &matchers) {
            Ok(h) => h,
            Err(UsageError::Read { path, source }) => {
                log::debug!("cannot read file: {}: {source}", path.display());
                continue;
            }
            Err(e) => return Err(e),
        };
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        for (idx, hits) in file_hits {
            let name = &mut names[idx];
            name.total += hits.count;
            name.files.insert(file_name.to_string(), hits);
        }
    }
    let mut found: Vec<NameUsage> =
        names.into_iter().filter(|n| !n.files.is_empty()).collect();
    for name in &mut found {
        name.set_counts();
    }
    Ok(found)
}

/// Sort key for report output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Name,
    Label,
    Library,
    Tool,
    Test,
    Example,
    File,
    Total,
    Kind,
}

impl SortKey {
    pub const ACCEPTED: &'static str =
        "colr, example, file, label, name, test, tool, total, type";

    /// Parse a sort key, accepting the single-letter aliases the reports
    /// have always taken.
    pub fn parse(s: &str) -> Result<Self, InvalidArg> {
        match s.trim().to_lowercase().as_str() {
            "name" | "n" => Ok(SortKey::Name),
            "label" | "l" => Ok(SortKey::Label),
            "colr" | "c" => Ok(SortKey::Library),
            "tool" => Ok(SortKey::Tool),
            "test" | "t" => Ok(SortKey::Test),
            "example" | "e" | "x" => Ok(SortKey::Example),
            "file" | "f" | "files" => Ok(SortKey::File),
            "total" => Ok(SortKey::Total),
            "type" => Ok(SortKey::Kind),
            other => Err(InvalidArg(format!(
                "Expecting one of ({}), got: {other}",
                SortKey::ACCEPTED
            ))),
        }
    }
}

/// The collected usage info for one analysis run, with the filters the
/// report modes apply.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageReport {
    pub names: Vec<NameUsage>,
}

impl UsageReport {
    pub fn new(names: Vec<NameUsage>) -> Self {
        Self { names }
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn filter_pattern(&mut self, pat: Option<&Regex>) -> &mut Self {
        if let Some(pat) = pat {
            self.names.retain(|n| pat.find(&n.name).is_some());
        }
        self
    }

    pub fn filter_examples(&mut self, with_examples: bool) -> &mut Self {
        self.names.retain(|n| n.is_example() == with_examples);
        self
    }

    /// Drop (or, with `mark_only`, flag) the names the cross-reference
    /// counting considers actually used. The static analyzer has plenty of
    /// false positives; this is where they are weeded out.
    pub fn filter_used(&mut self, untested: bool, test_deps: bool, mark_only: bool) -> &mut Self {
        if mark_only {
            for name in &mut self.names {
                if !untested && !name.is_unused() {
                    name.false_positive = true;
                }
            }
            return self;
        }
        self.names.retain(|n| {
            if untested {
                n.is_untested()
            } else if n.is_unused() {
                !(test_deps && !n.is_test_dep())
            } else {
                false
            }
        });
        self
    }

    /// All macro names are gathered up front; only the unused ones belong
    /// in the default report.
    pub fn filter_used_macros(&mut self) -> &mut Self {
        self.names.retain(|n| !n.kind.is_macro() || n.is_unused());
        self
    }

    pub fn only_functions(&mut self) -> &mut Self {
        self.names.retain(|n| !n.kind.is_macro());
        self
    }

    pub fn only_macros(&mut self) -> &mut Self {
        self.names.retain(|n| n.kind.is_macro());
        self
    }

    /// Sort names alphabetically, then by the requested key.
    pub fn sort_by_key(&mut self, key: SortKey) -> &mut Self {
        self.names.sort_by(|a, b| a.name.cmp(&b.name));
        match key {
            SortKey::Name => {}
            SortKey::Label => self.names.sort_by_key(|n| n.describe()),
            SortKey::Library => self.names.sort_by_key(|n| n.library_count),
            SortKey::Tool => self.names.sort_by_key(|n| n.tool_count),
            SortKey::Test => self.names.sort_by_key(|n| n.test_count),
            SortKey::Example => self.names.sort_by_key(|n| n.example_count),
            SortKey::Total => self.names.sort_by_key(|n| n.total),
            SortKey::File => {
                self.names.sort_by_key(|n| n.files.keys().cloned().collect::<Vec<_>>())
            }
            SortKey::Kind => self.names.sort_by_key(|n| n.kind.describe()),
        }
        self
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.names)
    }

    pub fn from_json(body: &str) -> serde_json::Result<Self> {
        Ok(Self { names: serde_json::from_str(body)? })
    }

    pub fn from_json_file(path: &Path) -> Result<Self, UsageError> {
        let body = std::fs::read_to_string(path)
            .map_err(|e| UsageError::InvalidJson { path: path.to_path_buf(), reason: e.to_string() })?;
        Self::from_json(&body)
            .map_err(|e| UsageError::InvalidJson { path: path.to_path_buf(), reason: e.to_string() })
    }
}

/// Render the "simple" report: one line per name with color-coded bucket
/// counts and the derived label.
///
/// Plain text is padded before painting so column alignment survives the
/// escape codes.
pub fn render_simple(report: &UsageReport, painter: &Painter) -> String {
    let name_width = report.names.iter().map(|n| n.name.len()).max().unwrap_or(0);
    let mut out = String::new();
    for name in &report.names {
        let count_col = |label: &str, value: usize, hot: bool| {
            let value_code = if hot && value == 0 { color::BRIGHT_RED } else { color::BLUE };
            format!(
                "{}: {}",
                painter.paint(color::CYAN, label),
                painter.paint(value_code, &format!("{value:<4}")),
            )
        };
        let padded_name = format!("{:<name_width$}", name.name);
        out.push_str(&format!(
            "{} {} {} {} {} {} - {}\n",
            painter.paint(name.label_color(), &padded_name),
            count_col("total", name.total, false),
            count_col("colr", name.library_count, false),
            count_col("tool", name.tool_count, true),
            count_col("test", name.test_count, true),
            count_col("example", name.example_count, false),
            painter.paint(name.label_color(), &name.describe()),
        ));
    }
    out
}

/// Render the "full" report: per-file counts plus the matched source lines.
pub fn render_full(report: &UsageReport, painter: &Painter) -> String {
    let col = 30;
    let mut out = String::new();
    for name in &report.names {
        let padded_name = format!("{:<col$}", name.name);
        out.push_str(&format!(
            "{}  {}\n",
            painter.paint(name.label_color(), &padded_name),
            painter.paint(color::YELLOW, &name.total.to_string()),
        ));
        for (file_name, hits) in &name.files {
            let padded_file = format!("{:>w$}", file_name, w = col - 4);
            out.push_str(&format!(
                "    {}: {}\n",
                painter.paint(color::CYAN, &padded_file),
                painter.paint(color::BLUE, &hits.count.to_string()),
            ));
            for line in &hits.lines {
                out.push_str(&format!(
                    "{}{}: {}\n",
                    " ".repeat(col),
                    painter.paint(color::BRIGHT_CYAN, &line.number.to_string()),
                    line.text.trim(),
                ));
            }
        }
    }
    out
}

/// Render just the names, one per line.
pub fn render_names(report: &UsageReport, painter: &Painter) -> String {
    let mut out = String::new();
    for name in &report.names {
        out.push_str(&painter.paint(name.label_color(), &name.name));
        out.push('\n');
    }
    out
}

/// The color-code legend for the report output.
pub fn render_legend(painter: &Painter) -> String {
    let rows: [(&str, &str); 10] = [
        ("Function", color::BLUE),
        ("Function False Positive", color::GREEN),
        ("Function Test Dependency", color::YELLOW),
        ("Unused/Untested Function", color::BRIGHT_RED),
        ("Unused Function", color::RED),
        ("Macro", color::BRIGHT_BLUE),
        ("Macro False Positive", color::BRIGHT_GREEN),
        ("Macro Test Dependency", color::BRIGHT_MAGENTA),
        ("Unused/Untested Macro", color::BRIGHT_RED),
        ("Unused Macro", color::MAGENTA),
    ];
    let mut out = String::from("Current Color Code:\n");
    for (desc, code) in rows {
        out.push_str(&format!("    {}\n", painter.paint(code, desc)));
    }
    out
}
