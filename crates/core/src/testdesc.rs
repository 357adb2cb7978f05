//! Test-description extraction for BDD-style C test sources.
//!
//! The test suite is written against `describe(...)` / `subdesc(...)` /
//! `it(...)` macros. This module recovers that nesting with brace-depth
//! counting over source lines and flags structurally thin tests.
//!
//! This is a heuristic scanner, not a C parser: a line ending in `{`
//! pushes, a line ending in `}` or `};` pops, and a line containing `= {`
//! before a trailing `}` counts as both (compound literal on one line).
//! Multi-statement lines or unusual formatting can miscount, which either
//! mis-attributes lines to the wrong test or surfaces as a parse error.
//! Callers wanting exact structure need a real tokenizer behind the same
//! interface.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::color::{self, Painter};

#[derive(Debug, Error)]
pub enum TestParseError {
    #[error("Cannot read file: {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Not a test macro call: {line}")]
    NotAMacroCall { line: String },
    #[error("Found closing brace with no opening in {path} ({context}), line {number}: {line}")]
    UnbalancedClose { path: String, context: String, number: usize, line: String },
    #[error("Found opening with no close in {path}, line {number}: {line}")]
    UnbalancedOpen { path: String, number: usize, line: String },
}

/// A test body has to say something: five or fewer raw lines, or two or
/// fewer lines that are not assertions, is flagged as a bad test.
const MIN_LINES: usize = 5;
const MIN_NON_ASSERT_LINES: usize = 2;

/// One `it(...)` block: its description and raw body lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItBlock {
    pub desc: String,
    pub lines: Vec<String>,
}

impl ItBlock {
    pub fn new(desc: impl Into<String>) -> Self {
        Self { desc: desc.into(), lines: Vec::new() }
    }

    pub fn non_assert_lines(&self) -> Vec<&String> {
        self.lines.iter().filter(|s| !s.trim_start().starts_with("assert")).collect()
    }

    pub fn is_good(&self) -> bool {
        self.lines.len() > MIN_LINES && self.non_assert_lines().len() > MIN_NON_ASSERT_LINES
    }

    pub fn is_bad(&self) -> bool {
        !self.is_good()
    }
}

/// One `subdesc(...)` block and the `it()` tests inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subdesc {
    pub name: String,
    pub its: Vec<ItBlock>,
}

impl Subdesc {
    pub fn has_bad_tests(&self) -> bool {
        self.its.iter().any(ItBlock::is_bad)
    }

    pub fn bad_tests(&self) -> Subdesc {
        Subdesc { name: self.name.clone(), its: self.its.iter().filter(|t| t.is_bad()).cloned().collect() }
    }

    pub fn test_count(&self) -> usize {
        self.its.len()
    }
}

/// A child of a `describe()` block: either a nested subdesc or a test
/// declared directly under the describe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescEntry {
    Subdesc(Subdesc),
    /// A lone `it()` with no surrounding subdesc.
    LoneIt(ItBlock),
}

impl DescEntry {
    fn has_bad_tests(&self) -> bool {
        match self {
            DescEntry::Subdesc(sd) => sd.has_bad_tests(),
            DescEntry::LoneIt(it) => it.is_bad(),
        }
    }

    fn test_count(&self) -> usize {
        match self {
            DescEntry::Subdesc(sd) => sd.test_count(),
            DescEntry::LoneIt(_) => 1,
        }
    }
}

/// One `describe(...)` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Describe {
    pub name: String,
    pub line_number: usize,
    pub entries: Vec<DescEntry>,
}

impl Describe {
    pub fn has_bad_tests(&self) -> bool {
        self.entries.iter().any(DescEntry::has_bad_tests)
    }

    pub fn bad_tests(&self) -> Describe {
        let entries = self
            .entries
            .iter()
            .filter(|e| e.has_bad_tests())
            .map(|e| match e {
                DescEntry::Subdesc(sd) => DescEntry::Subdesc(sd.bad_tests()),
                DescEntry::LoneIt(it) => DescEntry::LoneIt(it.clone()),
            })
            .collect();
        Describe { name: self.name.clone(), line_number: self.line_number, entries }
    }

    pub fn test_count(&self) -> usize {
        self.entries.iter().map(DescEntry::test_count).sum()
    }
}

/// All describes recovered from one test source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestFile {
    pub path: PathBuf,
    pub describes: Vec<Describe>,
}

impl TestFile {
    pub fn from_file(path: &Path) -> Result<Self, TestParseError> {
        let body = std::fs::read_to_string(path)
            .map_err(|e| TestParseError::Read { path: path.to_path_buf(), source: e })?;
        Self::from_source(path, &body)
    }

    pub fn from_source(path: &Path, body: &str) -> Result<Self, TestParseError> {
        let describes = parse_describes(path, body)?;
        Ok(Self { path: path.to_path_buf(), describes })
    }

    /// Returns true when this file actually implements tests (headers
    /// declaring helpers parse to zero describes).
    pub fn is_impl(&self) -> bool {
        !self.describes.is_empty()
    }

    pub fn has_bad_tests(&self) -> bool {
        self.describes.iter().any(Describe::has_bad_tests)
    }

    pub fn bad_tests(&self) -> TestFile {
        TestFile {
            path: self.path.clone(),
            describes: self
                .describes
                .iter()
                .filter(|d| d.has_bad_tests())
                .map(Describe::bad_tests)
                .collect(),
        }
    }

    pub fn test_count(&self) -> usize {
        self.describes.iter().map(Describe::test_count).sum()
    }

    /// Indented tree view; `with_code` includes each test's body lines.
    pub fn formatted(&self, painter: &Painter, with_code: bool) -> String {
        let mut out = format!(
            "{} ({}):\n",
            painter.paint_bold(color::BLUE, &self.path.display().to_string()),
            self.describes.len(),
        );
        for desc in &self.describes {
            out.push_str(&format!(
                "    {} ({}):\n",
                painter.paint(color::YELLOW, &desc.name),
                desc.entries.len(),
            ));
            for entry in &desc.entries {
                match entry {
                    DescEntry::Subdesc(sd) => {
                        out.push_str(&format!(
                            "        {} ({}):\n",
                            painter.paint(color::BLUE, &sd.name),
                            sd.its.len(),
                        ));
                        for it in &sd.its {
                            push_it(&mut out, it, 12, painter, with_code);
                        }
                    }
                    DescEntry::LoneIt(it) => push_it(&mut out, it, 8, painter, with_code),
                }
            }
        }
        out
    }
}

fn push_it(out: &mut String, it: &ItBlock, indent: usize, painter: &Painter, with_code: bool) {
    let spaces = " ".repeat(indent);
    out.push_str(&format!("{spaces}{}", painter.paint(color::CYAN, &it.desc)));
    if !with_code {
        out.push('\n');
        return;
    }
    out.push_str(":\n");
    let dedent = it.lines.first().map(|s| s.len() - s.trim_start().len()).unwrap_or(0);
    for line in &it.lines {
        let trimmed = if line.len() >= dedent { &line[dedent..] } else { line.trim_start() };
        out.push_str(&format!("{spaces}    {trimmed}\n"));
    }
}

/// Parses the name out of a `describe("name")`/`subdesc(name)`/`it("...")`
/// line: the text between the parens, minus surrounding quotes.
pub fn parse_desc_name(line: &str) -> Result<String, TestParseError> {
    let bad = || TestParseError::NotAMacroCall { line: line.to_string() };
    let (_, rest) = line.split_once('(').ok_or_else(bad)?;
    let (name, _) = rest.split_once(')').ok_or_else(bad)?;
    let name = name.trim();
    let name = name.strip_prefix('"').and_then(|s| s.strip_suffix('"')).unwrap_or(name);
    Ok(name.to_string())
}

/// Strip a trailing `//` comment and surrounding whitespace from a line of C.
fn strip_c_line(line: &str) -> &str {
    let line = match line.split_once("//") {
        Some((before, _)) => before,
        None => line,
    };
    line.trim()
}

/// Apply one line's worth of brace events to `depth`.
fn apply_braces(stripped: &str, depth: &mut i32) {
    if stripped.ends_with('{') {
        if stripped.starts_with('}') {
            *depth -= 1;
        }
        *depth += 1;
    } else if stripped.ends_with('}') || stripped.ends_with("};") {
        if stripped.contains("= {") {
            *depth += 1;
        }
        *depth -= 1;
    }
}

/// Top level pass: find `describe()` blocks and their raw body lines.
fn parse_describes(path: &Path, body: &str) -> Result<Vec<Describe>, TestParseError> {
    let path_str = path.display().to_string();
    let mut describes = Vec::new();
    let mut depth = 0i32;
    let mut current: Option<(Describe, Vec<String>)> = None;

    log::debug!("parsing describes for: {path_str}");
    for (i, line) in body.lines().enumerate() {
        let stripped = strip_c_line(line);
        if stripped.starts_with("describe(") {
            if depth != 0 {
                return Err(TestParseError::UnbalancedOpen {
                    path: path_str.clone(),
                    number: i + 1,
                    line: line.to_string(),
                });
            }
            let name = parse_desc_name(stripped)?;
            log::debug!("found describe: {}: {name}", i + 1);
            current = Some((Describe { name, line_number: i + 1, entries: Vec::new() }, Vec::new()));
            depth = 1;
            continue;
        }
        apply_braces(stripped, &mut depth);
        if depth == 0 {
            if let Some((mut desc, lines)) = current.take() {
                desc.entries = parse_desc_entries(&path_str, &desc.name, &lines)?;
                describes.push(desc);
            }
        } else if let Some((_, lines)) = current.as_mut() {
            lines.push(line.trim_end().to_string());
        }
        // Header and comment lines outside any describe are skipped.
    }
    Ok(describes)
}

/// Second pass: split a describe body into subdescs and lone its.
fn parse_desc_entries(
    path: &str,
    describe_name: &str,
    lines: &[String],
) -> Result<Vec<DescEntry>, TestParseError> {
    let mut entries = Vec::new();
    let mut depth = 0i32;
    let mut started = false;
    let mut in_subdesc: Option<(Subdesc, Vec<String>)> = None;
    let mut in_it: Option<ItBlock> = None;

    for (i, line) in lines.iter().enumerate() {
        let stripped = strip_c_line(line);
        if stripped.starts_with("subdesc(") {
            in_subdesc = Some((
                Subdesc { name: parse_desc_name(stripped)?, its: Vec::new() },
                Vec::new(),
            ));
            depth = 1;
            started = true;
            continue;
        } else if stripped.starts_with("it(") {
            if in_subdesc.is_none() {
                in_it = Some(ItBlock::new(parse_desc_name(stripped)?));
                started = true;
                depth = 0;
            }
            depth += 1;
        } else {
            apply_braces(stripped, &mut depth);
        }
        if depth == 0 && started {
            if let Some((mut sd, sd_lines)) = in_subdesc.take() {
                sd.its = parse_its(path, &sd.name, &sd_lines)?;
                entries.push(DescEntry::Subdesc(sd));
                started = false;
            } else if let Some(it) = in_it.take() {
                entries.push(DescEntry::LoneIt(it));
                started = false;
            } else {
                return Err(TestParseError::UnbalancedClose {
                    path: path.to_string(),
                    context: format!("describe {describe_name}"),
                    number: i + 1,
                    line: line.clone(),
                });
            }
        } else if let Some((_, sd_lines)) = in_subdesc.as_mut() {
            sd_lines.push(line.clone());
        } else if let Some(it) = in_it.as_mut() {
            it.lines.push(line.clone());
        }
    }
    Ok(entries)
}

/// Innermost pass: collect `it()` blocks inside a subdesc body.
fn parse_its(path: &str, subdesc_name: &str, lines: &[String]) -> Result<Vec<ItBlock>, TestParseError> {
    let mut its = Vec::new();
    let mut depth = 0i32;
    let mut started = false;
    let mut in_it: Option<ItBlock> = None;

    for (i, line) in lines.iter().enumerate() {
        let stripped = strip_c_line(line);
        if stripped.starts_with("it(") {
            in_it = Some(ItBlock::new(parse_desc_name(stripped)?));
            depth = 1;
            started = true;
            continue;
        }
        apply_braces(stripped, &mut depth);
        if depth == 0 && started {
            if let Some(it) = in_it.take() {
                its.push(it);
                started = false;
            } else {
                return Err(TestParseError::UnbalancedClose {
                    path: path.to_string(),
                    context: format!("subdesc {subdesc_name}"),
                    number: i + 1,
                    line: line.clone(),
                });
            }
        } else if let Some(it) = in_it.as_mut() {
            it.lines.push(line.clone());
        }
    }
    Ok(its)
}

/// Parse every test implementation file and keep only those with bad
/// tests, mirroring the report the CLI prints.
pub fn bad_test_files(paths: &[PathBuf]) -> Result<Vec<TestFile>, TestParseError> {
    let mut bad = Vec::new();
    for path in paths {
        if path.extension().and_then(|e| e.to_str()) == Some("h") {
            // Only implementations, not helper headers.
            continue;
        }
        let file = TestFile::from_file(path)?;
        if file.has_bad_tests() {
            bad.push(file.bad_tests());
        }
    }
    Ok(bad)
}
