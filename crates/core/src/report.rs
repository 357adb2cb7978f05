//! Test-report parsing and pretty-printing.
//!
//! The C test binary (CMocka-based) emits JUnit-shaped XML:
//! `<testsuites><testsuite ...><testcase ...><failure>...` and may
//! concatenate several complete `<testsuites>` documents into one stream
//! when tests run in groups. The stream is split on the literal closing
//! tag and each document's counts are merged.
//!
//! The shape is fixed, so the fields are pulled out with regexes; this is
//! not a general XML reader and does not try to be one.

use std::env;
use std::path::Path;
use std::process::Command;

use regex::Regex;
use thiserror::Error;

use crate::color::{self, Painter};

/// Environment variable selecting the test binary's output style.
pub const CMOCKA_OUTPUT_VAR: &str = "CMOCKA_MESSAGE_OUTPUT";
/// Environment variable switching the test binary to XML-file output.
pub const CMOCKA_FILE_VAR: &str = "CMOCKA_XML_FILE";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Test executable output was invalid XML: {0}")]
    InvalidXml(String),
    #[error("Test executable does not exist: {0}")]
    MissingExe(String),
    #[error("No output from the test exe!")]
    NoOutput,
    #[error("failed to run test executable: {0}")]
    Run(String),
}

/// One `<testcase>` and its optional failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub name: String,
    pub failure: Option<FailureInfo>,
}

/// Parsed `<failure>` text: `file:line: message`, optionally preceded by
/// the failing source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureInfo {
    pub file: String,
    pub line: String,
    pub message: String,
    pub code: Option<String>,
}

impl FailureInfo {
    /// Parse failure text. Two-line bodies carry the failing code first,
    /// then the location line.
    fn parse(text: &str) -> Result<Self, ReportError> {
        let text = text.trim();
        let (code, line_info) = match text.split_once('\n') {
            Some((code, rest)) => (Some(code.trim().to_string()), rest.trim()),
            None => (None, text),
        };
        let mut parts = line_info.splitn(3, ':');
        let file = parts.next().unwrap_or_default().to_string();
        let line = parts.next().unwrap_or_default().to_string();
        let message = parts
            .next()
            .ok_or_else(|| ReportError::InvalidXml(format!("unreadable failure text: {text}")))?
            .trim()
            .to_string();
        Ok(Self { file, line, message, code })
    }
}

/// One `<testsuite>` with its cases and counters.
#[derive(Debug, Clone, PartialEq)]
pub struct TestSuite {
    pub name: String,
    pub cases: Vec<TestCase>,
    pub time: f64,
    pub errors: usize,
    pub skipped: usize,
}

impl TestSuite {
    pub fn tests(&self) -> usize {
        self.cases.len()
    }

    pub fn failures(&self) -> usize {
        self.cases.iter().filter(|c| c.failure.is_some()).count()
    }
}

/// Every suite from one or more concatenated `<testsuites>` documents,
/// with aggregated counts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestSuites {
    pub suites: Vec<TestSuite>,
    pub time: f64,
    pub tests: usize,
    pub failures: usize,
    pub errors: usize,
    pub skipped: usize,
}

impl TestSuites {
    /// Parse the runner's whole output stream, which may hold several
    /// complete `<testsuites>` documents back to back.
    pub fn from_output(output: &str) -> Result<Self, ReportError> {
        let mut all = TestSuites::default();
        let mut any = false;
        for doc in split_documents(output) {
            all.merge(Self::from_xml(&doc)?);
            any = true;
        }
        if !any {
            return Err(ReportError::InvalidXml("no <testsuites> document found".to_string()));
        }
        Ok(all)
    }

    /// Parse a single `<testsuites>` document.
    pub fn from_xml(xml: &str) -> Result<Self, ReportError> {
        if !xml.contains("<testsuites") {
            return Err(ReportError::InvalidXml("missing <testsuites> element".to_string()));
        }
        let suite_pat = Regex::new(r"(?s)<testsuite\s([^>]*)>(.*?)</testsuite>")
            .expect("BUG: Malformed Regex");
        let case_pat = Regex::new(r#"(?s)<testcase\s+name="([^"]*)"\s*(?:/>|>(.*?)</testcase>)"#)
            .expect("BUG: Malformed Regex");
        let failure_pat =
            Regex::new(r"(?s)<failure>(.*?)</failure>").expect("BUG: Malformed Regex");

        let mut result = TestSuites::default();
        for suite_caps in suite_pat.captures_iter(xml) {
            let attrs = &suite_caps[1];
            let body = &suite_caps[2];
            let name = attr(attrs, "name")
                .ok_or_else(|| ReportError::InvalidXml("testsuite without name".to_string()))?;
            let mut cases = Vec::new();
            for case_caps in case_pat.captures_iter(body) {
                let case_name = unescape_xml(&case_caps[1]);
                let failure = match case_caps.get(2) {
                    Some(inner) => match failure_pat.captures(inner.as_str()) {
                        Some(f) => Some(FailureInfo::parse(&unescape_xml(&f[1]))?),
                        None => None,
                    },
                    None => None,
                };
                cases.push(TestCase { name: case_name, failure });
            }
            result.merge_suite(TestSuite {
                name,
                cases,
                time: attr(attrs, "time").and_then(|t| t.parse().ok()).unwrap_or(0.0),
                errors: attr(attrs, "errors").and_then(|e| e.parse().ok()).unwrap_or(0),
                skipped: attr(attrs, "skipped").and_then(|s| s.parse().ok()).unwrap_or(0),
            });
        }
        Ok(result)
    }

    fn merge_suite(&mut self, suite: TestSuite) {
        self.time += suite.time;
        self.tests += suite.tests();
        self.failures += suite.failures();
        self.errors += suite.errors;
        self.skipped += suite.skipped;
        self.suites.push(suite);
    }

    fn merge(&mut self, other: TestSuites) {
        self.time += other.time;
        self.tests += other.tests;
        self.failures += other.failures;
        self.errors += other.errors;
        self.skipped += other.skipped;
        self.suites.extend(other.suites);
    }
}

/// Yield each complete `<testsuites>...</testsuites>` document from a
/// possibly-concatenated stream.
fn split_documents(output: &str) -> Vec<String> {
    let mut docs = Vec::new();
    let mut lines: Vec<&str> = Vec::new();
    for line in output.lines() {
        lines.push(line);
        if line.contains("</testsuites>") {
            docs.push(lines.join("\n"));
            lines.clear();
        }
    }
    docs
}

fn attr(attrs: &str, name: &str) -> Option<String> {
    let pat = Regex::new(&format!(r#"\b{name}="([^"]*)""#)).expect("BUG: Malformed Regex");
    pat.captures(attrs).map(|caps| unescape_xml(&caps[1]))
}

fn unescape_xml(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// How the runner presents results. Each variant has exactly one render
/// path; the variants that defer to the test binary's own formatting skip
/// parsing entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputStyle {
    /// Parse the XML and print the colorized summary (default).
    #[default]
    Color,
    /// Parse the XML and print the debug representation.
    Raw,
    /// Let the binary print its normal stdout output.
    Stdout,
    /// Subunit-style output from the binary.
    Subunit,
    /// TAP-style output from the binary.
    Tap,
    /// Raw XML from the binary, unparsed.
    Xml,
    /// Have the binary write XML files instead of printing.
    XmlFile,
}

impl OutputStyle {
    /// The `CMOCKA_MESSAGE_OUTPUT` value this style needs.
    pub fn cmocka_value(self) -> &'static str {
        match self {
            OutputStyle::Stdout => "STDOUT",
            OutputStyle::Subunit => "SUBUNIT",
            OutputStyle::Tap => "TAP",
            _ => "XML",
        }
    }

    /// Whether this style needs the XML output parsed.
    pub fn needs_parsing(self) -> bool {
        matches!(self, OutputStyle::Color | OutputStyle::Raw)
    }
}

/// Render a parsed report in the requested style.
pub fn render(suites: &TestSuites, style: OutputStyle, painter: &Painter) -> String {
    match style {
        OutputStyle::Raw => format!("{suites:#?}\n"),
        _ => render_color(suites, painter),
    }
}

fn render_counts(
    painter: &Painter,
    tests: usize,
    errors: usize,
    failures: usize,
    skipped: usize,
) -> String {
    let tests_code = if errors > 0 || failures > 0 { color::BLUE } else { color::GREEN };
    let mut parts = vec![format!(
        "{}: {}",
        painter.paint(color::CYAN, "Tests"),
        painter.paint(tests_code, &tests.to_string())
    )];
    if errors > 0 {
        parts.push(format!(
            "{}: {}",
            painter.paint(color::CYAN, "Errors"),
            painter.paint(color::RED, &errors.to_string())
        ));
    }
    if failures > 0 {
        parts.push(format!(
            "{}: {}",
            painter.paint(color::CYAN, "Failed"),
            painter.paint(color::RED, &failures.to_string())
        ));
    }
    if skipped > 0 {
        parts.push(format!(
            "{}: {}",
            painter.paint(color::CYAN, "Skipped"),
            painter.paint(color::BLUE, &skipped.to_string())
        ));
    }
    parts.join(" ")
}

fn render_color(suites: &TestSuites, painter: &Painter) -> String {
    let mut out = String::new();
    for suite in &suites.suites {
        out.push_str(&format!(
            "\n{} {}\n",
            painter.paint(color::BLUE, &format!("{:<32}", suite.name)),
            render_counts(painter, suite.tests(), suite.errors, suite.failures(), suite.skipped),
        ));
        for case in &suite.cases {
            let code = if case.failure.is_some() { color::RED } else { color::GREEN };
            out.push_str(&format!("    {}\n", painter.paint(code, &case.name)));
            if let Some(failure) = &case.failure {
                out.push_str(&format!(
                    "        {}:{}: {}\n",
                    painter.paint(color::CYAN, &failure.file),
                    painter.paint(color::BRIGHT_BLUE, &failure.line),
                    painter.paint(color::RED, &failure.message),
                ));
                if let Some(code_line) = &failure.code {
                    out.push_str(&format!("        {code_line}\n"));
                }
            }
        }
    }
    out.push_str(&format!(
        "\n{} {}\n",
        painter.paint_bold(color::BLUE, "All"),
        render_counts(painter, suites.tests, suites.errors, suites.failures, suites.skipped),
    ));
    out
}

/// Outcome of driving the test executable.
pub struct RunOutcome {
    pub exit_code: i32,
    /// Parsed report when the style called for parsing.
    pub suites: Option<TestSuites>,
    pub stdout: String,
    pub stderr: String,
}

/// Run the test executable with the environment set up for `style` and,
/// when the style needs it, parse the XML it prints.
///
/// When `CMOCKA_MESSAGE_OUTPUT` is already set in the environment it is
/// honored; a non-XML setting downgrades parsing styles to passthrough.
pub fn run_test_exe(exe: &Path, style: OutputStyle, file_fmt: Option<&str>) -> Result<RunOutcome, ReportError> {
    if !exe.exists() {
        return Err(ReportError::MissingExe(exe.display().to_string()));
    }
    let cmocka_style = env::var(CMOCKA_OUTPUT_VAR)
        .unwrap_or_else(|_| style.cmocka_value().to_string())
        .trim()
        .to_uppercase();

    let mut cmd = Command::new(exe);
    cmd.env(CMOCKA_OUTPUT_VAR, &cmocka_style);
    if style == OutputStyle::XmlFile {
        let fmt = env::var(CMOCKA_FILE_VAR).unwrap_or_else(|_| file_fmt.unwrap_or("cm_%g.xml").to_string());
        cmd.env(CMOCKA_FILE_VAR, fmt);
    }
    let output = cmd.output().map_err(|e| ReportError::Run(e.to_string()))?;
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let exit_code = output.status.code().unwrap_or(1);

    if style.needs_parsing() && cmocka_style == "XML" {
        if stdout.is_empty() {
            return if stderr.is_empty() {
                Err(ReportError::NoOutput)
            } else {
                Ok(RunOutcome { exit_code: 1, suites: None, stdout, stderr })
            };
        }
        let suites = TestSuites::from_output(&stdout)?;
        return Ok(RunOutcome { exit_code, suites: Some(suites), stdout, stderr });
    }
    Ok(RunOutcome { exit_code, suites: None, stdout, stderr })
}
