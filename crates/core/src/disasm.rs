//! Disassembly formatter.
//!
//! Invokes `objdump -d` on a binary, parses its line-oriented output into
//! (address, raw-bytes, instruction) records grouped by section, and
//! renders them with aligned columns, a hex/ASCII byte view, and simple
//! syntax highlighting.
//!
//! The parser understands exactly the shape objdump emits: a section
//! header line `<hex-addr> <name>:` opens a capture window, instruction
//! lines are `<addr>:\t<hex bytes>\t<mnemonic operands>`, and a bare `...`
//! ends capture early (objdump elides repetitive padding that way).

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use thiserror::Error;

use crate::color::{self, Painter};
use crate::exec;

/// Disassembly syntax flavor passed to objdump via `-M`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyntaxFlavor {
    #[default]
    Att,
    Intel,
}

impl SyntaxFlavor {
    pub fn flag(self) -> &'static str {
        match self {
            SyntaxFlavor::Att => "att",
            SyntaxFlavor::Intel => "intel",
        }
    }

    pub fn from_flag(value: &str) -> Option<Self> {
        match value {
            "att" => Some(SyntaxFlavor::Att),
            "intel" => Some(SyntaxFlavor::Intel),
            _ => None,
        }
    }
}

/// Options controlling which sections are parsed and how they render.
#[derive(Debug, Clone, Default)]
pub struct DisasmOptions {
    pub syntax: SyntaxFlavor,
    /// Allow-list of section names (e.g. `["main"]`). `None` keeps all.
    pub sections: Option<Vec<String>>,
    /// Section names to skip, matched by prefix or suffix.
    pub ignore_sections: Vec<String>,
    /// Render the address column.
    pub show_addresses: bool,
}

impl DisasmOptions {
    pub fn new() -> Self {
        Self { show_addresses: true, ..Self::default() }
    }
}

/// One decoded instruction line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub address: u64,
    pub bytes: Vec<u8>,
    pub text: String,
}

/// A named contiguous block of instructions, as reported by objdump
/// (typically a function body).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub address: u64,
    pub name: String,
    pub instructions: Vec<Instruction>,
}

#[derive(Debug, Error)]
pub enum DisasmError {
    #[error("Binary not found at {}", .0.display())]
    MissingBinary(PathBuf),
    #[error("Disassembler error: {0}")]
    Tool(String),
    #[error("Disassembler produced no output")]
    EmptyOutput,
    #[error("Unreadable section header: {line}")]
    SectionHeader { line: String },
}

/// Resolve the objdump executable, honoring the `CDEV_OBJDUMP` override.
fn resolve_objdump() -> PathBuf {
    env::var_os("CDEV_OBJDUMP").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("objdump"))
}

/// Disassemble `path` and parse the output into sections.
///
/// Any stderr output from the disassembler is surfaced as a failure, even
/// on a zero exit status.
pub fn disassemble(path: &Path, opts: &DisasmOptions) -> Result<Vec<Section>, DisasmError> {
    if !path.is_file() {
        return Err(DisasmError::MissingBinary(path.to_path_buf()));
    }

    // Allow tests to feed canned objdump text via env to avoid needing a
    // disassembler installed.
    let stdout = if let Some(fake) = env::var_os("CDEV_FAKE_OBJDUMP") {
        fs::read_to_string(&fake)
            .map_err(|e| DisasmError::Tool(format!("failed to read CDEV_FAKE_OBJDUMP: {e}")))?
    } else {
        let objdump = resolve_objdump();
        let mut args = vec!["-M".to_string(), opts.syntax.flag().to_string(), "-d".to_string()];
        args.push(path.display().to_string());
        log::debug!("running: {} {}", objdump.display(), args.join(" "));
        let captured =
            exec::run_capture(&objdump, &args).map_err(|e| DisasmError::Tool(e.to_string()))?;
        if !captured.stderr.trim().is_empty() {
            return Err(DisasmError::Tool(captured.stderr.trim().to_string()));
        }
        captured.stdout
    };

    if stdout.trim().is_empty() {
        return Err(DisasmError::EmptyOutput);
    }
    parse_objdump(&stdout, opts)
}

/// Returns true when a section named `name` passes the include/exclude
/// lists in `opts`.
pub fn section_wanted(name: &str, opts: &DisasmOptions) -> bool {
    if let Some(allow) = &opts.sections {
        if !allow.iter().any(|s| s == name) {
            return false;
        }
    }
    !opts.ignore_sections.iter().any(|pat| name.starts_with(pat.as_str()) || name.ends_with(pat.as_str()))
}

/// Parse objdump's text output into instruction sections, applying the
/// section filters as headers are encountered. A skipped section pauses
/// capture until the next header.
pub fn parse_objdump(text: &str, opts: &DisasmOptions) -> Result<Vec<Section>, DisasmError> {
    let mut sections: Vec<Section> = Vec::new();
    let mut current: Option<Section> = None;
    let mut capturing = false;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed == "..." {
            // objdump elided repeated padding; the capture window ends here.
            if let Some(section) = current.take() {
                sections.push(section);
            }
            capturing = false;
            continue;
        }
        if trimmed.ends_with(">:") {
            if let Some(section) = current.take() {
                sections.push(section);
            }
            let (address, name) = parse_section_header(trimmed)?;
            capturing = true;
            if section_wanted(&name, opts) {
                current = Some(Section { address, name, instructions: Vec::new() });
            }
            continue;
        }
        if !capturing {
            continue;
        }
        let Some(section) = current.as_mut() else {
            continue;
        };
        if trimmed.is_empty() {
            continue;
        }
        match parse_instruction(trimmed) {
            Some(inst) if inst.text.is_empty() => {
                // Byte-continuation line: objdump wraps long encodings onto
                // a line with no instruction text.
                if let Some(last) = section.instructions.last_mut() {
                    last.bytes.extend(inst.bytes);
                } else {
                    section.instructions.push(inst);
                }
            }
            Some(inst) => section.instructions.push(inst),
            None => {}
        }
    }
    if let Some(section) = current.take() {
        sections.push(section);
    }
    Ok(sections)
}

/// Split a `<hex-addr> <name>:` header into its address and name.
///
/// A header that cannot be split cleanly is a hard parse failure: the
/// disassembler emitted something this formatter does not understand, and
/// silently skipping it would mis-attribute the instructions that follow.
fn parse_section_header(line: &str) -> Result<(u64, String), DisasmError> {
    let bad = || DisasmError::SectionHeader { line: line.to_string() };
    let body = line.strip_suffix(':').ok_or_else(bad)?;
    let mut parts = body.split_whitespace();
    let addr_str = parts.next().ok_or_else(bad)?;
    let name_str = parts.next().ok_or_else(bad)?;
    if parts.next().is_some() {
        return Err(bad());
    }
    let address = u64::from_str_radix(addr_str, 16).map_err(|_| bad())?;
    let name = name_str.strip_prefix('<').and_then(|s| s.strip_suffix('>')).ok_or_else(bad)?;
    Ok((address, name.to_string()))
}

/// Parse one `<addr>:\t<hex bytes>\t<instruction>` line. Returns `None`
/// for lines that are not instruction records (prose, headers).
fn parse_instruction(line: &str) -> Option<Instruction> {
    let (addr_str, rest) = line.split_once(':')?;
    let address = u64::from_str_radix(addr_str.trim(), 16).ok()?;
    let mut fields = rest.splitn(3, '\t');
    fields.next()?; // Empty slot before the first tab.
    let bytes_field = fields.next()?;
    let text = fields.next().unwrap_or("").trim().to_string();
    let mut bytes = Vec::new();
    for token in bytes_field.split_whitespace() {
        bytes.push(u8::from_str_radix(token, 16).ok()?);
    }
    if bytes.is_empty() {
        return None;
    }
    Some(Instruction { address, bytes, text })
}

/// Render raw bytes as concatenated hex pairs plus an ASCII side view.
///
/// The hex string holds exactly two hex digits per byte. The ASCII view
/// holds one character per byte, substituting `.` for anything outside the
/// printable range.
pub fn format_bytes(bytes: &[u8]) -> (String, String) {
    let mut hex = String::with_capacity(bytes.len() * 2);
    let mut ascii = String::with_capacity(bytes.len());
    for b in bytes {
        hex.push_str(&format!("{b:02x}"));
        ascii.push(if (32..=126).contains(b) { *b as char } else { '.' });
    }
    (hex, ascii)
}

/// Hex digits per rendered byte row; longer encodings wrap to another row.
const BYTE_ROW_DIGITS: usize = 30;
const BYTES_PER_ROW: usize = BYTE_ROW_DIGITS / 2;

/// Column/color renderer for parsed sections.
pub struct Renderer {
    painter: Painter,
    show_addresses: bool,
    register_pat: Regex,
    immediate_pat: Regex,
}

impl Renderer {
    pub fn new(painter: Painter, show_addresses: bool) -> Self {
        Self {
            painter,
            show_addresses,
            register_pat: Regex::new(r"%[a-z][a-z0-9]*").expect("BUG: Malformed Regex"),
            immediate_pat: Regex::new(r"\$?-?0x[0-9a-fA-F]+").expect("BUG: Malformed Regex"),
        }
    }

    pub fn render(&self, sections: &[Section]) -> String {
        let mut out = String::new();
        for section in sections {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&self.render_header(section));
            out.push('\n');
            for inst in &section.instructions {
                out.push_str(&self.render_instruction(inst));
            }
        }
        out
    }

    fn render_header(&self, section: &Section) -> String {
        format!(
            "{} {}:",
            self.painter.paint(color::DIM, &format!("{:016x}", section.address)),
            self.painter.paint_bold(color::CYAN, &format!("<{}>", section.name)),
        )
    }

    fn render_instruction(&self, inst: &Instruction) -> String {
        let mut out = String::new();
        let addr_col = if self.show_addresses {
            self.painter.paint(color::BLUE, &format!("{:>8x}: ", inst.address))
        } else {
            String::new()
        };
        let addr_pad = if self.show_addresses { " ".repeat(10) } else { String::new() };

        let rows: Vec<&[u8]> = inst.bytes.chunks(BYTES_PER_ROW).collect();
        for (i, row) in rows.iter().enumerate() {
            if i == 0 {
                out.push_str(&addr_col);
            } else {
                out.push_str(&addr_pad);
            }
            let (_, ascii) = format_bytes(row);
            out.push_str(&self.grouped_hex(row));
            // Pad the hex column to a fixed width so the ASCII view lines up.
            let pad = BYTE_ROW_DIGITS.saturating_sub(row.len() * 2);
            out.push_str(&" ".repeat(pad));
            out.push_str("  ");
            out.push_str(&self.painter.paint(color::DIM, &ascii));
            let pad = BYTES_PER_ROW.saturating_sub(row.len());
            out.push_str(&" ".repeat(pad));
            if i == 0 && !inst.text.is_empty() {
                out.push_str("  ");
                out.push_str(&self.highlight_instruction(&inst.text));
            }
            out.push('\n');
        }
        out
    }

    /// Hex pairs with alternating colors every 4 digits, so byte pairs are
    /// readable in long encodings.
    fn grouped_hex(&self, bytes: &[u8]) -> String {
        let mut out = String::new();
        for (i, pair) in bytes.chunks(2).enumerate() {
            let (hex, _) = format_bytes(pair);
            let code = if i % 2 == 0 { color::CYAN } else { color::BLUE };
            out.push_str(&self.painter.paint(code, &hex));
        }
        out
    }

    fn highlight_instruction(&self, text: &str) -> String {
        if !self.painter.enabled() {
            return text.to_string();
        }
        let (mnemonic, rest) = match text.split_once(char::is_whitespace) {
            Some((m, r)) => (m, r),
            None => (text, ""),
        };
        let mut out = self.painter.paint_bold(color::GREEN, mnemonic);
        if rest.is_empty() {
            return out;
        }
        out.push(' ');
        // Color the comment tail separately; objdump appends `# <target>`
        // annotations after the operands.
        let (operands, comment) = match rest.split_once('#') {
            Some((ops, c)) => (ops, Some(c)),
            None => (rest, None),
        };
        let colored = self
            .register_pat
            .replace_all(operands, |caps: &regex::Captures| {
                self.painter.paint(color::YELLOW, caps.get(0).unwrap().as_str())
            })
            .to_string();
        let colored = self
            .immediate_pat
            .replace_all(&colored, |caps: &regex::Captures| {
                self.painter.paint(color::BRIGHT_BLUE, caps.get(0).unwrap().as_str())
            })
            .to_string();
        out.push_str(&colored);
        if let Some(comment) = comment {
            out.push_str(&self.painter.paint(color::DIM, &format!("#{comment}")));
        }
        out
    }
}
