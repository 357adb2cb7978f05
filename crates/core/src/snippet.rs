//! Snippet compilation and execution.
//!
//! A snippet is a fragment of C that gets wrapped in a `main()` with the
//! project headers included, compiled with the same flags a `make` dry
//! run reports, linked against the project object, and executed. The
//! wrapped source and the binary land in the shared temp directory under
//! a recognizable prefix so `--clean` can sweep them later.
//!
//! Two runs against the same working directory can race on the
//! intermediate object files (they are compiled into the current
//! directory, the way the build does it); there is no locking here.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::color::{self, Painter};
use crate::exec;
use crate::project::ProjectLayout;

/// Prefix for every temp artifact this module writes.
pub const TMP_PREFIX: &str = "cdevsnippet";

/// Predefined convenience macros injected into wrapped snippets.
pub const MACROS: [(&str, &str, &str); 2] = [
    ("print", "#define print(s) printf(\"%s\\n\", s)", "Wrapper for printf(\"%s\\n\", s)."),
    (
        "print_repr",
        "#define print_repr(x) printf(\"%s\\n\", colr_repr(x))",
        "Wrapper for printf(\"%s\\n\", colr_repr(x)).",
    ),
];

#[derive(Debug, Error)]
pub enum SnippetError {
    #[error("Can't compile snippet: {}", .0.display())]
    Compile(PathBuf),
    #[error("Failed to edit last snippet: {0}")]
    Edit(String),
    #[error("failed to run make dry run: {0}")]
    MakeDryRun(String),
    #[error("failed to run compiler: {0}")]
    Compiler(String),
    #[error("Snippet failed to run: {0}")]
    Run(String),
    #[error("Cannot write snippet file: {0}")]
    Write(std::io::Error),
}

/// A snippet is just code with a display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snippet {
    pub code: String,
    pub name: String,
}

impl Snippet {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self { code: code.into(), name: name.into() }
    }

    pub fn is_empty(&self) -> bool {
        self.code.trim().is_empty()
    }

    /// Returns true if the line looks like a `main()` signature.
    fn is_main_sig(line: &str) -> bool {
        line.starts_with("int main") || line.starts_with("void main") || line.starts_with("main(")
    }

    /// Wrap the snippet in a `main()` definition with the project headers
    /// included. Present includes, macro definitions, and an existing
    /// `main()` are not duplicated.
    pub fn wrap_code(&self, layout: &ProjectLayout) -> String {
        let line_table: Vec<&str> = self.code.lines().map(str::trim).collect();
        let mut lines: Vec<String> = Vec::new();

        for header in [&layout.lib_header, &layout.debug_header] {
            let file_name = header.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            let include = format!("#include \"{file_name}\"");
            if line_table.contains(&include.as_str()) {
                log::debug!("not including {file_name}");
                continue;
            }
            log::debug!("including {file_name}");
            lines.push(include);
        }

        for (name, define, _) in MACROS {
            if line_table.contains(&define) {
                log::debug!("not including macro: {name}");
                continue;
            }
            log::debug!("including macro: {name}");
            lines.push(format!("#ifndef {name}"));
            lines.push(define.to_string());
            lines.push(format!("#endif // ifdef {name}"));
        }

        if line_table.iter().any(|l| Self::is_main_sig(l)) {
            log::debug!("no main() needed");
            lines.push(self.code.clone());
        } else {
            let indent = if self.code.trim_start().chars().next() == self.code.chars().next() {
                4
            } else {
                0
            };
            lines.push(self.wrap_main(indent));
        }
        lines.join("\n")
    }

    /// Wrap the code in a `main()` function, choosing the signature from
    /// whether the snippet mentions argc/argv.
    fn wrap_main(&self, indent: usize) -> String {
        let main_sig = if self.code.contains("argc") || self.code.contains("argv") {
            "int main(int argc, char* argv[])"
        } else {
            "int main(void)"
        };
        let mut code = self.code.trim_end().to_string();
        if !code.ends_with(';') && !code.ends_with('}') {
            log::debug!("adding semi-colon to code");
            code.push(';');
        }
        if indent > 0 {
            let spaces = " ".repeat(indent);
            code = code
                .lines()
                .map(|l| format!("{spaces}{l}"))
                .collect::<Vec<_>>()
                .join("\n");
        }
        format!("{main_sig} {{\n{code}\n}}")
    }

    /// Compile the snippet and return the path of the produced binary.
    pub fn compile(
        &self,
        layout: &ProjectLayout,
        user_args: &[String],
    ) -> Result<PathBuf, SnippetError> {
        let wrapped = self.wrap_code(layout);
        let c_path = write_snippet_file(&wrapped)?;
        let flags = make_flags(layout, user_args)?;

        let compile_cmd = gcc_cmd(layout, &[c_path.clone(), layout.lib_source.clone()], None, &flags);
        log::debug!("compiling C files: {compile_cmd:?}");
        if !run_gcc(&compile_cmd)? {
            return Err(SnippetError::Compile(c_path));
        }

        let mut objects = temp_objects()?;
        objects.push(layout.lib_source.with_extension("o"));
        let binary = temp_binary_path(&wrapped);
        let link_cmd = gcc_cmd(layout, &objects, Some(&binary), &flags);
        log::debug!("linking object files: {link_cmd:?}");
        let linked = run_gcc(&link_cmd)?;
        clean_objects(&temp_objects()?);
        if !linked || !binary.exists() {
            return Err(SnippetError::Compile(c_path));
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&binary, fs::Permissions::from_mode(0o700))
                .map_err(SnippetError::Write)?;
        }
        Ok(binary)
    }
}

/// Where this module keeps its temp artifacts.
pub fn temp_dir() -> PathBuf {
    env::temp_dir()
}

/// Write wrapped snippet code to a content-addressed temp file.
///
/// Hashing the content keeps names unique across concurrent runs without
/// a counter file, and recompiling the same snippet reuses the same path.
fn write_snippet_file(wrapped: &str) -> Result<PathBuf, SnippetError> {
    let digest = Sha256::digest(wrapped.as_bytes());
    let tag = format!("{digest:x}");
    let path = temp_dir().join(format!("{TMP_PREFIX}-{}.c", &tag[..12]));
    fs::write(&path, wrapped).map_err(SnippetError::Write)?;
    log::debug!("wrote code to: {}", path.display());
    Ok(path)
}

fn temp_binary_path(wrapped: &str) -> PathBuf {
    let digest = Sha256::digest(wrapped.as_bytes());
    let tag = format!("{digest:x}");
    temp_dir().join(format!("{TMP_PREFIX}-{}.binary", &tag[..12]))
}

/// gcc flags recovered from a `make -B -n` dry run: every `-` flag on the
/// `gcc` lines except `-c` and `-o`.
pub fn make_flags(layout: &ProjectLayout, user_args: &[String]) -> Result<Vec<String>, SnippetError> {
    let make = env::var_os("CDEV_MAKE").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("make"));
    let mut args: Vec<String> = user_args.to_vec();
    args.push("-B".to_string());
    args.push("-n".to_string());
    let output = Command::new(&make)
        .args(&args)
        .current_dir(&layout.root)
        .output()
        .map_err(|e| SnippetError::MakeDryRun(e.to_string()))?;
    if !output.status.success() {
        return Err(SnippetError::MakeDryRun(format!(
            "make exited with {}",
            output.status
        )));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut flags: Vec<String> = Vec::new();
    for line in stdout.lines() {
        if line.trim().is_empty() || !line.starts_with("gcc") {
            continue;
        }
        for arg in line.split_whitespace() {
            if arg.starts_with('-') && arg != "-c" && arg != "-o" && !flags.iter().any(|f| f == arg) {
                flags.push(arg.to_string());
            }
        }
    }
    log::debug!("flags from make: {}", flags.join(" "));
    Ok(flags)
}

/// Build a gcc command line for compiling or linking snippet pieces.
fn gcc_cmd(
    layout: &ProjectLayout,
    input_files: &[PathBuf],
    output_file: Option<&Path>,
    flags: &[String],
) -> Vec<String> {
    let mut cmd = vec!["gcc".to_string()];
    if input_files.iter().any(|f| f.extension().and_then(|e| e.to_str()) == Some("c")) {
        cmd.push("-c".to_string());
    }
    cmd.extend(input_files.iter().map(|f| f.display().to_string()));
    if let Some(out) = output_file {
        cmd.push("-o".to_string());
        cmd.push(out.display().to_string());
    }
    cmd.push(format!("-iquote{}", layout.root.display()));
    cmd.extend(flags.iter().cloned());
    cmd
}

/// Run a gcc command, inheriting stdio so diagnostics reach the user.
/// Returns whether it exited zero.
fn run_gcc(cmd: &[String]) -> Result<bool, SnippetError> {
    let status = Command::new(&cmd[0])
        .args(&cmd[1..])
        .status()
        .map_err(|e| SnippetError::Compiler(e.to_string()))?;
    Ok(status.success())
}

/// Object files a compile left in the current directory.
fn temp_objects() -> Result<Vec<PathBuf>, SnippetError> {
    let mut objects = Vec::new();
    for entry in fs::read_dir(".").map_err(SnippetError::Write)? {
        let path = entry.map_err(SnippetError::Write)?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with(TMP_PREFIX) && name.ends_with(".o") {
            objects.push(path);
        }
    }
    Ok(objects)
}

fn clean_objects(paths: &[PathBuf]) {
    log::debug!("removing temporary object files");
    for path in paths {
        if path.exists() {
            let _ = fs::remove_file(path);
        }
    }
}

/// Write text to a fresh prefixed temp file for editing, and keep it past
/// the handle's lifetime so an editor can be pointed at it.
pub fn write_edit_file(header: &str, text: &str) -> std::io::Result<PathBuf> {
    let file = tempfile::Builder::new()
        .prefix(&format!("{TMP_PREFIX}-last_snippet"))
        .suffix(".c")
        .tempfile_in(temp_dir())?;
    let (mut handle, path) = file.keep().map_err(|e| e.error)?;
    use std::io::Write;
    handle.write_all(header.as_bytes())?;
    handle.write_all(text.as_bytes())?;
    Ok(path)
}

/// Remove every prefixed artifact from the temp directory. Returns how
/// many files went away.
pub fn clean_temp() -> std::io::Result<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(temp_dir())? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with(TMP_PREFIX) {
            fs::remove_file(&path)?;
            log::debug!("removed: {}", path.display());
            removed += 1;
        }
    }
    Ok(removed)
}

/// Captured result of running a compiled snippet.
pub struct SnippetRun {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Run a compiled snippet binary, optionally under a wrapper program
/// (`gdb`, `valgrind`, ...). When the program produced no output at all, a
/// placeholder message lands in stderr so the user sees something happened.
pub fn run_compiled(binary: &Path, wrapper: Option<&str>) -> Result<SnippetRun, SnippetError> {
    let captured = match wrapper {
        Some(exe) => exec::run_capture(Path::new(exe), [binary.as_os_str()]),
        None => exec::run_capture(binary, std::iter::empty::<&str>()),
    }
    .map_err(|e| SnippetError::Run(e.to_string()))?;

    let mut stderr = captured.stderr;
    if captured.stdout.is_empty() && stderr.is_empty() {
        stderr = format!(
            "   Source: {}.c\n           <no output from {}>\n",
            binary.display(),
            binary.display()
        );
    }
    Ok(SnippetRun {
        exit_code: captured.code.unwrap_or(1),
        stdout: captured.stdout,
        stderr,
    })
}

/// Find `\examplecode` blocks in the project sources.
///
/// Blocks open with a `\examplecode` (or `\examplecodefor{Name,...}`) doc
/// tag mentioning `.c` and close with `\endexamplecode`; body lines are
/// dedented by the indentation of the first line.
pub fn find_src_examples(files: &[PathBuf]) -> Vec<(PathBuf, Vec<Snippet>)> {
    let mut found = Vec::new();
    for path in files {
        let Ok(body) = fs::read_to_string(path) else {
            continue;
        };
        let snippets = find_file_examples(&body);
        if !snippets.is_empty() {
            found.push((path.clone(), snippets));
        }
    }
    found
}

fn find_file_examples(body: &str) -> Vec<Snippet> {
    let mut snippets = Vec::new();
    let mut current: Option<Vec<String>> = None;
    let mut tab_cnt = 0;
    let mut space_cnt = 0;
    for line in body.lines() {
        let stripped = line.trim_start();
        if stripped.starts_with("\\endexamplecode") {
            if let Some(lines) = current.take() {
                let name = lines.first().cloned().unwrap_or_default();
                snippets.push(Snippet::new(lines.join("\n"), name));
            }
        } else if stripped.starts_with("\\examplecode") && stripped.contains(".c") {
            let leader = if let Some(rest) = stripped.strip_prefix("\\examplecodefor{") {
                let name = rest.split(',').next().unwrap_or("").trim();
                format!("Example code for {name}")
            } else {
                "Example code for an unknown snippet".to_string()
            };
            current = Some(vec![format!("// {leader}")]);
            tab_cnt = 0;
            space_cnt = 0;
        } else if let Some(lines) = current.as_mut() {
            if lines.len() == 1 {
                tab_cnt = line.chars().take_while(|c| *c == '\t').count();
                space_cnt = line.chars().take_while(|c| *c == ' ').count();
            }
            let trimmed = if line.starts_with('\t') {
                line.chars().skip(tab_cnt).collect::<String>()
            } else if line.starts_with("    ") {
                line.chars().skip(space_cnt).collect::<String>()
            } else {
                line.to_string()
            };
            lines.push(trimmed);
        }
    }
    snippets
}

/// Pretty header line for a snippet: its leading comment, or a fallback
/// for unnamed code.
pub fn format_leader(snippet: &Snippet, painter: &Painter) -> String {
    let first = snippet.name.lines().next().unwrap_or("").trim_start();
    if let Some(rest) = first.strip_prefix("//") {
        let text = rest.trim_start();
        if let Some(name) = text.strip_prefix("Example code for ") {
            return format!(
                "{} {}",
                painter.paint(color::BLUE, "Example code for"),
                painter.paint_bold(color::BLUE, name),
            );
        }
        return painter.paint(color::BLUE, text);
    }
    if first.is_empty() {
        return painter.paint(color::BLUE, "Uncommented/unknown snippet");
    }
    painter.paint(color::BLUE, first)
}
