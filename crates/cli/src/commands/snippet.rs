use std::path::Path;
use std::process::Command;

use anyhow::{anyhow, Context, Result};
use cdev::{canonicalize_or_current, read_stdin, EXIT_FAILURE};
use cdev_core::color::{self, ColorMode, Painter};
use cdev_core::error::{try_pattern, UserCancelled};
use cdev_core::project::ProjectLayout;
use cdev_core::settings::Settings;
use cdev_core::snippet::{self, Snippet};
use clap::Args;

#[derive(Args, Debug)]
pub struct SnippetArgs {
    /// Code to compile. It is wrapped in a main() function with the
    /// project headers included. Default: stdin.
    pub code: Option<String>,

    /// Project root directory. Defaults to the current working directory.
    #[arg(long, default_value = ".")]
    pub root: String,

    /// Read snippets to compile from these files.
    #[arg(short = 'f', long = "file")]
    pub files: Vec<String>,

    /// Re-run the last snippet.
    #[arg(short = 'l', long)]
    pub last: bool,

    /// Edit the last snippet in $EDITOR and run it.
    #[arg(short = 'e', long)]
    pub edit_last: bool,

    /// With --edit-last: edit the wrapped .c file instead of the raw
    /// snippet.
    #[arg(short = 'w', long)]
    pub wrapped: bool,

    /// Re-run the last binary that was compiled.
    #[arg(short = 'b', long)]
    pub last_binary: bool,

    /// Compile and run the examples embedded in the source docs,
    /// optionally filtered by a pattern against their descriptions.
    #[arg(short = 'E', long)]
    pub examples: bool,

    /// List the example snippets found in the source without running.
    #[arg(short = 'L', long)]
    pub list_examples: bool,

    /// Pattern filter for --examples.
    pub pattern: Option<String>,

    /// Clean temp files left over from snippet runs.
    #[arg(short = 'c', long)]
    pub clean: bool,

    /// Run a program on the compiled binary, like `gdb` or `kdbg`.
    #[arg(short = 'r', long = "run")]
    pub wrapper: Option<String>,

    /// Print the resulting binary name, for further testing.
    #[arg(short = 'n', long)]
    pub name: bool,

    /// Don't print any status messages.
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Extra arguments for the compiler (after `--`).
    #[arg(last = true)]
    pub compiler_args: Vec<String>,
}

/// Dispatcher for the snippet modes: clean, list/run examples, re-run
/// last, edit last, or compile the given code.
pub fn snippet_command(args: SnippetArgs, mode: ColorMode) -> Result<i32> {
    let painter = Painter::new(mode);
    let root = canonicalize_or_current(&args.root)?;
    let layout = ProjectLayout::new(&root);
    let mut settings = Settings::load(&layout.snippet_settings_path)?;

    if args.clean {
        let removed = snippet::clean_temp()?;
        if !args.quiet {
            let plural = if removed == 1 { "file" } else { "files" };
            println!(
                "Cleaned {} temporary {plural} in: {}",
                painter.paint_bold(color::BLUE, &removed.to_string()),
                snippet::temp_dir().display(),
            );
        }
        return Ok(if removed > 0 { 0 } else { EXIT_FAILURE });
    }
    if args.list_examples {
        return list_examples(&layout, &painter);
    }
    if args.examples {
        return run_examples(&args, &layout, &mut settings, &painter);
    }
    if args.last_binary {
        let binary = settings
            .last_binary
            .clone()
            .ok_or_else(|| anyhow!("Invalid argument, no \"last binary\" found."))?;
        return run_one(Path::new(&binary), &args, &painter);
    }

    let snippets = collect_snippets(&args, &settings)?;
    let errs = run_snippets(&snippets, &args, &layout, &mut settings, &painter)?;
    settings.save(&layout.snippet_settings_path)?;
    Ok(if errs > 0 { EXIT_FAILURE } else { 0 })
}

fn collect_snippets(args: &SnippetArgs, settings: &Settings) -> Result<Vec<Snippet>> {
    if !args.files.is_empty() {
        let mut snippets = Vec::new();
        for file in &args.files {
            let body = std::fs::read_to_string(file)
                .with_context(|| format!("Failed to read snippet file: {file}"))?;
            snippets.push(Snippet::new(body, file.clone()));
        }
        return Ok(snippets);
    }
    if args.edit_last {
        let last = settings
            .last_snippet
            .clone()
            .ok_or_else(|| anyhow!("Invalid argument, no \"last snippet\" found."))?;
        let edited = if args.wrapped {
            let c_file = settings
                .last_c_file
                .clone()
                .ok_or_else(|| anyhow!("Invalid argument, no \"last file\" found."))?;
            edit_snippet(settings, Path::new(&c_file), None)?
        } else {
            edit_snippet(settings, Path::new(""), Some(&last))?
        };
        return Ok(vec![Snippet::new(edited, "edited-snippet")]);
    }
    if args.last {
        let last = settings
            .last_snippet
            .clone()
            .ok_or_else(|| anyhow!("Invalid argument, no \"last snippet\" found."))?;
        return Ok(vec![Snippet::new(last, "last-snippet")]);
    }
    match &args.code {
        Some(code) if !code.trim().is_empty() => {
            Ok(vec![Snippet::new(code.clone(), "cmdline-snippet")])
        }
        _ => Ok(vec![Snippet::new(read_stdin()?, "stdin")]),
    }
}

/// Open the snippet in the editor, then read back the usable lines. An
/// empty or fully commented-out result cancels the run.
fn edit_snippet(settings: &Settings, filepath: &Path, text: Option<&str>) -> Result<String> {
    let marker = "// cdev snippet editing";
    let header = format!(
        "{marker}\n// If this file is empty, or all lines are commented out with\n// single-line comments, the process is cancelled.\n"
    );
    let path = if let Some(text) = text {
        snippet::write_edit_file(&header, text).context("Failed to create snippet temp file")?
    } else {
        // Editing the wrapped file in place; prepend the marker once.
        let body = std::fs::read_to_string(filepath)
            .with_context(|| format!("Failed to read: {}", filepath.display()))?;
        if !body.lines().next().unwrap_or("").contains(marker) {
            std::fs::write(filepath, format!("{header}{body}"))
                .with_context(|| format!("Failed to write header to: {}", filepath.display()))?;
        }
        filepath.to_path_buf()
    };

    let editor = settings.resolve_editor();
    let status = Command::new(&editor)
        .arg(&path)
        .status()
        .with_context(|| format!("Failed to edit last snippet with: {editor}"))?;
    if !status.success() {
        return Err(anyhow!("Editor ({editor}) returned non-zero!"));
    }

    let body = std::fs::read_to_string(&path)?;
    let usable: Vec<&str> =
        body.lines().filter(|l| !l.trim_start().starts_with("//")).collect();
    if usable.iter().all(|l| l.trim().is_empty()) {
        return Err(UserCancelled.into());
    }
    Ok(usable.join("\n"))
}

/// Compile and run several snippets. Returns how many runs failed.
fn run_snippets(
    snippets: &[Snippet],
    args: &SnippetArgs,
    layout: &ProjectLayout,
    settings: &mut Settings,
    painter: &Painter,
) -> Result<i32> {
    let mut errs = 0;
    for snip in snippets {
        if snip.is_empty() {
            continue;
        }
        if !args.quiet {
            println!(
                "{}: {}",
                painter.paint(color::CYAN, "Compiling"),
                snippet::format_leader(snip, painter),
            );
        }
        settings.last_snippet = Some(snip.code.clone());
        let binary = snip.compile(layout, &args.compiler_args)?;
        settings.last_binary = Some(binary.display().to_string());
        settings.last_c_file = Some(binary.with_extension("c").display().to_string());
        if run_one(&binary, args, painter)? != 0 {
            errs += 1;
        }
    }
    Ok(errs)
}

fn run_one(binary: &Path, args: &SnippetArgs, painter: &Painter) -> Result<i32> {
    if args.name && !args.quiet {
        let mut name = painter.paint_bold(color::BLUE, &binary.display().to_string());
        if let Some(exe) = &args.wrapper {
            name = format!("{} {name}", painter.paint(color::BLUE, exe));
        }
        println!("{}: {name}", painter.paint(color::CYAN, "  Running"));
    }
    let run = snippet::run_compiled(binary, args.wrapper.as_deref())?;
    if !run.stdout.is_empty() {
        println!("{}", run.stdout);
    }
    if !run.stderr.is_empty() {
        eprintln!("{}", run.stderr);
    }
    Ok(run.exit_code)
}

fn list_examples(layout: &ProjectLayout, painter: &Painter) -> Result<i32> {
    let sources = layout.library_files();
    let found = snippet::find_src_examples(&sources);
    if found.is_empty() {
        eprintln!("No example snippets found.");
        return Ok(EXIT_FAILURE);
    }
    let mut total = 0;
    for (path, snippets) in &found {
        total += snippets.len();
        println!("\n{}:", painter.paint(color::CYAN, &path.display().to_string()));
        for snip in snippets {
            println!("\n    {}:", snippet::format_leader(snip, painter));
            for line in snip.code.lines().skip(1) {
                println!("    {line}");
            }
        }
    }
    let plural = if total == 1 { "snippet" } else { "snippets" };
    println!("\nFound {} {plural}.", painter.paint_bold(color::BLUE, &total.to_string()));
    Ok(if total > 0 { 0 } else { EXIT_FAILURE })
}

fn run_examples(
    args: &SnippetArgs,
    layout: &ProjectLayout,
    settings: &mut Settings,
    painter: &Painter,
) -> Result<i32> {
    // With --examples the first positional is the filter pattern, not code.
    let pat = try_pattern(args.pattern.as_deref().or(args.code.as_deref()))?;
    let sources = layout.library_files();
    let mut errs = 0;
    let mut success = 0;
    let mut skipped = 0;
    let mut total = 0;

    for (path, snippets) in snippet::find_src_examples(&sources) {
        let mut use_snippets = Vec::new();
        for snip in snippets {
            total += 1;
            if pat.as_ref().is_some_and(|p| p.find(&snip.name).is_none()) {
                log::debug!("skipping snippet for pattern: {}", snip.name);
                skipped += 1;
                continue;
            }
            use_snippets.push(snip);
        }
        if use_snippets.is_empty() {
            continue;
        }
        if !args.quiet {
            let plural = if use_snippets.len() == 1 { "snippet" } else { "snippets" };
            println!(
                "\nCompiling {} {plural} for: {}",
                painter.paint_bold(color::BLUE, &use_snippets.len().to_string()),
                painter.paint_bold(color::BLUE, &path.display().to_string()),
            );
        }
        let count = use_snippets.len();
        let file_errs = run_snippets(&use_snippets, args, layout, settings, painter)?;
        errs += file_errs;
        success += count.saturating_sub(file_errs as usize);
    }
    settings.save(&layout.snippet_settings_path)?;

    if !args.quiet {
        println!(
            "\n{}: ({}: {} {}: {} {}: {} {}: {})",
            painter.paint(color::CYAN, "Snippets"),
            painter.paint(color::CYAN, "Success"),
            painter.paint_bold(if success > 0 { color::GREEN } else { color::RED }, &success.to_string()),
            painter.paint(color::CYAN, "Total"),
            painter.paint_bold(if total > 0 { color::BLUE } else { color::RED }, &total.to_string()),
            painter.paint(color::CYAN, "Skipped"),
            painter.paint_bold(if skipped > 0 { color::BLUE } else { color::DIM }, &skipped.to_string()),
            painter.paint(color::CYAN, "Error"),
            painter.paint_bold(if errs > 0 { color::RED } else { color::DIM }, &errs.to_string()),
        );
    }
    Ok(if errs > 0 { EXIT_FAILURE } else { 0 })
}
