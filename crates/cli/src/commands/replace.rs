use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use cdev::{confirm, read_stdin, EXIT_FAILURE};
use cdev_core::color::{self, ColorMode, Painter};
use cdev_core::error::try_pattern;
use cdev_core::replace::{
    changed_lines, collect_source_files, filter_files, parse_exts, parse_target, replace_text,
    rewrite_file,
};
use clap::Args;

#[derive(Args, Debug)]
pub struct ReplaceArgs {
    /// Regex pattern to replace.
    pub target: Option<String>,

    /// Replacement string.
    pub replacement: Option<String>,

    /// Target files for in-place rewriting/refactoring.
    pub paths: Vec<String>,

    /// Make the target case-insensitive.
    #[arg(short = 'i', long)]
    pub ignore_case: bool,

    /// Target file for replacements. stdin is used when absent.
    #[arg(short = 'f', long = "file")]
    pub in_file: Option<String>,

    /// Target file for output. stdout is used when absent.
    #[arg(short = 'o', long = "out")]
    pub out_file: Option<String>,

    /// Rewrite the input files in place.
    #[arg(short = 'r', long)]
    pub rewrite: bool,

    /// Rewrite with a preview: collect files recursively when none are
    /// given, show the changed lines, and ask before writing.
    #[arg(short = 'R', long)]
    pub refactor: bool,

    /// View the replaced lines before writing.
    #[arg(short = 'V', long)]
    pub view: bool,

    /// Comma or space separated extension list for --refactor, replacing
    /// the default source extensions.
    #[arg(short = 'e', long)]
    pub exts: Option<String>,

    /// Regex pattern for file paths to include.
    #[arg(short = 'I', long)]
    pub include: Option<String>,

    /// Regex pattern for file paths to exclude.
    #[arg(short = 'E', long)]
    pub exclude: Option<String>,

    /// List the files a refactor would search, then exit.
    #[arg(short = 'l', long)]
    pub list_files: bool,
}

/// Replace text on stdin/stdout, across a file pair, or in place over a
/// collected file set.
pub fn replace_command(args: ReplaceArgs, mode: ColorMode) -> Result<i32> {
    let painter = Painter::new(mode);

    let mut paths: Vec<PathBuf> = args.paths.iter().map(PathBuf::from).collect();
    if (args.refactor || args.list_files) && paths.is_empty() {
        let exts = parse_exts(args.exts.as_deref());
        paths = collect_source_files(Path::new("."), &exts);
    }
    if args.in_file.is_none() {
        let include = try_pattern(args.include.as_deref())?;
        let exclude = try_pattern(args.exclude.as_deref())?;
        paths = filter_files(paths, include.as_ref(), exclude.as_ref());
    }

    if args.list_files {
        for path in &paths {
            println!("{}", path.display());
        }
        return Ok(if paths.is_empty() { EXIT_FAILURE } else { 0 });
    }

    let target =
        args.target.as_deref().ok_or_else(|| anyhow!("Invalid argument, no target pattern."))?;
    let replacement = args.replacement.as_deref().unwrap_or_default();
    let pattern = parse_target(target, args.ignore_case)?;

    if args.rewrite || args.refactor {
        if paths.is_empty() {
            return Err(anyhow!("Invalid argument, no files to work with."));
        }
        let view = args.view || args.refactor;
        let mut total = 0;
        for path in &paths {
            if view {
                let body = match std::fs::read_to_string(path) {
                    Ok(body) => body,
                    // Binary files are not touched.
                    Err(_) => continue,
                };
                let changes = changed_lines(&body, &pattern, replacement);
                if changes.is_empty() {
                    continue;
                }
                println!("\n{}:", painter.paint(color::CYAN, &path.display().to_string()));
                for (number, before, after) in &changes {
                    println!(
                        "    {}: {}",
                        painter.paint(color::BRIGHT_CYAN, &number.to_string()),
                        before.trim(),
                    );
                    println!(
                        "    {}> {}",
                        " ".repeat(number.to_string().len()),
                        painter.paint(color::GREEN, after.trim()),
                    );
                }
                if !confirm(&format!("Write {} changed lines?", changes.len()))? {
                    continue;
                }
            }
            total += rewrite_file(path, &pattern, replacement)?;
        }
        println!(
            "\nReplaced {} lines in {} files.",
            painter.paint_bold(color::BLUE, &total.to_string()),
            paths.len(),
        );
        return Ok(if total > 0 { 0 } else { EXIT_FAILURE });
    }

    // Single in/out mode.
    let body = match &args.in_file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Invalid argument, cannot read file: {path}"))?,
        None => read_stdin()?,
    };
    let (replaced, changed) = replace_text(&body, &pattern, replacement);
    if args.view {
        for (number, before, after) in changed_lines(&body, &pattern, replacement) {
            println!("{number:>5}: {} > {}", before.trim(), painter.paint(color::GREEN, after.trim()));
        }
        if !confirm("Write the replaced text?")? {
            return Ok(EXIT_FAILURE);
        }
    }
    match &args.out_file {
        Some(path) => std::fs::write(path, replaced)
            .with_context(|| format!("Can't write to file: {path}"))?,
        None => print!("{replaced}"),
    }
    Ok(if changed > 0 { 0 } else { EXIT_FAILURE })
}
