use std::path::Path;

use anyhow::{anyhow, Result};
use cdev::{canonicalize_or_current, EXIT_FAILURE};
use cdev_core::color::{ColorMode, Painter};
use cdev_core::error::try_pattern;
use cdev_core::project::ProjectLayout;
use cdev_core::testdesc;
use cdev_core::usage::{self, cppcheck, NameKind, SortKey, UsageReport};
use clap::Args;

#[derive(Args, Debug)]
pub struct UnusedArgs {
    /// Only show names matching this regex/text pattern.
    pub pattern: Option<String>,

    /// Project root directory. Defaults to the current working directory.
    #[arg(long, default_value = ".")]
    pub root: String,

    /// Show everything the static analyzer thinks is unused, marking
    /// false positives instead of dropping them.
    #[arg(short = 'a', long)]
    pub all: bool,

    /// Show test dependencies.
    #[arg(short = 'd', long)]
    pub testdeps: bool,

    /// Show untested symbols.
    #[arg(short = 't', long)]
    pub untested: bool,

    /// Use only functions, not function-like macros.
    #[arg(short = 'F', long)]
    pub only_funcs: bool,

    /// Use only function-like macros.
    #[arg(short = 'M', long)]
    pub only_macros: bool,

    /// Gather info about the tests, not the project.
    #[arg(short = 'T', long)]
    pub check_tests: bool,

    /// Show only symbols used in the examples.
    #[arg(short = 'e', long)]
    pub examples: bool,

    /// Show only symbols not used in the examples.
    #[arg(short = 'E', long)]
    pub no_examples: bool,

    /// Show full info: per-file counts and matched source lines.
    #[arg(short = 'f', long)]
    pub full: bool,

    /// Show just the names in the final report.
    #[arg(short = 'n', long)]
    pub names: bool,

    /// Show all candidate names, before any usage counting. Like -a -n.
    #[arg(short = 'N', long)]
    pub list_names: bool,

    /// Show raw JSON info.
    #[arg(short = 'r', long)]
    pub raw: bool,

    /// Load info from a JSON file instead of scanning.
    #[arg(short = 'j', long = "json")]
    pub json_file: Option<String>,

    /// Write raw JSON info to a file. Implies --all.
    #[arg(short = 'o', long)]
    pub out: Option<String>,

    /// Sort names by this key. Names are always sorted alphabetically
    /// before the key applies.
    #[arg(short = 'S', long = "sortby")]
    pub sort_by: Option<String>,

    /// Print the color-code legend.
    #[arg(short = 'l', long)]
    pub legend: bool,
}

/// Gather candidate names, count their occurrences, filter, and report.
pub fn unused_command(args: UnusedArgs, mode: ColorMode) -> Result<i32> {
    let painter = Painter::new(mode);
    if args.legend {
        print!("{}", usage::render_legend(&painter));
        return Ok(0);
    }
    if args.only_funcs && args.only_macros {
        return Err(anyhow!("Invalid argument, -F and -M are mutually exclusive."));
    }

    let root = canonicalize_or_current(&args.root)?;
    let layout = ProjectLayout::new(&root);
    let pat = try_pattern(args.pattern.as_deref())?;

    let mut report = if let Some(json_file) = &args.json_file {
        let mut report = UsageReport::from_json_file(Path::new(json_file))?;
        report.filter_pattern(pat.as_ref());
        if args.list_names {
            print!("{}", usage::render_names(&report, &painter));
            return Ok(if report.is_empty() { EXIT_FAILURE } else { 0 });
        }
        if args.only_funcs {
            report.only_functions();
        } else if args.only_macros {
            report.only_macros();
        }
        report
    } else {
        let names = gather_names(&args, &layout, pat.as_ref())?;
        if names.is_empty() {
            eprintln!("No names to use.");
            return Ok(EXIT_FAILURE);
        }
        if args.list_names {
            let report = UsageReport::new(names);
            print!("{}", usage::render_names(&report, &painter));
            return Ok(0);
        }
        let corpus = if args.check_tests {
            layout.test_files()?
        } else {
            layout.scan_corpus()?
        };
        UsageReport::new(usage::check_files(&corpus, names)?)
    };

    if args.examples || args.no_examples {
        report.filter_examples(args.examples);
    }
    if report.is_empty() {
        eprintln!("No info to use!");
        return Ok(EXIT_FAILURE);
    }

    if args.all || args.out.is_some() {
        // Keep false-positives, but mark them as such.
        report.filter_used(false, false, true);
    } else {
        // All macro names are gathered; not all of them are unused. The
        // analyzer also has false positives worth weeding out.
        report.filter_used_macros();
        report.filter_used(args.untested, args.testdeps, false);
    }

    let sort_key = match &args.sort_by {
        Some(key) => SortKey::parse(key)?,
        None => SortKey::Name,
    };
    report.sort_by_key(sort_key);

    let found = !report.is_empty();
    if args.full {
        print!("{}", usage::render_full(&report, &painter));
    } else if args.names {
        print!("{}", usage::render_names(&report, &painter));
    } else if let Some(out) = &args.out {
        std::fs::write(out, report.to_json()?)?;
        println!("Wrote info to: {out}");
        return Ok(0);
    } else if args.raw {
        println!("{}", report.to_json()?);
        return Ok(if found { 0 } else { EXIT_FAILURE });
    } else {
        print!("{}", usage::render_simple(&report, &painter));
    }
    if !args.names {
        print_footer(&args, &report);
    }
    Ok(if found { 0 } else { EXIT_FAILURE })
}

fn gather_names(
    args: &UnusedArgs,
    layout: &ProjectLayout,
    pat: Option<&regex::Regex>,
) -> Result<Vec<usage::NameUsage>> {
    let mut names = Vec::new();
    if !args.only_macros {
        names.extend(cppcheck::cached_unused_names(layout, args.check_tests, pat)?);
        if args.only_funcs && names.is_empty() {
            eprintln!("No unused functions reported by the analyzer.");
        }
    }
    if !args.only_funcs {
        let headers = if args.check_tests {
            layout.test_macro_headers()?
        } else {
            layout.macro_headers()
        };
        let kind = if args.check_tests { NameKind::TestMacro } else { NameKind::Macro };
        names.extend(usage::macro_names(&headers, kind, pat)?);
    }
    Ok(names)
}

fn print_footer(args: &UnusedArgs, report: &UsageReport) {
    let count = report.len();
    let mut plural = if args.only_macros {
        if count == 1 { "macro" } else { "macros" }.to_string()
    } else if args.only_funcs {
        if count == 1 { "function" } else { "functions" }.to_string()
    } else {
        if count == 1 { "function/macro" } else { "functions/macros" }.to_string()
    };
    let method = if args.untested {
        "untested"
    } else if args.testdeps {
        "unused test dependencies"
    } else {
        "unused"
    };
    if args.all && !args.only_macros {
        plural = format!("{plural} (some reported by cppcheck)");
    }
    if args.examples {
        plural = format!("{plural} with examples");
    } else if args.no_examples {
        plural = format!("{plural} without examples");
    }
    println!("\nFound {count} possibly {method} {plural}.");
}

/// Print the bad-test report for the project's test directory.
pub fn bad_tests_command(root: &str, full: bool, mode: ColorMode) -> Result<i32> {
    let root = canonicalize_or_current(root)?;
    let layout = ProjectLayout::new(&root);
    let painter = Painter::new(mode);

    let files = layout.test_files()?;
    let bad = testdesc::bad_test_files(&files)?;
    if bad.is_empty() {
        println!("No bad tests found :).");
        return Ok(0);
    }
    let mut total = 0;
    for file in &bad {
        total += file.test_count();
        println!("\n{}", file.formatted(&painter, full));
    }
    println!("\nPossibly bad tests: {total}");
    Ok(EXIT_FAILURE)
}
