use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use cdev::{read_stdin, EXIT_FAILURE};
use cdev_core::color::{ColorMode, Painter};
use cdev_core::report::{self, OutputStyle, TestSuites};
use clap::Args;

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Test executable to run, or (with --files) XML report files to
    /// parse. `-` reads a report from stdin.
    pub inputs: Vec<String>,

    /// Treat the arguments as XML report files instead of an executable.
    #[arg(short = 'f', long)]
    pub files: bool,

    /// Output style: color, raw, stdout, subunit, tap, xml, or xmlfile.
    #[arg(long, default_value = "color")]
    pub style: String,

    /// File name pattern for xmlfile mode; %g becomes the group name.
    #[arg(long, default_value = "cm_%g.xml")]
    pub file_fmt: String,
}

fn parse_style(s: &str) -> Result<OutputStyle> {
    match s {
        "color" => Ok(OutputStyle::Color),
        "raw" => Ok(OutputStyle::Raw),
        "stdout" => Ok(OutputStyle::Stdout),
        "subunit" => Ok(OutputStyle::Subunit),
        "tap" => Ok(OutputStyle::Tap),
        "xml" => Ok(OutputStyle::Xml),
        "xmlfile" => Ok(OutputStyle::XmlFile),
        other => Err(anyhow!("Invalid argument, not an output style: {other}")),
    }
}

/// Parse report files, or run the test executable and present its output.
pub fn report_command(args: ReportArgs, mode: ColorMode) -> Result<i32> {
    let style = parse_style(&args.style)?;
    let painter = Painter::new(mode);

    if args.files {
        if args.inputs.is_empty() {
            return Err(anyhow!("Invalid argument, no report files given."));
        }
        return parse_files(&args.inputs, style, &painter);
    }

    let exe = args
        .inputs
        .first()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("test/test_colr"));
    let outcome = report::run_test_exe(&exe, style, Some(&args.file_fmt))?;
    match outcome.suites {
        Some(suites) => {
            print!("{}", report::render(&suites, style, &painter));
            Ok(if suites.failures > 0 { EXIT_FAILURE } else { outcome.exit_code })
        }
        None => {
            // Passthrough styles: the binary already formatted its output.
            print!("{}", outcome.stdout);
            if !outcome.stderr.is_empty() {
                eprint!("{}", outcome.stderr);
            }
            Ok(outcome.exit_code)
        }
    }
}

fn parse_files(inputs: &[String], style: OutputStyle, painter: &Painter) -> Result<i32> {
    let mut failures = 0;
    for input in inputs {
        let body = if input == "-" {
            read_stdin()?
        } else {
            match std::fs::read_to_string(Path::new(input)) {
                Ok(body) => body,
                Err(e) => {
                    eprintln!("Unable to read file: {input}\n    {e}");
                    failures += 1;
                    continue;
                }
            }
        };
        let suites = TestSuites::from_output(&body)?;
        print!("{}", report::render(&suites, style, painter));
        failures += suites.failures;
    }
    Ok(if failures > 0 { EXIT_FAILURE } else { 0 })
}
