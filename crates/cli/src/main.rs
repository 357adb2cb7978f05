use anyhow::Result;
use cdev::report_error;
use cdev_core::color::ColorMode;
use clap::{Args, Parser, Subcommand};

mod commands;

/// Developer tooling for the colr C project.
///
/// This CLI is a thin wrapper around `cdev-core` (exposed in code as
/// `cdev_core`). All substantive logic lives in the library so it can be
/// tested thoroughly and reused from other frontends.
#[derive(Parser, Debug)]
#[command(name = "cdev", version, about = "Developer tooling for a C library project", long_about = None)]
struct Cli {
    /// Show debug info while running.
    #[arg(short = 'D', long, global = true)]
    debug: bool,

    /// When to use colors: auto, always, or never.
    #[arg(long, global = true, default_value = "auto")]
    color: String,

    #[command(subcommand)]
    command: Command,
}

/// Options shared by the commands that operate on a project checkout.
#[derive(Args, Debug, Clone)]
struct RootOpt {
    /// Project root directory. Defaults to the current working directory.
    #[arg(long, default_value = ".")]
    root: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Disassemble a binary and render it with aligned, colorized columns.
    Disasm {
        /// The binary to disassemble.
        binary: String,

        /// Only show these sections (e.g. `main`). May repeat.
        #[arg(short = 's', long = "section")]
        sections: Vec<String>,

        /// Skip sections matching these prefixes/suffixes. May repeat.
        #[arg(short = 'i', long = "ignore")]
        ignore_sections: Vec<String>,

        /// Disassembly syntax: att or intel.
        #[arg(long, default_value = "att")]
        syntax: String,

        /// Leave out the address column.
        #[arg(long)]
        no_addresses: bool,
    },

    /// Report unused, untested, and test-only symbols across the project.
    Unused(commands::unused::UnusedArgs),

    /// Find structurally thin tests in the BDD-style test sources.
    BadTests {
        #[command(flatten)]
        root: RootOpt,

        /// Show each bad test's code, not just its description.
        #[arg(short = 'f', long)]
        full: bool,
    },

    /// Colorized `cppcheck --errorlist`.
    CheckErrors {
        /// Only show errors matching this regex pattern.
        pattern: Option<String>,

        /// Only show errors with this severity level. May repeat.
        #[arg(short = 's', long = "severity")]
        severities: Vec<String>,
    },

    /// Run the test executable (or parse its XML reports) and pretty-print
    /// the results.
    TestReport(commands::report::ReportArgs),

    /// Compile a small C snippet against the project and run it.
    Snippet(commands::snippet::SnippetArgs),

    /// Replace strings in files, like `sed s/TARGET/REPL/` but simpler.
    Replace(commands::replace::ReplaceArgs),

    /// Convert a doxygen-style markdown file to plain markdown.
    Undoxy {
        /// The file to parse. Use - for stdin.
        file: String,

        /// File path for output. Default: stdout.
        output: Option<String>,

        /// Replace the first non-doxygen h1 header with this text; the old
        /// header becomes an h2.
        #[arg(short = 't', long)]
        title: Option<String>,

        /// Lines added after the replaced header, as its body. May repeat.
        #[arg(short = 'H', long = "header")]
        header_lines: Vec<String>,

        #[command(flatten)]
        root: RootOpt,
    },

    /// Colorize `make help` output piped through stdin.
    MakeHelp,

    /// Build Debian package staging trees for the project.
    Deb(commands::deb::DebArgs),
}

fn main() {
    let cli = Cli::parse();

    let mut builder = env_logger::Builder::from_default_env();
    if cli.debug {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();

    let mode = ColorMode::from_flag(&cli.color).unwrap_or(ColorMode::Auto);

    let result = run(cli.command, mode);
    let code = match result {
        Ok(code) => code,
        Err(err) => report_error(&err),
    };
    std::process::exit(code);
}

fn run(command: Command, mode: ColorMode) -> Result<i32> {
    match command {
        Command::Disasm { binary, sections, ignore_sections, syntax, no_addresses } => {
            commands::disasm::disasm_command(
                &binary,
                sections,
                ignore_sections,
                &syntax,
                no_addresses,
                mode,
            )
        }
        Command::Unused(args) => commands::unused::unused_command(args, mode),
        Command::BadTests { root, full } => {
            commands::unused::bad_tests_command(&root.root, full, mode)
        }
        Command::CheckErrors { pattern, severities } => {
            commands::checkerrors::check_errors_command(pattern.as_deref(), &severities, mode)
        }
        Command::TestReport(args) => commands::report::report_command(args, mode),
        Command::Snippet(args) => commands::snippet::snippet_command(args, mode),
        Command::Replace(args) => commands::replace::replace_command(args, mode),
        Command::Undoxy { file, output, title, header_lines, root } => {
            commands::markdown::undoxy_command(
                &file,
                output.as_deref(),
                title,
                header_lines,
                &root.root,
            )
        }
        Command::MakeHelp => commands::makehelp::make_help_command(mode),
        Command::Deb(args) => commands::deb::deb_command(args, mode),
    }
}
