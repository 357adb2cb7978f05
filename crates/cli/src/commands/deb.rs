use std::path::Path;

use anyhow::Result;
use cdev::canonicalize_or_current;
use cdev_core::color::{ColorMode, Painter};
use cdev_core::debpkg::{host_architecture, project_version, standard_packages};
use clap::Args;

#[derive(Args, Debug)]
pub struct DebArgs {
    /// Project root directory. Defaults to the current working directory.
    #[arg(long, default_value = ".")]
    pub root: String,

    /// Make all packages (colr and libcolr).
    #[arg(short = 'a', long)]
    pub all: bool,

    /// Create the libcolr package instead of the colr tool.
    #[arg(short = 'l', long)]
    pub lib: bool,

    /// Destination directory for the staging trees.
    #[arg(short = 'd', long = "dir")]
    pub dest: Option<String>,

    /// List package files, don't create anything.
    #[arg(short = 'L', long)]
    pub list: bool,

    /// Don't print status messages, only the resulting package names.
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

/// Stage (or list) the Debian package trees for the project.
pub fn deb_command(args: DebArgs, mode: ColorMode) -> Result<i32> {
    let painter = Painter::new(mode);
    let root = canonicalize_or_current(&args.root)?;

    let version = project_version(&root)?;
    let architecture = host_architecture()?;
    let packages = standard_packages(&root, &version, &architecture);

    let wanted: Vec<_> = if args.all {
        packages
    } else {
        let name = if args.lib { "libcolr" } else { "colr" };
        packages.into_iter().filter(|p| p.name == name).collect()
    };

    for package in &wanted {
        if args.list {
            println!("\n{}", package.describe(&painter));
            continue;
        }
        let staging = package.create(args.dest.as_deref().map(Path::new))?;
        if args.quiet {
            println!("{}", staging.display());
        } else {
            println!("Created package structure: {}", staging.display());
        }
    }
    Ok(0)
}
