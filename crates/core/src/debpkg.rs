//! Debian package staging trees.
//!
//! Builds the `<pkg>_<version>/` directory a `dpkg-deb --build` run
//! expects: a `DEBIAN/control` file rendered from a template, the payload
//! files copied under their install dirs, and relative symlinks from the
//! public dirs (`usr/bin`, `usr/lib`, ...) into the payload.
//!
//! Construction is IO-free; [`DebPackage::create`] is the only function
//! that touches the filesystem, so list mode can print a layout without
//! staging anything.

use std::path::{Path, PathBuf};

use crate::color::{self, Painter};
use crate::error::FatalError;
use crate::exec;

/// Fields rendered into the `DEBIAN/control` file.
#[derive(Debug, Clone)]
pub struct ControlInfo {
    pub package: String,
    pub version: String,
    pub architecture: String,
    pub maintainer: String,
    pub homepage: String,
    pub priority: String,
    pub license: String,
    pub description: String,
}

impl ControlInfo {
    pub fn render(&self) -> String {
        format!(
            "Package: {}\n\
             Version: {}\n\
             Architecture: {}\n\
             Maintainer: {}\n\
             Homepage: {}\n\
             Priority: {}\n\
             License: {}\n\
             Description: {}\n",
            self.package,
            self.version,
            self.architecture,
            self.maintainer,
            self.homepage,
            self.priority,
            self.license,
            self.description,
        )
    }
}

/// Ask `dpkg` for the build architecture.
pub fn host_architecture() -> Result<String, FatalError> {
    let out = exec::check_output(Path::new("dpkg"), ["--print-architecture"])
        .map_err(|e| FatalError(format!("unable to read dpkg architecture: {e}")))?;
    Ok(out.trim().to_string())
}

/// One payload file: where it comes from, where it installs, and where
/// its public symlink lives.
#[derive(Debug, Clone)]
pub struct DebFile {
    pub src_path: PathBuf,
    /// Install dir inside the package, e.g. `usr/share/colr/bin`.
    pub dest_dir: PathBuf,
    /// Public dir that gets a symlink, e.g. `usr/bin`.
    pub link_dir: PathBuf,
}

impl DebFile {
    pub fn new(
        src_path: impl Into<PathBuf>,
        dest_dir: impl AsRef<str>,
        link_dir: impl AsRef<str>,
    ) -> Self {
        Self {
            src_path: src_path.into(),
            dest_dir: PathBuf::from(dest_dir.as_ref().trim_start_matches('/')),
            link_dir: PathBuf::from(link_dir.as_ref().trim_start_matches('/')),
        }
    }

    pub fn file_name(&self) -> String {
        self.src_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// Install path inside the staging dir.
    pub fn dest_path(&self) -> PathBuf {
        self.dest_dir.join(self.file_name())
    }

    /// The relative path a symlink placed in `link_dir` needs to reach the
    /// installed file: `..` up to the common ancestor, then down into the
    /// install dir.
    pub fn relative_link_target(&self) -> PathBuf {
        let link: Vec<_> = self.link_dir.components().collect();
        let dest: Vec<_> = self.dest_dir.components().collect();
        let common = link.iter().zip(dest.iter()).take_while(|(a, b)| a == b).count();
        let mut target = PathBuf::new();
        for _ in common..link.len() {
            target.push("..");
        }
        for component in &dest[common..] {
            target.push(component);
        }
        target.join(self.file_name())
    }
}

/// A package name plus the files staged into its tree.
#[derive(Debug, Clone)]
pub struct DebPackage {
    pub name: String,
    pub control: ControlInfo,
    pub files: Vec<DebFile>,
}

impl DebPackage {
    /// Top staging directory: `<pkg>_<version>`.
    pub fn staging_dir(&self) -> PathBuf {
        PathBuf::from(format!("{}_{}", self.name, self.control.version))
    }

    /// The human-readable layout listing used by `--list`.
    pub fn describe(&self, painter: &Painter) -> String {
        let mut out = format!("{}:\n", painter.paint_bold(color::BLUE, &self.name));
        if self.files.is_empty() {
            out.push_str(&format!("    <{}>\n", painter.paint(color::RED, "no files")));
            return out;
        }
        let staging = self.staging_dir();
        for file in &self.files {
            out.push_str(&format!("    {}\n", file.src_path.display()));
            out.push_str(&format!(
                "    > {}\n",
                painter.paint(color::BLUE, &staging.join(file.dest_path()).display().to_string()),
            ));
            out.push_str(&format!(
                "       > {}\n",
                painter.paint(
                    color::BLUE,
                    &staging.join(&file.link_dir).join(file.file_name()).display().to_string()
                ),
            ));
        }
        out
    }

    /// Build the staging tree under `dest_root` (current dir when `None`):
    /// remove any previous tree, write the control file, copy payload
    /// files, and place their relative symlinks.
    pub fn create(&self, dest_root: Option<&Path>) -> Result<PathBuf, FatalError> {
        let root = dest_root.unwrap_or(Path::new("."));
        let staging = root.join(self.staging_dir());
        if staging.exists() {
            log::debug!("removing existing dir: {}", staging.display());
            std::fs::remove_dir_all(&staging).map_err(|e| {
                FatalError(format!("Unable to remove directory: {}\n{e}", staging.display()))
            })?;
        }

        let debian_dir = staging.join("DEBIAN");
        try_makedirs(&debian_dir)?;
        std::fs::write(debian_dir.join("control"), self.control.render()).map_err(|e| {
            FatalError(format!("Unable to write control file: {}\n{e}", debian_dir.display()))
        })?;

        for file in &self.files {
            let dest_dir = staging.join(&file.dest_dir);
            let link_dir = staging.join(&file.link_dir);
            try_makedirs(&dest_dir)?;
            try_makedirs(&link_dir)?;
            try_copy(&file.src_path, &dest_dir.join(file.file_name()))?;
            try_symlink(&file.relative_link_target(), &link_dir.join(file.file_name()))?;
        }
        Ok(staging)
    }
}

fn try_makedirs(dir: &Path) -> Result<(), FatalError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| FatalError(format!("Unable to create directory: {}\n{e}", dir.display())))
}

fn try_copy(src: &Path, dest: &Path) -> Result<(), FatalError> {
    std::fs::copy(src, dest).map(|_| ()).map_err(|e| {
        FatalError(format!(
            "Unable to copy file:\n        {}\n    to: {}\n{e}",
            src.display(),
            dest.display()
        ))
    })
}

#[cfg(unix)]
fn try_symlink(target: &Path, link: &Path) -> Result<(), FatalError> {
    std::os::unix::fs::symlink(target, link).map_err(|e| {
        FatalError(format!(
            "Unable to symlink file:\n        {}\n    to: {}\n{e}",
            link.display(),
            target.display()
        ))
    })
}

#[cfg(not(unix))]
fn try_symlink(target: &Path, link: &Path) -> Result<(), FatalError> {
    // Windows symlinks need privileges; fall back to a copy of the target.
    let resolved = link.parent().map(|p| p.join(target)).unwrap_or_else(|| target.to_path_buf());
    try_copy(&resolved, link)
}

/// The standard packages this project ships: the CLI tool and the library.
pub fn standard_packages(
    project_root: &Path,
    version: &str,
    architecture: &str,
) -> Vec<DebPackage> {
    let control = |package: &str| ControlInfo {
        package: package.to_string(),
        version: version.to_string(),
        architecture: architecture.to_string(),
        maintainer: "Christopher Welborn (cjwelborn@live.com)".to_string(),
        homepage: "https://welbornprod.com/colrc".to_string(),
        priority: "optional".to_string(),
        license: "MIT".to_string(),
        description: "ColrC is a C library and a command-line tool for terminal colors on Linux."
            .to_string(),
    };
    vec![
        DebPackage {
            name: "colr".to_string(),
            control: control("colr"),
            files: vec![DebFile::new(
                project_root.join("colrc"),
                "usr/share/colr/bin",
                "usr/bin",
            )],
        },
        DebPackage {
            name: "libcolr".to_string(),
            control: control("libcolr"),
            files: vec![
                DebFile::new(project_root.join("libcolr.so"), "usr/share/colr/lib", "usr/lib"),
                DebFile::new(project_root.join("colr.h"), "usr/share/colr/include", "usr/include"),
            ],
        },
    ]
}

/// Read the project version from its version script, the same source the
/// build uses.
pub fn project_version(project_root: &Path) -> Result<String, FatalError> {
    let script = project_root.join("tools/get_version.sh");
    let out = exec::check_output(Path::new("bash"), [script.as_os_str()])
        .map_err(|e| FatalError(format!("unable to read project version: {e}")))?;
    Ok(out.trim().to_string())
}
