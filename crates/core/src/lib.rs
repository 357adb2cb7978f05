//! cdev-core
//!
//! Core library for the `cdev` developer tooling around a C library
//! project ("colr"). Each module wraps one concern: running and
//! reformatting external tool output (objdump, cppcheck, make, a test
//! runner), scanning project sources for symbol usage, compiling and
//! running small C snippets, and staging Debian package trees.
//!
//! The goal is to keep all substantive logic here so it is fully testable
//! and reusable from multiple frontends (CLI, scripts, etc.).

pub mod color;
pub mod debpkg;
pub mod disasm;
pub mod error;
pub mod exec;
pub mod makehelp;
pub mod markdown;
pub mod project;
pub mod replace;
pub mod report;
pub mod settings;
pub mod snippet;
pub mod testdesc;
pub mod usage;

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
