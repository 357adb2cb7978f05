//! Shared error types used across the tool modules.
//!
//! Each module defines its own error enum where it has tool-specific
//! failure modes (see [`crate::disasm::DisasmError`] for example); the
//! types here cover the cases every tool shares: bad user input, fatal
//! setup failures, and user cancellation.

use thiserror::Error;

/// Bad user input: an invalid regex, a missing file, conflicting flags.
#[derive(Debug, Error)]
#[error("Invalid argument, {0}")]
pub struct InvalidArg(pub String);

impl InvalidArg {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Unrecoverable setup failure (cannot create a directory, missing
/// required executable). The command aborts; there is no partial success.
#[derive(Debug, Error)]
#[error("Fatal error, {0}")]
pub struct FatalError(pub String);

impl FatalError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// The user cancelled an interactive step (EOF or interrupt).
///
/// The CLI maps this to exit code 2.
#[derive(Debug, Error)]
#[error("User cancelled.")]
pub struct UserCancelled;

/// Compile a user-supplied regex pattern, mapping failures to
/// [`InvalidArg`] so every tool reports bad patterns the same way.
///
/// `None` input means "no filter" and returns `None`.
pub fn try_pattern(s: Option<&str>) -> Result<Option<regex::Regex>, InvalidArg> {
    match s {
        None => Ok(None),
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => regex::Regex::new(s)
            .map(Some)
            .map_err(|e| InvalidArg(format!("invalid pattern: {s}\n{e}"))),
    }
}
