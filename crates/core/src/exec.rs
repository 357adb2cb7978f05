//! Blocking subprocess helpers.
//!
//! Every external tool invocation in this crate is synchronous: spawn,
//! wait for completion, buffer full stdout/stderr, then process. There is
//! no streaming and no retry; a failed call is reported once and the whole
//! command aborts.

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to spawn {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{tool} exited with {status}{}", fmt_stderr(.stderr))]
    Failed { tool: String, status: String, stderr: String },
}

fn fmt_stderr(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(":\n{trimmed}")
    }
}

/// Buffered output of a completed child process.
#[derive(Debug, Clone)]
pub struct Captured {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub code: Option<i32>,
}

/// Run a command and capture its output without judging the exit status.
///
/// Callers that care about non-zero exits should check [`Captured::success`]
/// or use [`check_output`].
pub fn run_capture<I, S>(program: &Path, args: I) -> Result<Captured, ExecError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    let output = Command::new(program).args(args).output().map_err(|e| ExecError::Spawn {
        tool: program.display().to_string(),
        source: e,
    })?;
    Ok(Captured {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        success: output.status.success(),
        code: output.status.code(),
    })
}

/// Run a command, requiring a zero exit status, and return its stdout.
pub fn check_output<I, S>(program: &Path, args: I) -> Result<String, ExecError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    let output = Command::new(program).args(args).output().map_err(|e| ExecError::Spawn {
        tool: program.display().to_string(),
        source: e,
    })?;
    if !output.status.success() {
        return Err(ExecError::Failed {
            tool: program.display().to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Look for `executable` in `$PATH`. Returns the full path when found.
pub fn find_in_path(executable: &str) -> Option<PathBuf> {
    env::var_os("PATH").and_then(|paths| {
        env::split_paths(&paths).find_map(|p| {
            let candidate = p.join(executable);
            if candidate.is_file() {
                Some(candidate)
            } else {
                None
            }
        })
    })
}
