use std::env;
use std::io::{IsTerminal, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cdev_core::error::UserCancelled;

/// Exit code for general failure or "nothing found".
pub const EXIT_FAILURE: i32 = 1;
/// Exit code for user cancellation (EOF/interrupt).
pub const EXIT_CANCELLED: i32 = 2;
/// Exit code for a broken pipe on output.
pub const EXIT_BROKEN_PIPE: i32 = 3;

/// Canonicalize the root path if possible, falling back to the given string
/// relative to the current working directory.
pub fn canonicalize_or_current(root: &str) -> Result<PathBuf> {
    let path = Path::new(root);
    if path == Path::new(".") {
        Ok(env::current_dir().context("Failed to get current directory")?)
    } else {
        // Try to canonicalize; if it fails (e.g., path does not yet exist),
        // join it with the current dir to get an absolute path.
        match path.canonicalize() {
            Ok(p) => Ok(p),
            Err(_) => {
                let cwd = env::current_dir().context("Failed to get current directory")?;
                Ok(cwd.join(path))
            }
        }
    }
}

/// Read all of stdin, with a hint printed when both ends are terminals.
pub fn read_stdin() -> Result<String> {
    if std::io::stdin().is_terminal() && std::io::stdout().is_terminal() {
        println!("\nReading from stdin until end of file (Ctrl + D)...\n");
    }
    let mut body = String::new();
    std::io::stdin().read_to_string(&mut body).context("Failed to read stdin")?;
    Ok(body)
}

/// Ask a yes/no question on the terminal. EOF or an explicit `q` cancels
/// the whole command rather than counting as a "no".
pub fn confirm(prompt: &str) -> Result<bool> {
    use std::io::Write;
    print!("{prompt} (y/N/q): ");
    std::io::stdout().flush().ok();
    let mut answer = String::new();
    let read = std::io::stdin().read_line(&mut answer).context("Failed to read answer")?;
    if read == 0 {
        return Err(UserCancelled.into());
    }
    let answer = answer.trim().to_lowercase();
    if answer.starts_with('q') {
        return Err(UserCancelled.into());
    }
    Ok(answer.starts_with('y'))
}

/// Map a failed run to the documented exit codes, printing the message.
pub fn report_error(err: &anyhow::Error) -> i32 {
    if err.is::<UserCancelled>() {
        eprintln!("\nUser cancelled.\n");
        return EXIT_CANCELLED;
    }
    if let Some(io_err) = err.downcast_ref::<std::io::Error>() {
        if io_err.kind() == std::io::ErrorKind::BrokenPipe {
            eprintln!("\nBroken pipe, input/output was interrupted.\n");
            return EXIT_BROKEN_PIPE;
        }
    }
    eprintln!("{err:#}");
    EXIT_FAILURE
}
