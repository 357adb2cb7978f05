use anyhow::Result;
use cdev::EXIT_FAILURE;
use cdev_core::color::{ColorMode, Painter};
use cdev_core::error::try_pattern;
use cdev_core::usage::cppcheck;

/// Width used when the terminal width is unknown.
const DEFAULT_WIDTH: usize = 100;

fn terminal_width() -> usize {
    std::env::var("COLUMNS").ok().and_then(|c| c.parse().ok()).unwrap_or(DEFAULT_WIDTH)
}

/// Print the analyzer's diagnostic catalog, filtered and colorized.
pub fn check_errors_command(
    pattern: Option<&str>,
    severities: &[String],
    mode: ColorMode,
) -> Result<i32> {
    // Validate the filters before paying for the analyzer run.
    let pat = try_pattern(pattern)?;
    let wanted = if severities.is_empty() {
        None
    } else {
        Some(cppcheck::check_severities(severities)?)
    };

    let mut errors = cppcheck::error_list()?;
    if errors.is_empty() {
        eprintln!("No errors found in cppcheck output!");
        return Ok(EXIT_FAILURE);
    }
    if let Some(pat) = &pat {
        errors.retain(|e| pat.find(&e.id).is_some());
    }
    if let Some(wanted) = &wanted {
        errors.retain(|e| wanted.contains(&e.severity));
    }

    let painter = Painter::new(mode);
    print!("{}", cppcheck::render_error_list(&errors, &painter, terminal_width()));
    Ok(if errors.is_empty() { EXIT_FAILURE } else { 0 })
}
