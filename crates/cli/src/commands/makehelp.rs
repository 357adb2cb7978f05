use std::io::IsTerminal;

use anyhow::Result;
use cdev::read_stdin;
use cdev_core::color::{ColorMode, Painter};
use cdev_core::makehelp;

/// Colorize `make help` output from stdin. When stdout is not a terminal
/// (and color is not forced), the input passes through untouched.
pub fn make_help_command(mode: ColorMode) -> Result<i32> {
    let input = read_stdin()?;
    if !std::io::stdout().is_terminal() && mode != ColorMode::Always {
        print!("{input}");
        return Ok(0);
    }
    let painter = if mode == ColorMode::Always { Painter::forced() } else { Painter::new(mode) };
    print!("{}", makehelp::format_help(&input, &painter));
    Ok(0)
}
