use anyhow::{anyhow, Context, Result};
use cdev::{canonicalize_or_current, read_stdin};
use cdev_core::markdown::{convert, ConvertOptions};

/// Convert a doxygen-style markdown file to plain markdown.
pub fn undoxy_command(
    file: &str,
    output: Option<&str>,
    title: Option<String>,
    header_lines: Vec<String>,
    root: &str,
) -> Result<i32> {
    let input = if file == "-" {
        read_stdin()?
    } else {
        std::fs::read_to_string(file)
            .map_err(|_| anyhow!("Invalid argument, file doesn't exist: {file}"))?
    };

    let opts = ConvertOptions {
        title,
        header_lines,
        source_root: Some(canonicalize_or_current(root)?),
    };
    let converted = convert(&input, &opts);

    match output {
        Some(path) => std::fs::write(path, converted)
            .with_context(|| format!("Can't write to file: {path}"))?,
        None => print!("{converted}"),
    }
    Ok(0)
}
