use std::path::Path;

use anyhow::{anyhow, Result};
use cdev::EXIT_FAILURE;
use cdev_core::color::{ColorMode, Painter};
use cdev_core::disasm::{self, DisasmOptions, SyntaxFlavor};

/// Disassemble a binary and print the formatted listing.
pub fn disasm_command(
    binary: &str,
    sections: Vec<String>,
    ignore_sections: Vec<String>,
    syntax: &str,
    no_addresses: bool,
    mode: ColorMode,
) -> Result<i32> {
    let syntax = SyntaxFlavor::from_flag(syntax)
        .ok_or_else(|| anyhow!("Invalid argument, not a syntax flavor: {syntax}"))?;
    let opts = DisasmOptions {
        syntax,
        sections: if sections.is_empty() { None } else { Some(sections) },
        ignore_sections,
        show_addresses: !no_addresses,
    };

    let path = Path::new(binary);
    let parsed = match disasm::disassemble(path, &opts) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("{e}");
            return Ok(EXIT_FAILURE);
        }
    };
    if parsed.is_empty() {
        eprintln!("No sections matched.");
        return Ok(EXIT_FAILURE);
    }

    let renderer = disasm::Renderer::new(Painter::new(mode), opts.show_addresses);
    print!("{}", renderer.render(&parsed));
    Ok(0)
}
