//! Terminal color support for the tool renderers.
//!
//! Output is colorized only when the destination is a terminal, matching
//! the usual `auto`/`always`/`never` convention. Renderers take a
//! [`Painter`] so the same code path produces plain text for pipes and
//! files.

use std::io::IsTerminal;

/// Controls whether rendered output uses ANSI color escape codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    /// Colorize output only when stdout is a terminal (default).
    #[default]
    Auto,
    /// Always emit ANSI color codes.
    Always,
    /// Never emit color codes; plain text output.
    Never,
}

impl ColorMode {
    /// Parse a `--color` flag value. Returns `None` for unrecognized values.
    pub fn from_flag(value: &str) -> Option<Self> {
        match value {
            "auto" => Some(ColorMode::Auto),
            "always" => Some(ColorMode::Always),
            "never" => Some(ColorMode::Never),
            _ => None,
        }
    }

    /// Resolve whether colors should actually be used, considering the
    /// mode and whether stdout is a terminal.
    pub fn use_color(self) -> bool {
        match self {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => std::io::stdout().is_terminal(),
        }
    }

    /// Like [`ColorMode::use_color`], but resolved against stderr.
    pub fn use_color_stderr(self) -> bool {
        match self {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => std::io::stderr().is_terminal(),
        }
    }
}

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";
pub const UNDERLINE: &str = "\x1b[4m";

pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const BLUE: &str = "\x1b[34m";
pub const MAGENTA: &str = "\x1b[35m";
pub const CYAN: &str = "\x1b[36m";

pub const BRIGHT_RED: &str = "\x1b[91m";
pub const BRIGHT_GREEN: &str = "\x1b[92m";
pub const BRIGHT_BLUE: &str = "\x1b[94m";
pub const BRIGHT_MAGENTA: &str = "\x1b[95m";
pub const BRIGHT_CYAN: &str = "\x1b[96m";

/// Wraps text in ANSI codes when enabled, passes it through otherwise.
#[derive(Debug, Clone, Copy)]
pub struct Painter {
    enabled: bool,
}

impl Painter {
    pub fn new(mode: ColorMode) -> Self {
        Self { enabled: mode.use_color() }
    }

    /// A painter that never colors. Useful for tests and file output.
    pub fn plain() -> Self {
        Self { enabled: false }
    }

    /// A painter that always colors, regardless of terminal detection.
    pub fn forced() -> Self {
        Self { enabled: true }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Wrap `text` in the given escape code (plus reset) when enabled.
    pub fn paint(&self, code: &str, text: &str) -> String {
        if self.enabled {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    /// Bold variant of [`Painter::paint`].
    pub fn paint_bold(&self, code: &str, text: &str) -> String {
        if self.enabled {
            format!("{BOLD}{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }
}
