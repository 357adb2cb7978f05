//! `make help` colorizer.
//!
//! The project's Makefile prints a `target : description` listing; piping
//! it through here highlights targets, shared target prefixes,
//! backtick-quoted commands, and parenthesized hints. Header lines (no
//! leading whitespace) pass through untouched.

use regex::Regex;

use crate::color::{self, Painter};

/// Split a listing line into (target, description) at the first colon.
fn parse_line(line: &str) -> Option<(&str, &str)> {
    line.split_once(':')
}

/// Target names that are a strict prefix of some other target; their
/// suffixed variants render with a two-tone target color.
pub fn target_prefixes(lines: &[String]) -> Vec<String> {
    let targets: Vec<&str> =
        lines.iter().filter_map(|l| parse_line(l)).map(|(t, _)| t.trim()).collect();
    let mut prefixes: Vec<String> = Vec::new();
    for target in &targets {
        if target.is_empty() {
            continue;
        }
        let has_longer = targets.iter().any(|t| *t != *target && t.starts_with(target));
        if has_longer && !prefixes.iter().any(|p| p == target) {
            prefixes.push(target.to_string());
        }
    }
    prefixes.sort();
    prefixes
}

/// Colorize a whole `make help` listing.
pub fn format_help(input: &str, painter: &Painter) -> String {
    let lines: Vec<String> = input.lines().map(|l| l.to_string()).collect();
    let prefixes = target_prefixes(&lines);
    let paren_pat = Regex::new(r"\([^\)]+\)").expect("BUG: Malformed Regex");

    let mut out = String::new();
    for line in &lines {
        let formatted = match parse_line(line) {
            // Continuation lines (no colon) are plain description text.
            None => format_desc(line, painter, &paren_pat),
            Some(_) if !line.starts_with([' ', '\t']) => {
                // Header line.
                line.clone()
            }
            Some((target, desc)) => format!(
                "{}:{}",
                format_target(target, &prefixes, painter),
                format_desc(desc, painter, &paren_pat),
            ),
        };
        out.push_str(&format_cmds(&formatted, painter));
        out.push('\n');
    }
    out
}

/// Color a target name, splitting off the suffix when it extends a shared
/// prefix.
fn format_target(target: &str, prefixes: &[String], painter: &Painter) -> String {
    let name = target.trim();
    for prefix in prefixes {
        if !name.starts_with(prefix.as_str()) || name == prefix {
            continue;
        }
        let suffix = &name[prefix.len()..];
        let (indent, rest) = target.split_at(target.len() - target.trim_start().len());
        let pad = &rest[name.len()..];
        return format!(
            "{indent}{}{}{pad}",
            painter.paint(color::BLUE, prefix),
            painter.paint(color::BRIGHT_BLUE, suffix),
        );
    }
    painter.paint(color::BLUE, target)
}

/// Dim the parenthesized hints inside a description.
fn format_desc(desc: &str, painter: &Painter, paren_pat: &Regex) -> String {
    paren_pat
        .replace_all(desc, |caps: &regex::Captures| {
            painter.paint(color::DIM, caps.get(0).unwrap().as_str())
        })
        .to_string()
}

/// Color the text between backticks as commands.
fn format_cmds(line: &str, painter: &Painter) -> String {
    if !painter.enabled() || !line.contains('`') {
        return line.to_string();
    }
    let mut out = String::new();
    let mut open = false;
    for part in line.split('`') {
        if open {
            out.push('`');
            out.push_str(&painter.paint(color::CYAN, part));
            out.push('`');
        } else {
            out.push_str(part);
        }
        open = !open;
    }
    out
}
