//! ui::output
//!
//! Output formatting and display.
//!
//! Output respects the quiet flag. When `--json` is enabled, commands print
//! one JSON document to stdout instead.

use std::fmt::Display;

use serde::Serialize;

use crate::engine::{AuditTrail, LogEntry, LogKind};

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Print a value as pretty JSON on stdout.
pub fn json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Format one audit trail entry.
///
/// Attached data is only included in debug mode.
pub fn format_entry(entry: &LogEntry, verbosity: Verbosity) -> String {
    let tag = match entry.kind {
        LogKind::Info => "info",
        LogKind::Success => "ok",
        LogKind::Error => "error",
    };
    let mut line = format!("[{:>5}] {}", tag, entry.message);
    if verbosity == Verbosity::Debug {
        if let Some(data) = &entry.data {
            line.push_str(&format!(" {}", data));
        }
    }
    line
}

/// Print an audit trail.
///
/// Quiet mode prints nothing; normal mode skips `info` entries.
pub fn trail(trail: &AuditTrail, verbosity: Verbosity) {
    for entry in trail.entries() {
        let shown = match verbosity {
            Verbosity::Quiet => false,
            Verbosity::Normal => entry.kind != LogKind::Info,
            Verbosity::Debug => true,
        };
        if shown {
            eprintln!("{}", format_entry(entry, verbosity));
        }
    }
}

/// Format a list of items.
pub fn format_list<T: Display>(items: &[T], prefix: &str) -> String {
    items
        .iter()
        .map(|item| format!("{}{}", prefix, item))
        .collect::<Vec<_>>()
        .join("\n")
}
