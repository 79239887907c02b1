//! Output formatting and styling for the arbor CLI.
//!
//! Results go to stdout, messages to stderr:
//! - Dimmed colors for routine messages
//! - Bold colors for warnings and errors
//! - Indented tree lines for walked entries
//! - Verbosity control (quiet, normal, verbose)

use crate::folder::FolderStatus;
use crate::utils::pad_right;
use colored::Colorize;
use std::path::Path;
use std::sync::atomic::{AtomicU8, Ordering};

/// Width of the status column in [`status_line`].
const STATUS_WIDTH: usize = 16;

/// Verbosity level for output messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Suppress informational messages, show only results, warnings and errors.
    Quiet = 0,
    /// Default verbosity level, show all standard messages.
    Normal = 1,
    /// Show verbose debug messages in addition to standard output.
    Verbose = 2,
}

/// Global verbosity setting (default: Normal).
static VERBOSITY: AtomicU8 = AtomicU8::new(1);

/// Sets the global verbosity level for all output functions.
pub fn set_verbosity(level: Verbosity) {
    VERBOSITY.store(level as u8, Ordering::Relaxed);
}

/// Gets the current global verbosity level.
pub fn get_verbosity() -> Verbosity {
    match VERBOSITY.load(Ordering::Relaxed) {
        0 => Verbosity::Quiet,
        2 => Verbosity::Verbose,
        _ => Verbosity::Normal,
    }
}

/// Prints a success message in green (respects quiet mode).
pub fn success(message: &str) {
    if get_verbosity() == Verbosity::Quiet {
        return;
    }
    eprintln!("{}", message.green());
}

/// Prints an error message in bold red (always shown).
pub fn error(message: &str) {
    eprintln!("{}", message.red().bold());
}

/// Prints a warning message in bold yellow (always shown).
pub fn warning(message: &str) {
    eprintln!("{}", message.yellow().bold());
}

/// Prints an informational message in dimmed color (respects quiet mode).
pub fn info(message: &str) {
    if get_verbosity() == Verbosity::Quiet {
        return;
    }
    eprintln!("{}", message.dimmed());
}

/// Prints a verbose debug message (only in verbose mode).
pub fn verbose(message: &str) {
    if get_verbosity() != Verbosity::Verbose {
        return;
    }
    eprintln!("{}", message.dimmed());
}

/// Prints an action message with a dimmed verb and normal message.
pub fn action(verb: &str, message: &str) {
    if get_verbosity() == Verbosity::Quiet {
        return;
    }
    eprintln!("{} {}", verb.dimmed().bold(), message);
}

/// Formats one walked entry as a tree line: two spaces per level below the
/// first, directories in bold blue with a trailing `/`.
#[must_use]
pub fn tree_line(path: &Path, level: usize, is_dir: bool) -> String {
    let indent = "  ".repeat(level.saturating_sub(1));
    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    if is_dir {
        format!("{indent}{}", format!("{name}/").blue().bold())
    } else {
        format!("{indent}{name}")
    }
}

/// Formats a status marker and path as one aligned line.
#[must_use]
pub fn status_line(status: FolderStatus, path: &str) -> String {
    let marker = pad_right(&status.to_string(), STATUS_WIDTH, ' ');
    let marker = match status {
        FolderStatus::Missing => marker.red(),
        FolderStatus::Directory => marker.blue(),
        FolderStatus::SymbolicLink => marker.cyan(),
        FolderStatus::File => marker.normal(),
    };
    format!("{marker} {path}")
}
