//! Command-line interface definitions for arbor.
//!
//! This module contains all CLI argument parsing structures using clap's derive macros.
//! The CLI definitions are shared between the main binary and build tools (like xtask)
//! for man page generation.
//!
//! Note: Field-level documentation is provided via clap attributes (#[arg(help = "...")]),
//! so we allow missing_docs for this module to avoid redundant documentation.

#![allow(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Main CLI structure for arbor.
#[derive(Parser)]
#[command(
    name = "arbor",
    version = crate::VERSION,
    about = "Concurrent directory walker and folder scaffolder",
    long_about = "Walks and scaffolds directory trees, issuing every filesystem operation concurrently"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress informational messages
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// All available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Walk a directory tree and print every entry
    Walk {
        /// Directory to walk
        root: PathBuf,

        /// Run filesystem operations inline instead of on the worker pool
        #[arg(long)]
        local: bool,

        /// Only print files with this extension (directories are always printed)
        #[arg(long, value_name = "EXT")]
        ext: Option<String>,

        /// Only print directories
        #[arg(long)]
        dirs_only: bool,
    },

    /// Create a folder tree declared in a TOML file
    Scaffold {
        /// Folder to create the tree in (its parent must exist)
        root: String,

        /// TOML file declaring the tree as nested tables
        #[arg(value_name = "SPEC.toml")]
        spec: PathBuf,
    },

    /// Show what exists at each path
    Status {
        /// Paths to inspect
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Copy a file, replacing tokens in its contents
    Render {
        /// Source file
        src: PathBuf,

        /// Destination file
        dest: PathBuf,

        /// Token replacement, repeatable
        #[arg(short, long = "token", value_name = "TOKEN=VALUE", value_parser = parse_token)]
        tokens: Vec<(String, String)>,

        /// Match tokens literally instead of as regular expressions
        #[arg(long)]
        literal: bool,
    },

    /// Get and set configuration options
    Config {
        /// Configuration key (section.key)
        key: Option<String>,

        /// Configuration value to set
        value: Option<String>,

        /// List all configuration values
        #[arg(short, long)]
        list: bool,
    },

    /// Generate shell completions
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Parses a `TOKEN=VALUE` pair. The value may itself contain `=`.
///
/// # Errors
///
/// Returns an error if there is no `=` or the token is empty.
pub fn parse_token(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((token, value)) if !token.is_empty() => Ok((token.to_string(), value.to_string())),
        _ => Err(format!("expected TOKEN=VALUE, got '{arg}'")),
    }
}
