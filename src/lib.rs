#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]
// Allow pedantic strict lints that create false positives in this codebase
#![allow(clippy::arithmetic_side_effects)] // Level and step counters cannot overflow
#![allow(clippy::indexing_slicing)] // Bounds checked by logic

//! # Arbor - Concurrent Folder Trees
//!
//! Arbor walks and scaffolds directory trees concurrently. Every filesystem
//! operation is callback based and settles a single-resolution [`promise`];
//! fan-in helpers turn the completions of a whole directory level (and,
//! transitively, a whole tree) back into one settlement.
//!
//! ## Architecture
//!
//! - [`promise`]: Settlements, replay for late subscribers, fan-in helpers
//! - [`fs`]: Filesystem access layer (inline, worker pool, in-memory)
//! - [`folder`]: The concurrent tree walker and folder scaffolding
//! - [`utils`]: Padding, token transforms, worker pool setup
//! - [`config`]: Configuration parsing and validation
//! - [`output`]: Output formatting and styling
//! - [`commands`]: Command implementations (walk, scaffold, status, render)
//!
//! ## Example Usage
//!
//! ```no_run
//! use arbor::ArborContext;
//! use arbor::folder::traverse;
//!
//! # fn main() -> anyhow::Result<()> {
//! let ctx = ArborContext::new()?;
//! let done = traverse(&ctx.filesystem(), "/etc", |path, level, is_dir| {
//!     println!("{level} {is_dir} {}", path.display());
//! });
//! done.on_rejected(|error| eprintln!("{error}"));
//! # Ok(())
//! # }
//! ```

/// Command-line interface definitions (argument parsing structures).
pub mod cli;

/// Command implementations behind the CLI.
pub mod commands;

/// Configuration parsing, validation, and management.
pub mod config;

/// Error types carried by rejected settlements.
pub mod error;

/// Folder objects, scaffolding, and the concurrent tree walker.
pub mod folder;

/// Callback-based filesystem access.
pub mod fs;

/// Output formatting and styling.
pub mod output;

/// Single-resolution settlements and fan-in.
pub mod promise;

/// Utility functions and helpers.
pub mod utils;

use anyhow::{Context, Result};
use config::WalkBackend;
use fs::{FileSystem, LocalFs, PooledFs};
use std::path::PathBuf;
use std::sync::Arc;

/// Current version of the arbor binary.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration file path relative to home directory.
pub const DEFAULT_CONFIG_PATH: &str = ".config/arbor/config.toml";

/// Environment variable overriding the configuration file path.
pub const CONFIG_PATH_ENV: &str = "ARBOR_CONFIG_PATH";

/// Central context for CLI operations.
///
/// Holds the configuration and hands out the filesystem backend it selects.
///
/// # Examples
///
/// ```no_run
/// use arbor::ArborContext;
///
/// # fn main() -> anyhow::Result<()> {
/// // Create context with the default config location
/// let ctx = ArborContext::new()?;
///
/// // Create context with a custom config path (for testing)
/// let ctx = ArborContext::new_explicit("/tmp/arbor.toml".into())?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ArborContext {
    /// Path to the configuration file.
    pub config_path: PathBuf,

    /// Loaded configuration settings.
    pub config: config::Config,
}

impl ArborContext {
    /// Creates a new `ArborContext` by loading the configuration from
    /// `$ARBOR_CONFIG_PATH` or the default path, and sizes the global worker
    /// pool from it.
    ///
    /// # Errors
    /// Returns an error if the home directory cannot be determined or if the
    /// configuration file exists but cannot be read or validated.
    pub fn new() -> Result<Self> {
        let config_path = if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            PathBuf::from(path)
        } else {
            let home = dirs::home_dir().context("Could not find home directory")?;
            home.join(DEFAULT_CONFIG_PATH)
        };

        let context = Self::new_explicit(config_path)?;

        if let Err(e) = utils::thread_pool::configure_from_config(&context.config) {
            output::warning(&format!("Warning: Failed to configure thread pool: {e}"));
        }

        Ok(context)
    }

    /// Creates a new `ArborContext` from an explicit config path, leaving the
    /// global worker pool alone.
    ///
    /// # Errors
    /// Returns an error if the configuration file exists but cannot be read
    /// or validated.
    pub fn new_explicit(config_path: PathBuf) -> Result<Self> {
        let config = config::Config::load(&config_path)?;
        Ok(Self {
            config_path,
            config,
        })
    }

    /// The filesystem backend selected by `walk.backend`.
    #[must_use]
    pub fn filesystem(&self) -> Arc<dyn FileSystem> {
        self.filesystem_for(self.config.walk.backend)
    }

    /// The filesystem backend for `backend`.
    #[must_use]
    pub fn filesystem_for(&self, backend: WalkBackend) -> Arc<dyn FileSystem> {
        match backend {
            WalkBackend::Pool => Arc::new(PooledFs::global()),
            WalkBackend::Local => Arc::new(LocalFs),
        }
    }
}
