pub mod parser;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

/// Largest accepted worker pool size.
pub const MAX_PARALLEL_THREADS: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub performance: PerformanceConfig,

    /// How `arbor walk` reaches the filesystem
    #[serde(default)]
    pub walk: WalkConfig,

    /// Defaults for `arbor render`
    #[serde(default)]
    pub render: RenderConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceConfig {
    #[serde(default = "default_parallel_threads")]
    pub parallel_threads: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct WalkConfig {
    #[serde(default)]
    pub backend: WalkBackend,
}

/// Filesystem backend used for walks and scaffolding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WalkBackend {
    /// Operations run on the worker pool and complete concurrently.
    #[default]
    Pool,
    /// Operations run inline on the calling thread.
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RenderConfig {
    /// Match tokens literally instead of as regular expressions
    #[serde(default)]
    pub literal_tokens: bool,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            parallel_threads: default_parallel_threads(),
        }
    }
}

impl Config {
    /// Load configuration from a file, falling back to defaults when the
    /// file does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Cannot read or parse the configuration file
    /// - Configuration file contains invalid TOML
    /// - A value is out of range
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        parser::parse_config_file(path)
    }

    /// Save configuration to a file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Cannot create parent directories
    /// - Cannot write to the file
    /// - TOML serialization fails
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml_str = toml::to_string_pretty(self)?;
        let mut file = std::fs::File::create(path)?;
        file.write_all(toml_str.as_bytes())?;
        Ok(())
    }

    /// Get a configuration value by key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        match key.split_once('.')? {
            ("performance", "parallel_threads") => {
                Some(self.performance.parallel_threads.to_string())
            }
            ("walk", "backend") => Some(format!("{:?}", self.walk.backend).to_lowercase()),
            ("render", "literal_tokens") => Some(self.render.literal_tokens.to_string()),
            _ => None,
        }
    }

    /// Set a configuration value by key
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The key format is invalid (must be section.key)
    /// - The key is unknown
    /// - The value is invalid for the key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let Some(parts) = key.split_once('.') else {
            return Err(anyhow::anyhow!("Invalid configuration key: {key}"));
        };

        match parts {
            ("performance", "parallel_threads") => {
                let threads: usize = value
                    .parse()
                    .with_context(|| format!("Invalid number: {value}"))?;
                parser::validate_parallel_threads(threads)?;
                self.performance.parallel_threads = threads;
            }
            ("walk", "backend") => {
                self.walk.backend = match value {
                    "pool" => WalkBackend::Pool,
                    "local" => WalkBackend::Local,
                    _ => {
                        return Err(anyhow::anyhow!(
                            "Invalid walk backend: {value} (expected 'pool' or 'local')"
                        ));
                    }
                };
            }
            ("render", "literal_tokens") => {
                self.render.literal_tokens = value
                    .parse()
                    .with_context(|| format!("Invalid boolean: {value}"))?;
            }
            _ => return Err(anyhow::anyhow!("Unknown configuration key: {key}")),
        }
        Ok(())
    }
}

// Default functions for serde
fn default_parallel_threads() -> usize {
    crate::utils::thread_pool::default_threads()
}
