//! Error types delivered through rejected settlements or returned from
//! argument validation.
//!
//! Rejection payloads are read by every subscriber, so each error is `Clone`
//! and shares its underlying [`io::Error`] behind an [`Arc`].

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Failure of a tree walk.
///
/// `path` is the directory whose listing, or one of whose entries' probe,
/// failed. Ancestors propagate the same error unchanged.
#[derive(Debug, Clone, Error)]
#[error("failed to traverse {}: {source}", path.display())]
pub struct TraverseError {
    /// Directory at which the walk failed.
    pub path: PathBuf,
    /// Underlying filesystem error.
    #[source]
    pub source: Arc<io::Error>,
}

impl TraverseError {
    /// Creates an error for `path`.
    pub fn new(path: impl Into<PathBuf>, source: Arc<io::Error>) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}

/// Failures of folder objects and folder scaffolding.
#[derive(Debug, Clone, Error)]
pub enum FolderError {
    /// Sub folder names must be a single, non-empty path segment.
    #[error("invalid sub folder name {0:?}: must be non-empty and contain no path delimiters")]
    InvalidName(String),

    /// A directory could not be created.
    #[error("failed to create folder {}: {source}", path.display())]
    Create {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: Arc<io::Error>,
    },
}

/// Failures of token transforms and file rendering.
#[derive(Debug, Clone, Error)]
pub enum TransformError {
    /// A token was not a valid regular expression.
    #[error("invalid token pattern {token:?}: {source}")]
    InvalidToken {
        /// Offending token.
        token: String,
        /// Regex compilation error.
        #[source]
        source: regex::Error,
    },

    /// Source or destination path was empty.
    #[error("invalid {0} file path: must not be empty")]
    EmptyPath(&'static str),

    /// Reading the source file failed.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// Source file.
        path: PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: Arc<io::Error>,
    },

    /// Writing the destination file failed.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        /// Destination file.
        path: PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: Arc<io::Error>,
    },
}
