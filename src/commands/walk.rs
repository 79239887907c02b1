use crate::ArborContext;
use crate::config::WalkBackend;
use crate::folder::{Folder, traverse};
use crate::output;
use crate::promise::Outcome;
use anyhow::{Context, Result};
use dashmap::DashMap;
use glob::Pattern;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// What to print from a walk.
#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    /// Run filesystem operations inline instead of on the worker pool
    pub local: bool,
    /// Only print files with this extension
    pub ext: Option<String>,
    /// Only print directories
    pub dirs_only: bool,
}

/// Visited entry: level and directory flag.
type Visited = (usize, bool);

/// Counts reported after a walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WalkSummary {
    /// Directories visited.
    pub dirs: usize,
    /// Non-directories visited.
    pub files: usize,
}

/// Walk `root`, print the tree and a summary
///
/// # Errors
///
/// Returns an error if:
/// - The extension filter is not a valid glob
/// - Listing or probing any directory fails
pub fn execute(ctx: &ArborContext, root: &Path, options: &WalkOptions) -> Result<WalkSummary> {
    let backend = if options.local {
        WalkBackend::Local
    } else {
        ctx.config.walk.backend
    };
    let fs = ctx.filesystem_for(backend);

    let folder = Folder::new(&root.to_string_lossy());
    let filter = match options.ext.as_deref() {
        Some(ext) => {
            let pattern = folder.all_files_pattern(Some(ext));
            Some(Pattern::new(&pattern).with_context(|| format!("Invalid extension: {ext}"))?)
        }
        None => None,
    };

    output::verbose(&format!(
        "Walking {} with the {backend:?} backend",
        folder.path_str()
    ));

    let entries: Arc<DashMap<PathBuf, Visited>> = Arc::new(DashMap::new());
    let sink = Arc::clone(&entries);
    let started = Instant::now();

    let done = traverse(&fs, folder.path(), move |path, level, is_dir| {
        sink.insert(path.to_path_buf(), (level, is_dir));
    });
    let outcome = super::wait_for(&done)?;
    let elapsed = started.elapsed();

    if let Outcome::Rejected(error) = &*outcome {
        return Err(error.clone()).context("Walk failed");
    }

    let mut visited: Vec<(PathBuf, Visited)> = entries
        .iter()
        .map(|entry| (entry.key().clone(), *entry.value()))
        .collect();
    visited.sort_by(|a, b| a.0.cmp(&b.0));

    let mut summary = WalkSummary::default();
    for (path, (level, is_dir)) in &visited {
        if *is_dir {
            summary.dirs += 1;
        } else {
            summary.files += 1;
        }
        if should_print(path, *is_dir, options.dirs_only, filter.as_ref()) {
            println!("{}", output::tree_line(path, *level, *is_dir));
        }
    }

    output::info(&format!(
        "{} directories, {} files in {}",
        summary.dirs,
        summary.files,
        humantime::format_duration(truncate_to_millis(elapsed))
    ));
    Ok(summary)
}

fn should_print(path: &Path, is_dir: bool, dirs_only: bool, filter: Option<&Pattern>) -> bool {
    if is_dir {
        return true;
    }
    if dirs_only {
        return false;
    }
    filter.is_none_or(|pattern| pattern.matches_path(path))
}

fn truncate_to_millis(elapsed: Duration) -> Duration {
    Duration::from_millis(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
}
