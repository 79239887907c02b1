use super::{Completion, EntryKind, FileSystem};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// In-memory filesystem that completes every operation inline.
///
/// Useful for exercising the walker against trees and failures that are
/// awkward to produce on disk (unreadable directories, entries that vanish
/// between listing and probing). Paths are compared verbatim, so use the same
/// spelling for the root you insert and the root you walk.
#[derive(Debug, Default)]
pub struct MemoryFs {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    entries: BTreeMap<PathBuf, EntryKind>,
    children: HashMap<PathBuf, BTreeSet<OsString>>,
    list_failures: HashMap<PathBuf, io::ErrorKind>,
    probe_failures: HashMap<PathBuf, io::ErrorKind>,
}

impl MemoryFs {
    /// Creates an empty filesystem.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a directory and any missing ancestors.
    pub fn add_dir(&self, path: impl AsRef<Path>) -> &Self {
        let mut state = self.state();
        for ancestor in path.as_ref().ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            state.insert(ancestor, EntryKind::DIR);
        }
        self
    }

    /// Adds a regular file, creating missing parent directories.
    pub fn add_file(&self, path: impl AsRef<Path>) -> &Self {
        self.add_leaf(path.as_ref(), EntryKind::FILE)
    }

    /// Adds a symbolic link, creating missing parent directories.
    pub fn add_symlink(&self, path: impl AsRef<Path>) -> &Self {
        self.add_leaf(path.as_ref(), EntryKind::SYMLINK)
    }

    fn add_leaf(&self, path: &Path, kind: EntryKind) -> &Self {
        if let Some(parent) = path.parent() {
            self.add_dir(parent);
        }
        self.state().insert(path, kind);
        self
    }

    /// Makes listing `path` fail with `kind`.
    pub fn fail_listing(&self, path: impl AsRef<Path>, kind: io::ErrorKind) -> &Self {
        self.state()
            .list_failures
            .insert(path.as_ref().to_path_buf(), kind);
        self
    }

    /// Makes probing `path` fail with `kind`.
    pub fn fail_probe(&self, path: impl AsRef<Path>, kind: io::ErrorKind) -> &Self {
        self.state()
            .probe_failures
            .insert(path.as_ref().to_path_buf(), kind);
        self
    }

    /// Whether `path` exists as a directory.
    #[must_use]
    pub fn is_dir(&self, path: impl AsRef<Path>) -> bool {
        self.state()
            .entries
            .get(path.as_ref())
            .is_some_and(|kind| kind.is_dir)
    }

    fn list(&self, path: &Path) -> io::Result<Vec<OsString>> {
        let state = self.state();
        if let Some(kind) = state.list_failures.get(path) {
            return Err(io::Error::new(*kind, "injected listing failure"));
        }
        match state.entries.get(path) {
            Some(kind) if kind.is_dir => {}
            Some(_) => return Err(io::ErrorKind::NotADirectory.into()),
            None => return Err(io::ErrorKind::NotFound.into()),
        }
        Ok(state
            .children
            .get(path)
            .map(|names| names.iter().cloned().collect())
            .unwrap_or_default())
    }

    fn stat(&self, path: &Path) -> io::Result<EntryKind> {
        let state = self.state();
        if let Some(kind) = state.probe_failures.get(path) {
            return Err(io::Error::new(*kind, "injected probe failure"));
        }
        state
            .entries
            .get(path)
            .copied()
            .ok_or_else(|| io::ErrorKind::NotFound.into())
    }

    fn mkdir(&self, path: &Path) -> io::Result<()> {
        let mut state = self.state();
        if state.entries.contains_key(path) {
            return Err(io::ErrorKind::AlreadyExists.into());
        }
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !state.entries.get(parent).is_some_and(|kind| kind.is_dir)
        {
            return Err(io::ErrorKind::NotFound.into());
        }
        state.insert(path, EntryKind::DIR);
        Ok(())
    }
}

impl MemoryState {
    fn insert(&mut self, path: &Path, kind: EntryKind) {
        self.entries.insert(path.to_path_buf(), kind);
        if let (Some(parent), Some(name)) = (path.parent(), path.file_name()) {
            self.children
                .entry(parent.to_path_buf())
                .or_default()
                .insert(name.to_os_string());
        }
    }
}

impl FileSystem for MemoryFs {
    fn list_entries(&self, path: &Path, done: Completion<Vec<OsString>>) {
        let result = self.list(path);
        done(result);
    }

    fn probe(&self, path: &Path, done: Completion<EntryKind>) {
        let result = self.stat(path);
        done(result);
    }

    fn create_dir(&self, path: &Path, done: Completion<()>) {
        let result = self.mkdir(path);
        done(result);
    }
}
