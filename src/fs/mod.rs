//! Filesystem access layer consumed by the walker and folder scaffolding.
//!
//! Every operation is callback based: it is handed a [`Completion`] and calls
//! it exactly once, either before returning ([`LocalFs`]) or later from a
//! worker thread ([`PooledFs`]). Callers bridge completions into settlements
//! with [`Deferred::resolver`](crate::promise::Deferred::resolver), so no
//! error-first callback convention leaks past this module.

/// In-memory tree with injectable failures.
pub mod memory;

/// Worker-pool backed filesystem.
pub mod pool;

pub use memory::MemoryFs;
pub use pool::PooledFs;

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::Path;

/// Single-use completion callback for a filesystem operation.
pub type Completion<T> = Box<dyn FnOnce(io::Result<T>) + Send + 'static>;

/// Classification of a probed entry.
///
/// Probes do not follow symbolic links, so a link to a directory reports
/// `is_dir == false` and `is_symlink == true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntryKind {
    /// The entry itself is a directory.
    pub is_dir: bool,
    /// The entry itself is a symbolic link.
    pub is_symlink: bool,
}

impl EntryKind {
    /// A plain directory.
    pub const DIR: Self = Self {
        is_dir: true,
        is_symlink: false,
    };

    /// A regular (or any other non-directory, non-link) file.
    pub const FILE: Self = Self {
        is_dir: false,
        is_symlink: false,
    };

    /// A symbolic link.
    pub const SYMLINK: Self = Self {
        is_dir: false,
        is_symlink: true,
    };
}

impl From<fs::FileType> for EntryKind {
    fn from(file_type: fs::FileType) -> Self {
        Self {
            is_dir: file_type.is_dir(),
            is_symlink: file_type.is_symlink(),
        }
    }
}

/// Asynchronous filesystem operations.
pub trait FileSystem: Send + Sync + 'static {
    /// Lists the names of the entries directly inside `path`.
    fn list_entries(&self, path: &Path, done: Completion<Vec<OsString>>);

    /// Classifies `path` without following symbolic links.
    fn probe(&self, path: &Path, done: Completion<EntryKind>);

    /// Creates the single directory `path`. Fails with
    /// [`io::ErrorKind::AlreadyExists`] if something is already there.
    fn create_dir(&self, path: &Path, done: Completion<()>);
}

/// Filesystem that runs every operation inline on the calling thread.
///
/// Completions fire before the call returns, which gives the cooperative,
/// single-threaded scheduling model.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl FileSystem for LocalFs {
    fn list_entries(&self, path: &Path, done: Completion<Vec<OsString>>) {
        done(read_entry_names(path));
    }

    fn probe(&self, path: &Path, done: Completion<EntryKind>) {
        done(probe_entry(path));
    }

    fn create_dir(&self, path: &Path, done: Completion<()>) {
        done(fs::create_dir(path));
    }
}

/// Reads entry names of a directory, in whatever order the OS returns them.
pub(crate) fn read_entry_names(path: &Path) -> io::Result<Vec<OsString>> {
    fs::read_dir(path)?
        .map(|entry| entry.map(|e| e.file_name()))
        .collect()
}

/// Link-aware stat.
pub(crate) fn probe_entry(path: &Path) -> io::Result<EntryKind> {
    fs::symlink_metadata(path).map(|metadata| EntryKind::from(metadata.file_type()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use tempfile::TempDir;

    #[test]
    fn test_local_fs_completes_before_returning() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.txt"), "a").unwrap();
        fs::create_dir(temp.path().join("sub")).unwrap();

        let (tx, rx) = mpsc::channel();
        LocalFs.list_entries(temp.path(), Box::new(move |r| tx.send(r).unwrap()));

        let mut names = rx.try_recv().unwrap().unwrap();
        names.sort();
        assert_eq!(names, vec![OsString::from("a.txt"), OsString::from("sub")]);
    }

    #[test]
    fn test_probe_classifies_entries() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.txt");
        fs::write(&file, "a").unwrap();

        assert_eq!(probe_entry(temp.path()).unwrap(), EntryKind::DIR);
        assert_eq!(probe_entry(&file).unwrap(), EntryKind::FILE);
        assert_eq!(
            probe_entry(&temp.path().join("missing")).unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_probe_does_not_follow_symlinks() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("target");
        let link = temp.path().join("link");
        fs::create_dir(&target).unwrap();
        std::os::unix::fs::symlink(&target, &link).unwrap();

        assert_eq!(probe_entry(&link).unwrap(), EntryKind::SYMLINK);
    }

    #[test]
    fn test_create_dir_reports_existing() {
        let temp = TempDir::new().unwrap();
        let (tx, rx) = mpsc::channel();
        LocalFs.create_dir(temp.path(), Box::new(move |r| tx.send(r).unwrap()));

        assert_eq!(
            rx.try_recv().unwrap().unwrap_err().kind(),
            io::ErrorKind::AlreadyExists
        );
    }
}
