#![allow(dead_code)]

use anyhow::Result;
use arbor::error::TraverseError;
use arbor::folder::traverse;
use arbor::fs::FileSystem;
use arbor::promise::{Outcome, Promise};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use walkdir::WalkDir;

/// One visit reported by the walker: path, level, directory flag.
pub type Visit = (PathBuf, usize, bool);

/// Temporary directory tree fixture for consistent test setup
pub struct TestTree {
    pub temp_dir: TempDir,
    pub root: PathBuf,
}

impl TestTree {
    /// Create an empty tree under a fresh temporary directory
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().join("root");
        fs::create_dir(&root)?;
        Ok(Self { temp_dir, root })
    }

    /// Add a file (and its parent directories) relative to the root
    pub fn file(&self, relative: &str) -> Result<&Self> {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, relative)?;
        Ok(self)
    }

    /// Add a directory (and its parents) relative to the root
    pub fn dir(&self, relative: &str) -> Result<&Self> {
        fs::create_dir_all(self.root.join(relative))?;
        Ok(self)
    }

    /// The tree every test gets unless it needs something specific:
    /// `a.txt`, `sub/b.txt`, `sub/deeper/c.rs`, `empty/`
    pub fn sample() -> Result<Self> {
        let tree = Self::new()?;
        tree.file("a.txt")?
            .file("sub/b.txt")?
            .file("sub/deeper/c.rs")?
            .dir("empty")?;
        Ok(tree)
    }

    /// Get the temporary directory path
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }
}

/// What a walk of `root` should report, computed with walkdir.
pub fn oracle(root: &Path) -> BTreeSet<Visit> {
    WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .map(|entry| {
            (
                entry.path().to_path_buf(),
                entry.depth(),
                entry.file_type().is_dir(),
            )
        })
        .collect()
}

/// Blocks until `promise` settles, failing the test after a timeout.
pub fn wait<T, E>(promise: &Promise<T, E>) -> Arc<Outcome<T, E>>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    let (tx, rx) = mpsc::channel();
    promise.on_settled(move |_| {
        let _ = tx.send(());
    });
    rx.recv_timeout(Duration::from_secs(10))
        .expect("settlement did not arrive in time");
    promise.outcome().expect("settled promise has an outcome")
}

/// Walks `root` and returns the outcome together with every visit in the
/// order reported.
pub fn walk<S>(fs: &Arc<S>, root: &Path) -> (Arc<Outcome<(), TraverseError>>, Vec<Visit>)
where
    S: FileSystem + ?Sized,
{
    let visits: Arc<Mutex<Vec<Visit>>> = Arc::default();
    let sink = Arc::clone(&visits);
    let done = traverse(fs, root, move |path, level, is_dir| {
        sink.lock().unwrap().push((path.to_path_buf(), level, is_dir));
    });
    let outcome = wait(&done);
    let visits = visits.lock().unwrap().clone();
    (outcome, visits)
}
