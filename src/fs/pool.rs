use super::{Completion, EntryKind, FileSystem, probe_entry, read_entry_names};
use crate::utils::thread_pool;
use std::ffi::OsString;
use std::path::Path;
use std::sync::Arc;

/// Filesystem that issues every operation as a task on a rayon pool.
///
/// Completions fire on worker threads, in whatever order the I/O finishes.
/// Nothing limits the number of queued operations; the pool size only bounds
/// how many run at once.
#[derive(Clone)]
pub struct PooledFs {
    pool: Arc<rayon::ThreadPool>,
}

impl PooledFs {
    /// Uses the given pool.
    #[must_use]
    pub const fn new(pool: Arc<rayon::ThreadPool>) -> Self {
        Self { pool }
    }

    /// Uses the process-wide pool from [`thread_pool::get_thread_pool`].
    #[must_use]
    pub fn global() -> Self {
        Self::new(thread_pool::get_thread_pool())
    }

    /// Number of worker threads.
    #[must_use]
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl std::fmt::Debug for PooledFs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledFs")
            .field("threads", &self.threads())
            .finish()
    }
}

impl FileSystem for PooledFs {
    fn list_entries(&self, path: &Path, done: Completion<Vec<OsString>>) {
        let path = path.to_path_buf();
        self.pool.spawn(move || done(read_entry_names(&path)));
    }

    fn probe(&self, path: &Path, done: Completion<EntryKind>) {
        let path = path.to_path_buf();
        self.pool.spawn(move || done(probe_entry(&path)));
    }

    fn create_dir(&self, path: &Path, done: Completion<()>) {
        let path = path.to_path_buf();
        self.pool.spawn(move || done(std::fs::create_dir(&path)));
    }
}
