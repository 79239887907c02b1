//! Concurrent recursive directory walk.
//!
//! Each directory level lists its entries, then probes all of them at once.
//! A [`MultiStepResolver`] sized to the entry count turns the per-entry
//! completions back into a single settlement for the level, and that
//! settlement in turn completes one step of the parent's resolver. The first
//! failure anywhere rejects the failing level and is passed up one level at a
//! time until it reaches the caller.
//!
//! Descending into a subdirectory and reporting a finished level to its parent
//! both go through [`trampoline::schedule`], so the stack stays flat however
//! deep the tree is, on inline and pooled backends alike.

use crate::error::TraverseError;
use crate::fs::{Completion, EntryKind, FileSystem};
use crate::promise::{Deferred, MultiStepResolver, Promise, trampoline};
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Callback invoked once per visited entry with `(path, level, is_dir)`.
pub type Visitor = dyn Fn(&Path, usize, bool) + Send + Sync;

/// Settlement of a listing: entry names, or the listing error.
type Listing = Deferred<Vec<OsString>, Arc<io::Error>>;

/// Settlement of a probe, paired with the probed path.
type Probe = Deferred<(PathBuf, EntryKind), (PathBuf, Arc<io::Error>)>;

/// Walks the tree under `root`, calling `visit` for every entry.
///
/// Entries directly under `root` are at level 1. A directory is visited
/// before anything inside it; siblings are visited in no particular order.
/// The returned promise fulfils once the whole tree has been visited, or
/// rejects with the first directory whose listing or entry probe failed.
///
/// ```
/// use arbor::folder::traverse;
/// use arbor::fs::MemoryFs;
/// use arbor::promise::State;
/// use std::sync::Arc;
///
/// let fs = Arc::new(MemoryFs::new());
/// fs.add_file("/root/a.txt").add_file("/root/sub/b.txt");
///
/// let done = traverse(&fs, "/root", |path, level, is_dir| {
///     println!("{level} {is_dir} {}", path.display());
/// });
/// assert_eq!(done.state(), State::Fulfilled);
/// ```
pub fn traverse<S, V>(fs: &Arc<S>, root: impl Into<PathBuf>, visit: V) -> Promise<(), TraverseError>
where
    S: FileSystem + ?Sized,
    V: Fn(&Path, usize, bool) + Send + Sync + 'static,
{
    traverse_from(fs, root, Arc::new(visit), 1)
}

/// Like [`traverse`], with an explicit level for the entries under `root`
/// and a shared visitor.
pub fn traverse_from<S>(
    fs: &Arc<S>,
    root: impl Into<PathBuf>,
    visit: Arc<Visitor>,
    level: usize,
) -> Promise<(), TraverseError>
where
    S: FileSystem + ?Sized,
{
    walk(Arc::clone(fs), root.into(), visit, level)
}

fn walk<S>(fs: Arc<S>, dir: PathBuf, visit: Arc<Visitor>, level: usize) -> Promise<(), TraverseError>
where
    S: FileSystem + ?Sized,
{
    let traversed: Deferred<(), TraverseError> = Deferred::new();
    let listing: Listing = Deferred::new();

    let listed: Completion<Vec<OsString>> =
        Box::new(listing.resolver::<Vec<OsString>, io::Error>());
    fs.list_entries(&dir, listed);

    let on_listed = {
        let traversed = traversed.clone();
        let dir = dir.clone();
        move |names: &Vec<OsString>| {
            debug!(dir = %dir.display(), entries = names.len(), level, "listed directory");
            let steps = traversed.multi_step_resolver(names.len(), ());
            for name in names {
                probe_entry(&fs, &dir, dir.join(name), &visit, level, &steps, &traversed);
            }
        }
    };
    let on_failed = {
        let traversed = traversed.clone();
        move |error: &Arc<io::Error>| {
            warn!(dir = %dir.display(), %error, "failed to list directory");
            traversed.reject(TraverseError::new(dir, Arc::clone(error)));
        }
    };
    listing.promise().on_fulfilled(on_listed).on_rejected(on_failed);

    traversed.promise()
}

fn probe_entry<S>(
    fs: &Arc<S>,
    dir: &Path,
    path: PathBuf,
    visit: &Arc<Visitor>,
    level: usize,
    steps: &MultiStepResolver<(), TraverseError>,
    traversed: &Deferred<(), TraverseError>,
) where
    S: FileSystem + ?Sized,
{
    let probe: Probe = Deferred::new();
    let probed: Completion<EntryKind> =
        Box::new(probe.resolver_with::<EntryKind, io::Error>(path.clone()));
    fs.probe(&path, probed);

    let on_probed = {
        let fs = Arc::clone(fs);
        let visit = Arc::clone(visit);
        let steps = steps.clone();
        move |(path, kind): &(PathBuf, EntryKind)| {
            trace!(path = %path.display(), level, is_dir = kind.is_dir, "visiting entry");
            visit(path.as_path(), level, kind.is_dir);
            if !kind.is_dir {
                steps.step_complete();
                return;
            }

            let path = path.clone();
            trampoline::schedule(move || {
                let rejected = steps.clone();
                walk(fs, path, visit, level + 1)
                    .on_fulfilled(move |()| trampoline::schedule(move || steps.step_complete()))
                    .on_rejected(move |error| {
                        let error = error.clone();
                        trampoline::schedule(move || rejected.reject(error));
                    });
            });
        }
    };
    let on_failed = {
        let traversed = traversed.clone();
        let dir = dir.to_path_buf();
        move |(path, error): &(PathBuf, Arc<io::Error>)| {
            warn!(path = %path.display(), %error, "failed to probe entry");
            traversed.reject(TraverseError::new(dir, Arc::clone(error)));
        }
    };
    probe.promise().on_fulfilled(on_probed).on_rejected(on_failed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFs;
    use crate::promise::{Outcome, State};
    use std::sync::Mutex;

    type Visits = Arc<Mutex<Vec<(PathBuf, usize, bool)>>>;

    fn recording_visitor() -> (Visits, impl Fn(&Path, usize, bool) + Send + Sync + 'static) {
        let visits: Visits = Arc::default();
        let sink = Arc::clone(&visits);
        (visits, move |path: &Path, level, is_dir| {
            sink.lock().unwrap().push((path.to_path_buf(), level, is_dir));
        })
    }

    #[test]
    fn test_empty_root_fulfils_without_visits() {
        let fs = Arc::new(MemoryFs::new());
        fs.add_dir("/root");
        let (visits, visit) = recording_visitor();

        let done = traverse(&fs, "/root", visit);

        assert_eq!(done.state(), State::Fulfilled);
        assert!(visits.lock().unwrap().is_empty());
    }

    #[test]
    fn test_visits_every_entry_with_levels() {
        let fs = Arc::new(MemoryFs::new());
        fs.add_file("/root/a.txt").add_file("/root/sub/b.txt");
        let (visits, visit) = recording_visitor();

        let done = traverse(&fs, "/root", visit);
        assert_eq!(done.state(), State::Fulfilled);

        let visits = visits.lock().unwrap();
        assert_eq!(visits.len(), 3);
        assert!(visits.contains(&(PathBuf::from("/root/a.txt"), 1, false)));
        assert!(visits.contains(&(PathBuf::from("/root/sub"), 1, true)));
        assert!(visits.contains(&(PathBuf::from("/root/sub/b.txt"), 2, false)));

        let sub = visits.iter().position(|v| v.0 == Path::new("/root/sub"));
        let b = visits.iter().position(|v| v.0 == Path::new("/root/sub/b.txt"));
        assert!(sub < b);
    }

    #[test]
    fn test_listing_failure_rejects_with_directory() {
        let fs = Arc::new(MemoryFs::new());
        fs.add_file("/root/a.txt")
            .add_dir("/root/sub")
            .fail_listing("/root/sub", io::ErrorKind::PermissionDenied);
        let (visits, visit) = recording_visitor();

        let done = traverse(&fs, "/root", visit);

        let outcome = done.outcome().unwrap();
        let Outcome::Rejected(error) = &*outcome else {
            panic!("expected rejection, got {outcome:?}");
        };
        assert_eq!(error.path, Path::new("/root/sub"));
        assert_eq!(error.source.kind(), io::ErrorKind::PermissionDenied);
        assert!(
            visits
                .lock()
                .unwrap()
                .contains(&(PathBuf::from("/root/a.txt"), 1, false))
        );
    }

    #[test]
    fn test_probe_failure_rejects_with_parent_directory() {
        let fs = Arc::new(MemoryFs::new());
        fs.add_file("/root/deep/x.txt")
            .fail_probe("/root/deep/x.txt", io::ErrorKind::NotFound);
        let (_, visit) = recording_visitor();

        let done = traverse(&fs, "/root", visit);

        let outcome = done.outcome().unwrap();
        match &*outcome {
            Outcome::Rejected(error) => assert_eq!(error.path, Path::new("/root/deep")),
            Outcome::Fulfilled(()) => panic!("expected rejection"),
        }
    }

    #[test]
    fn test_missing_root_rejects_with_root() {
        let fs = Arc::new(MemoryFs::new());
        let (_, visit) = recording_visitor();

        let done = traverse(&fs, "/nowhere", visit);

        let outcome = done.outcome().unwrap();
        assert_eq!(
            outcome.as_result().unwrap_err().path,
            PathBuf::from("/nowhere")
        );
    }

    #[test]
    fn test_symlinks_are_not_descended() {
        let fs = Arc::new(MemoryFs::new());
        fs.add_dir("/root/real").add_symlink("/root/link");
        let (visits, visit) = recording_visitor();

        traverse(&fs, "/root", visit);

        let visits = visits.lock().unwrap();
        assert!(visits.contains(&(PathBuf::from("/root/link"), 1, false)));
        assert!(visits.contains(&(PathBuf::from("/root/real"), 1, true)));
    }

    #[test]
    fn test_starting_level_is_respected() {
        let fs = Arc::new(MemoryFs::new());
        fs.add_file("/root/a/b.txt");
        let (visits, visit) = recording_visitor();

        traverse_from(&fs, "/root", Arc::new(visit), 4);

        let visits = visits.lock().unwrap();
        assert!(visits.contains(&(PathBuf::from("/root/a"), 4, true)));
        assert!(visits.contains(&(PathBuf::from("/root/a/b.txt"), 5, false)));
    }
}
