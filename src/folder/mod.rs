//! Folder objects and the concurrent tree walker.
//!
//! - [`traverse`] walks an existing tree.
//! - [`Folder`] describes a folder hierarchy (declared in code or through a
//!   [`TreeSpec`]) and can make it exist on disk with
//!   [`Folder::ensure_folder_tree`], which fans out one creation per child
//!   the same way the walker fans out one probe per entry.

/// Concurrent recursive directory walk.
pub mod traverse;

/// Declarative folder hierarchies.
pub mod tree;

pub use traverse::{Visitor, traverse, traverse_from};
pub use tree::{TreeSpec, create_folder_tree};

use crate::error::FolderError;
use crate::fs::FileSystem;
use crate::promise::{Deferred, Promise, trampoline};
use crate::utils::Transformer;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// What currently sits at a folder's path on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderStatus {
    /// Nothing (or a dangling link).
    Missing,
    /// A directory.
    Directory,
    /// A symbolic link to something that exists.
    SymbolicLink,
    /// Anything else.
    File,
}

impl fmt::Display for FolderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Missing => "[DOES NOT EXIST]",
            Self::Directory => "[DIR]",
            Self::SymbolicLink => "[LINK]",
            Self::File => "[FILE]",
        })
    }
}

/// A folder at a normalised path, with an optional declared sub tree.
///
/// The path always ends in `/`, so globs and child paths can be built by
/// plain concatenation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folder {
    name: String,
    path: String,
    sub_folders: BTreeMap<String, Folder>,
}

impl Folder {
    /// Creates a folder object for `path`. Nothing is touched on disk.
    ///
    /// ```
    /// use arbor::folder::Folder;
    ///
    /// let folder = Folder::new("a/b/../c/d");
    /// assert_eq!(folder.name(), "d");
    /// assert_eq!(folder.path_str(), "a/c/d/");
    /// ```
    #[must_use]
    pub fn new(raw: &str) -> Self {
        let name = basename(raw).to_string();
        let mut path = normalize(raw);
        if !path.ends_with('/') {
            path.push('/');
        }
        Self {
            name,
            path,
            sub_folders: BTreeMap::new(),
        }
    }

    /// Last segment of the path the folder was created from.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Normalised path, with a trailing `/`.
    #[must_use]
    pub fn path_str(&self) -> &str {
        &self.path
    }

    /// Normalised path, with a trailing `/`.
    #[must_use]
    pub fn path(&self) -> &Path {
        Path::new(&self.path)
    }

    /// The path resolved against the current directory, without a trailing
    /// separator.
    ///
    /// # Errors
    ///
    /// Returns an error if the current directory cannot be determined.
    pub fn absolute_path(&self) -> io::Result<PathBuf> {
        if self.path.starts_with('/') {
            return Ok(PathBuf::from(normalize(&self.path)));
        }
        let cwd = std::env::current_dir()?;
        let joined = format!("{}/{}", cwd.to_string_lossy(), self.path);
        Ok(PathBuf::from(normalize(&joined)))
    }

    /// Declares a sub folder and returns it. Replaces any previous sub folder
    /// with the same name.
    ///
    /// # Errors
    ///
    /// Returns [`FolderError::InvalidName`] if `name` is empty or contains a
    /// path delimiter.
    pub fn add_sub_folder(&mut self, name: &str) -> Result<&mut Self, FolderError> {
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(FolderError::InvalidName(name.to_string()));
        }
        let child = Self::new(&format!("{}{name}", self.path));
        let slot = match self.sub_folders.entry(name.to_string()) {
            Entry::Occupied(mut entry) => {
                entry.insert(child);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(child),
        };
        Ok(slot)
    }

    /// A sub folder previously declared with [`add_sub_folder`](Self::add_sub_folder).
    #[must_use]
    pub fn sub_folder(&self, name: &str) -> Option<&Self> {
        self.sub_folders.get(name)
    }

    /// Mutable access to a declared sub folder.
    pub fn sub_folder_mut(&mut self, name: &str) -> Option<&mut Self> {
        self.sub_folders.get_mut(name)
    }

    /// Declared sub folders, by name.
    pub fn sub_folders(&self) -> impl Iterator<Item = &Self> {
        self.sub_folders.values()
    }

    /// Path of `sub_path` inside this folder, after applying `transformer`
    /// to it. An empty `sub_path` yields the folder's own path.
    ///
    /// ```
    /// use arbor::folder::Folder;
    /// use arbor::utils::Transformer;
    ///
    /// let folder = Folder::new("a/b");
    /// let tokens = Transformer::literal([("${NAME}", "main")]);
    /// assert_eq!(
    ///     folder.child_path("${NAME}.rs", Some(&tokens)).to_str(),
    ///     Some("a/b/main.rs")
    /// );
    /// ```
    #[must_use]
    pub fn child_path(&self, sub_path: &str, transformer: Option<&Transformer>) -> PathBuf {
        if sub_path.is_empty() {
            return PathBuf::from(&self.path);
        }
        let sub_path = match transformer {
            Some(transformer) => transformer.apply(sub_path),
            None => sub_path.to_string(),
        };
        PathBuf::from(normalize(&format!("{}{sub_path}", self.path)))
    }

    /// Glob matching every entry below this folder, optionally restricted to
    /// one file extension. Glob metacharacters in the folder path match
    /// literally.
    #[must_use]
    pub fn all_files_pattern(&self, extension: Option<&str>) -> String {
        let base = glob::Pattern::escape(&self.path);
        match extension {
            Some(ext) if !ext.is_empty() => format!("{base}**/*.{ext}"),
            _ => format!("{base}**/*"),
        }
    }

    /// Inspects the folder's path on disk without following a final link.
    #[must_use]
    pub fn status(&self) -> FolderStatus {
        let path = self.absolute_path().unwrap_or_else(|_| PathBuf::from(&self.path));
        if !path.exists() {
            return FolderStatus::Missing;
        }
        match std::fs::symlink_metadata(&path) {
            Ok(metadata) if metadata.is_dir() => FolderStatus::Directory,
            Ok(metadata) if metadata.file_type().is_symlink() => FolderStatus::SymbolicLink,
            Ok(_) => FolderStatus::File,
            Err(_) => FolderStatus::Missing,
        }
    }

    /// Makes sure a directory exists at this folder's path. Its parent must
    /// already exist; an existing entry of any kind counts as success.
    pub fn ensure_folder<S>(&self, fs: &Arc<S>) -> Promise<(), FolderError>
    where
        S: FileSystem + ?Sized,
    {
        let ensured: Deferred<(), FolderError> = Deferred::new();
        let created: Deferred<(), Arc<io::Error>> = Deferred::new();
        fs.create_dir(self.path(), Box::new(created.resolver::<(), io::Error>()));

        let on_created = {
            let ensured = ensured.clone();
            let path = self.path.clone();
            move |(): &()| {
                debug!(path = %path, "created folder");
                ensured.fulfill(());
            }
        };
        let on_failed = {
            let ensured = ensured.clone();
            let path = PathBuf::from(&self.path);
            move |error: &Arc<io::Error>| {
                if error.kind() == io::ErrorKind::AlreadyExists {
                    ensured.fulfill(());
                } else {
                    ensured.reject(FolderError::Create {
                        path,
                        source: Arc::clone(error),
                    });
                }
            }
        };
        created.promise().on_fulfilled(on_created).on_rejected(on_failed);

        ensured.promise()
    }

    /// Makes sure this folder and every declared sub folder exist.
    ///
    /// The folder itself is created first; then all children are ensured
    /// concurrently and the result settles once every child subtree has.
    /// The first failure rejects.
    pub fn ensure_folder_tree<S>(&self, fs: &Arc<S>) -> Promise<(), FolderError>
    where
        S: FileSystem + ?Sized,
    {
        let tree: Deferred<(), FolderError> = Deferred::new();
        let ensured = self.ensure_folder(fs);

        let on_ensured = {
            let tree = tree.clone();
            let fs = Arc::clone(fs);
            let children: Vec<Self> = self.sub_folders.values().cloned().collect();
            move |(): &()| {
                let steps = tree.multi_step_resolver(children.len(), ());
                for child in &children {
                    let (done, failed) = (steps.clone(), steps.clone());
                    let (child, fs) = (child.clone(), Arc::clone(&fs));
                    trampoline::schedule(move || {
                        child
                            .ensure_folder_tree(&fs)
                            .on_fulfilled(move |()| trampoline::schedule(move || done.step_complete()))
                            .on_rejected(move |error| {
                                let error = error.clone();
                                trampoline::schedule(move || failed.reject(error));
                            });
                    });
                }
            }
        };
        let on_failed = {
            let tree = tree.clone();
            move |error: &FolderError| {
                tree.reject(error.clone());
            }
        };
        ensured.on_fulfilled(on_ensured).on_rejected(on_failed);

        tree.promise()
    }
}

/// Final path segment of `path`, ignoring trailing separators.
fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or_default()
}

/// Lexically normalises a `/`-separated path: drops empty and `.` segments
/// and resolves `..` against preceding segments. An empty relative result
/// becomes `.`.
pub(crate) fn normalize(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if absolute => {}
                _ => parts.push(".."),
            },
            _ => parts.push(segment),
        }
    }

    let joined = parts.join("/");
    match (absolute, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}
