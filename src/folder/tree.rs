use super::Folder;
use crate::error::FolderError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// A declared folder hierarchy: each key is a sub folder name, each value its
/// own sub tree.
///
/// In TOML every folder is a table, so a leaf is an empty table:
///
/// ```toml
/// [app.scripts]
/// [app.styles]
/// [test]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TreeSpec(pub BTreeMap<String, TreeSpec>);

impl TreeSpec {
    /// Parses a tree from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a table of tables.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse folder tree")
    }

    /// Loads a tree from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read tree file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid tree file: {}", path.display()))
    }

    /// Number of folders declared at any depth.
    #[must_use]
    pub fn folder_count(&self) -> usize {
        self.0.values().map(|sub| 1 + sub.folder_count()).sum()
    }
}

/// Builds a [`Folder`] rooted at `root` carrying every folder `spec`
/// declares. Nothing is created on disk; see [`Folder::ensure_folder_tree`].
///
/// # Errors
///
/// Returns [`FolderError::InvalidName`] for the first declared name that is
/// not a single path segment.
pub fn create_folder_tree(root: &str, spec: &TreeSpec) -> Result<Folder, FolderError> {
    let mut folder = Folder::new(root);
    add_children(&mut folder, spec)?;
    Ok(folder)
}

fn add_children(folder: &mut Folder, spec: &TreeSpec) -> Result<(), FolderError> {
    for (name, sub) in &spec.0 {
        let child = folder.add_sub_folder(name)?;
        add_children(child, sub)?;
    }
    Ok(())
}
