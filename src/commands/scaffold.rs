use crate::ArborContext;
use crate::folder::{Folder, TreeSpec, create_folder_tree};
use crate::output;
use crate::promise::Outcome;
use anyhow::{Context, Result};
use std::path::Path;

/// Create the folder tree declared in `spec_path` under `root`
///
/// Returns the number of folders declared below `root`.
///
/// # Errors
///
/// Returns an error if:
/// - The tree file cannot be read or parsed
/// - A declared folder name is not a single path segment
/// - Any folder cannot be created
pub fn execute(ctx: &ArborContext, root: &str, spec_path: &Path) -> Result<usize> {
    let spec = TreeSpec::load(spec_path)?;
    let tree = create_folder_tree(root, &spec)?;
    print_plan(&tree, 0);

    let done = tree.ensure_folder_tree(&ctx.filesystem());
    let outcome = super::wait_for(&done)?;
    if let Outcome::Rejected(error) = &*outcome {
        return Err(error.clone())
            .with_context(|| format!("Failed to scaffold {}", tree.path_str()));
    }

    let count = spec.folder_count();
    output::success(&format!(
        "Scaffolded {count} folders under {}",
        tree.path_str()
    ));
    Ok(count)
}

fn print_plan(folder: &Folder, depth: usize) {
    output::verbose(&format!("{}{}", "  ".repeat(depth), folder.path_str()));
    for child in folder.sub_folders() {
        print_plan(child, depth + 1);
    }
}
