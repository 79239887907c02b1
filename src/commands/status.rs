use crate::folder::{Folder, FolderStatus};
use crate::output;

/// Print the status marker of every path
///
/// Returns the statuses in argument order.
pub fn execute(paths: &[String]) -> Vec<FolderStatus> {
    paths
        .iter()
        .map(|path| {
            let status = Folder::new(path).status();
            println!("{}", output::status_line(status, path));
            status
        })
        .collect()
}
