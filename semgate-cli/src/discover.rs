//! Candidate-file discovery: the paths touched between two revisions.

use std::path::Path;

use git2::{DiffOptions, Repository};
use semgate_core::WORKING_REF;
use tracing::warn;

/// List files changed between `base` and `head`. An unreadable repository
/// yields an empty list; the caller reports the empty candidate set.
pub fn changed_files(repo_root: &Path, base: &str, head: &str) -> Vec<String> {
    let repo = match Repository::open(repo_root) {
        Ok(repo) => repo,
        Err(e) => {
            warn!(root = %repo_root.display(), error = %e, "cannot open repository");
            return Vec::new();
        }
    };

    let Some(base_tree) = resolve_tree(&repo, base) else {
        return Vec::new();
    };

    let mut opts = DiffOptions::new();
    let diff = if head == WORKING_REF {
        repo.diff_tree_to_workdir_with_index(Some(&base_tree), Some(&mut opts))
    } else {
        match resolve_tree(&repo, head) {
            Some(head_tree) => {
                repo.diff_tree_to_tree(Some(&base_tree), Some(&head_tree), Some(&mut opts))
            }
            None => return Vec::new(),
        }
    };

    let diff = match diff {
        Ok(diff) => diff,
        Err(e) => {
            warn!(error = %e, "diff failed");
            return Vec::new();
        }
    };

    let mut files = Vec::new();
    for delta in diff.deltas() {
        let path = delta
            .new_file()
            .path()
            .or_else(|| delta.old_file().path())
            .map(|p| p.to_string_lossy().to_string());
        if let Some(path) = path {
            files.push(path);
        }
    }
    files.sort();
    files.dedup();
    files
}

fn resolve_tree<'r>(repo: &'r Repository, reference: &str) -> Option<git2::Tree<'r>> {
    let object = repo.revparse_single(reference).ok()?;
    object.peel_to_commit().ok()?.tree().ok()
}
