//! Content retrieval, injected into the orchestrator rather than living in a
//! swappable global. The sentinel ref [`WORKING_REF`] means "working copy"
//! (filesystem read); any other ref is a historical revision resolved through
//! git. Non-existence is `None`, never an error; a missing side of a diff
//! is file-added or file-deleted semantics.

use std::path::{Path, PathBuf};

use git2::{DiffFormat, DiffOptions, Repository};
use tracing::warn;

/// Sentinel ref meaning "the working copy on disk".
pub const WORKING_REF: &str = "WORKING";

/// Retrieval seam between the engine and the outside world.
pub trait ContentProvider: Send + Sync {
    /// File text at `reference`, or `None` when the file does not exist
    /// there.
    fn content(&self, path: &str, reference: &str) -> Option<String>;

    /// Unified-diff text for `path` between the two refs, or `None` when no
    /// patch is available. The hunk builder falls back to a whole-file hunk.
    fn patch(&self, path: &str, base_ref: &str, head_ref: &str) -> Option<String>;
}

/// Filesystem + git-backed provider rooted at a repository checkout.
pub struct FsGitProvider {
    root: PathBuf,
}

impl FsGitProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn revision_content(&self, path: &str, reference: &str) -> Option<String> {
        let repo = match Repository::open(&self.root) {
            Ok(repo) => repo,
            Err(e) => {
                warn!(root = %self.root.display(), error = %e, "cannot open repository");
                return None;
            }
        };
        let object = repo.revparse_single(reference).ok()?;
        let commit = object.peel_to_commit().ok()?;
        let tree = commit.tree().ok()?;
        let entry = tree.get_path(Path::new(path)).ok()?;
        let blob = entry.to_object(&repo).ok()?.peel_to_blob().ok()?;
        String::from_utf8(blob.content().to_vec()).ok()
    }

    fn resolve_tree<'r>(&self, repo: &'r Repository, reference: &str) -> Option<git2::Tree<'r>> {
        let object = repo.revparse_single(reference).ok()?;
        object.peel_to_commit().ok()?.tree().ok()
    }
}

impl ContentProvider for FsGitProvider {
    fn content(&self, path: &str, reference: &str) -> Option<String> {
        if reference == WORKING_REF {
            return match std::fs::read_to_string(self.root.join(path)) {
                Ok(text) => Some(text),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
                Err(e) => {
                    warn!(path, error = %e, "working-copy read failed");
                    None
                }
            };
        }
        self.revision_content(path, reference)
    }

    fn patch(&self, path: &str, base_ref: &str, head_ref: &str) -> Option<String> {
        let repo = Repository::open(&self.root).ok()?;
        let base_tree = self.resolve_tree(&repo, base_ref)?;

        let mut opts = DiffOptions::new();
        opts.pathspec(path);

        let diff = if head_ref == WORKING_REF {
            repo.diff_tree_to_workdir_with_index(Some(&base_tree), Some(&mut opts))
                .ok()?
        } else {
            let head_tree = self.resolve_tree(&repo, head_ref)?;
            repo.diff_tree_to_tree(Some(&base_tree), Some(&head_tree), Some(&mut opts))
                .ok()?
        };

        let mut out = String::new();
        diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
            match line.origin() {
                '+' | '-' | ' ' => out.push(line.origin()),
                _ => {}
            }
            out.push_str(std::str::from_utf8(line.content()).unwrap_or(""));
            true
        })
        .ok()?;

        if out.is_empty() {
            None
        } else {
            Some(out)
        }
    }
}

/// In-memory provider for tests: content keyed by `(path, ref)`, patches by
/// `(path, base, head)`.
#[derive(Default)]
pub struct MapProvider {
    contents: std::collections::HashMap<(String, String), String>,
    patches: std::collections::HashMap<(String, String, String), String>,
}

impl MapProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content(mut self, path: &str, reference: &str, text: &str) -> Self {
        self.contents
            .insert((path.to_string(), reference.to_string()), text.to_string());
        self
    }

    pub fn with_patch(mut self, path: &str, base: &str, head: &str, patch: &str) -> Self {
        self.patches.insert(
            (path.to_string(), base.to_string(), head.to_string()),
            patch.to_string(),
        );
        self
    }
}

impl ContentProvider for MapProvider {
    fn content(&self, path: &str, reference: &str) -> Option<String> {
        self.contents
            .get(&(path.to_string(), reference.to_string()))
            .cloned()
    }

    fn patch(&self, path: &str, base_ref: &str, head_ref: &str) -> Option<String> {
        self.patches
            .get(&(path.to_string(), base_ref.to_string(), head_ref.to_string()))
            .cloned()
    }
}
