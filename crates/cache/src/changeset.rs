//! Changed-path resolution.
//!
//! Two flavors: commit against its first parent (parentless commits diff
//! against the empty tree), and the working copy against the last committed
//! state. Renames are always decomposed into a removal plus an addition.

use std::collections::BTreeSet;

use gix::ObjectId;

use crate::error::{Error, Result};

/// Paths touched by a commit or by the working copy, bucketed by kind.
///
/// All paths are repository-relative with `/` separators. A path appears in
/// at most one bucket per query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// Paths introduced by the change.
    pub added: BTreeSet<String>,
    /// Paths deleted by the change.
    pub removed: BTreeSet<String>,
    /// Paths whose content or type changed.
    pub modified: BTreeSet<String>,
}

impl ChangeSet {
    /// Whether no path changed at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }
}

/// Diff a commit's tree against its first parent's tree.
///
/// With no parent the empty tree stands in, so every path in a root commit
/// comes back as added.
pub(crate) fn commit_changes(
    repo: &gix::Repository,
    parent: Option<ObjectId>,
    commit: ObjectId,
) -> Result<ChangeSet> {
    let new_tree = repo
        .find_commit(commit)
        .map_err(|e| Error::git(e.to_string()))?
        .tree()
        .map_err(|e| Error::git(e.to_string()))?;
    let old_tree = match parent {
        Some(parent) => repo
            .find_commit(parent)
            .map_err(|e| Error::git(e.to_string()))?
            .tree()
            .map_err(|e| Error::git(e.to_string()))?,
        None => repo.empty_tree(),
    };

    let changes = repo
        .diff_tree_to_tree(Some(&old_tree), Some(&new_tree), None)
        .map_err(|e| Error::git(e.to_string()))?;

    let mut set = ChangeSet::default();
    for change in changes {
        use gix::diff::tree_with_rewrites::Change;
        match change {
            Change::Addition { location, .. } => {
                set.added.insert(location.to_string());
            }
            Change::Deletion { location, .. } => {
                set.removed.insert(location.to_string());
            }
            Change::Modification { location, .. } => {
                set.modified.insert(location.to_string());
            }
            Change::Rewrite {
                source_location,
                location,
                ..
            } => {
                set.removed.insert(source_location.to_string());
                set.added.insert(location.to_string());
            }
        }
    }
    Ok(set)
}

/// Classify index/worktree differences against the last committed state.
///
/// Untracked files count as added, a wider net than a pure index
/// comparison, which would skip anything never staged. Rewrite tracking
/// stays off, so moved files surface as a removal plus an addition here
/// too.
pub(crate) fn working_copy_changes(repo: &gix::Repository) -> Result<ChangeSet> {
    let status = repo
        .status(gix::progress::Discard)
        .map_err(|e| Error::git(e.to_string()))?;
    let iter = status
        .into_index_worktree_iter(Vec::<gix::bstr::BString>::new())
        .map_err(|e| Error::git(e.to_string()))?;

    let mut set = ChangeSet::default();
    for item in iter {
        let item = item.map_err(|e| Error::git(e.to_string()))?;
        let Some(summary) = item.summary() else {
            continue;
        };
        let path = item.rela_path().to_string();
        use gix::status::index_worktree::iter::Summary;
        match summary {
            Summary::Added | Summary::IntentToAdd | Summary::Renamed | Summary::Copied => {
                set.added.insert(path);
            }
            Summary::Removed => {
                set.removed.insert(path);
            }
            Summary::Modified | Summary::TypeChange | Summary::Conflict => {
                set.modified.insert(path);
            }
        }
    }
    Ok(set)
}
