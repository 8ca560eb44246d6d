//! Per-repository cache of commits, trees, blobs and changesets.
//!
//! One [`RepoCache`] exists per repository root (enforced by
//! [`RepoRegistry`]). Cached values describe immutable git objects, so
//! nothing here is ever invalidated or overwritten; the only state that
//! grows is the commit log, extended by [`RepoCache::refresh`].
//!
//! [`RepoRegistry`]: crate::RepoRegistry

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};

use bytes::Bytes;
use gix::ObjectId;
use tracing::debug;

use crate::changeset::{self, ChangeSet};
use crate::error::{Error, Result};
use crate::metrics::{CacheMetrics, CacheMetricsSnapshot};

/// Identifier of a commit object.
pub type CommitId = ObjectId;

/// Cached essentials of a commit object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    /// The commit's own id.
    pub id: CommitId,
    /// Raw commit message, trailing newline included.
    pub message: String,
    /// Parent commit ids in commit order.
    pub parents: Vec<CommitId>,
    /// Id of the commit's root tree.
    pub tree: ObjectId,
}

/// Handle to a commit's root tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeView {
    /// The commit the tree belongs to.
    pub commit: CommitId,
    /// Id of the root tree object.
    pub root: ObjectId,
}

/// Ordered commit log plus the bookkeeping for incremental extension.
#[derive(Debug, Default)]
struct CommitLog {
    commits: Vec<CommitId>,
    seen: HashSet<CommitId>,
    latest: Option<CommitId>,
}

/// Resolved tree entry kind at a repository-relative path.
#[derive(Debug, Clone, Copy)]
enum Node {
    Directory(ObjectId),
    Content(ObjectId),
}

/// Commit-scoped cache over one repository.
///
/// Thread-safe; all methods take `&self`. The underlying repository handle
/// is shared read-only and re-localized per operation.
#[derive(Debug)]
pub struct RepoCache {
    repo: gix::ThreadSafeRepository,
    root: PathBuf,
    log: Mutex<CommitLog>,
    records: RwLock<HashMap<CommitId, CommitRecord>>,
    trees: RwLock<HashMap<CommitId, ObjectId>>,
    entries: RwLock<HashMap<(CommitId, String), Option<Node>>>,
    listings: RwLock<HashMap<(CommitId, String), Vec<String>>>,
    blobs: RwLock<HashMap<(CommitId, String), Option<Bytes>>>,
    changed: RwLock<HashMap<CommitId, ChangeSet>>,
    metrics: CacheMetrics,
}

impl RepoCache {
    /// Resolve the repository enclosing `path` and its canonical root.
    ///
    /// This is the cheap half of construction; no history is walked. Bare
    /// repositories are rejected.
    pub(crate) fn discover(path: &Path) -> Result<(gix::Repository, PathBuf)> {
        let repo =
            gix::discover(path).map_err(|e| Error::repository_init(path, e.to_string()))?;
        let workdir = repo
            .workdir()
            .ok_or_else(|| Error::repository_init(path, "bare repositories are not supported"))?;
        let root = std::fs::canonicalize(workdir)
            .map_err(|e| Error::repository_init(path, e.to_string()))?;
        Ok((repo, root))
    }

    /// Build the cache for a discovered repository and run the initial
    /// history walk.
    pub(crate) fn open(repo: gix::Repository, root: PathBuf) -> Result<Self> {
        debug!(root = %root.display(), "opened repository");
        let cache = Self {
            repo: repo.into_sync(),
            root,
            log: Mutex::new(CommitLog::default()),
            records: RwLock::new(HashMap::new()),
            trees: RwLock::new(HashMap::new()),
            entries: RwLock::new(HashMap::new()),
            listings: RwLock::new(HashMap::new()),
            blobs: RwLock::new(HashMap::new()),
            changed: RwLock::new(HashMap::new()),
            metrics: CacheMetrics::default(),
        };
        cache.refresh()?;
        Ok(cache)
    }

    /// Canonical repository root this cache is keyed by.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Snapshot of the commit log as of the last refresh.
    ///
    /// The initial population is newest-first; later refreshes append newly
    /// discovered commits at the end.
    #[must_use]
    pub fn commits(&self) -> Vec<CommitId> {
        let log = self.log.lock().unwrap_or_else(PoisonError::into_inner);
        log.commits.clone()
    }

    /// The newest commit observed by the last refresh.
    #[must_use]
    pub fn latest(&self) -> Option<CommitId> {
        let log = self.log.lock().unwrap_or_else(PoisonError::into_inner);
        log.latest
    }

    /// Extend the commit log with history that appeared since the last walk.
    ///
    /// Walks newest-first from all reference tips. When the newest tip
    /// matches the last-observed latest commit the log is already current
    /// and no walk state changes. Newly discovered commits are appended at
    /// the end of the log, oldest first.
    pub fn refresh(&self) -> Result<()> {
        let repo = self.repo.to_thread_local();
        let mut tips = Vec::new();
        let platform = repo
            .references()
            .map_err(|e| Error::git(e.to_string()))?;
        let refs = platform.all().map_err(|e| Error::git(e.to_string()))?;
        for reference in refs {
            let mut reference = reference.map_err(|e| Error::git(e.to_string()))?;
            // Broken or dangling refs contribute no tip.
            if let Ok(id) = reference.peel_to_id_in_place() {
                tips.push(id.detach());
            }
        }
        tips.sort_unstable();
        tips.dedup();
        if tips.is_empty() {
            return Ok(());
        }

        let mut log = self.log.lock().unwrap_or_else(PoisonError::into_inner);
        let walk = repo
            .rev_walk(tips)
            .sorting(gix::revision::walk::Sorting::ByCommitTime(
                Default::default(),
            ))
            .all()
            .map_err(|e| Error::git(e.to_string()))?;

        let mut newest = None;
        let mut discovered = Vec::new();
        for info in walk {
            let info = info.map_err(|e| Error::git(e.to_string()))?;
            if newest.is_none() {
                if log.latest == Some(info.id) {
                    return Ok(());
                }
                newest = Some(info.id);
            }
            if !log.seen.contains(&info.id) {
                discovered.push(info.id);
            }
        }
        let Some(newest) = newest else {
            return Ok(());
        };

        if log.latest.is_some() {
            // Incremental extensions go to the end of the log, oldest first.
            discovered.reverse();
        }
        log.seen.extend(discovered.iter().copied());
        log.commits.extend(discovered.iter().copied());
        log.latest = Some(newest);
        self.metrics.record_log_refresh();
        debug!(
            discovered = discovered.len(),
            total = log.commits.len(),
            "refreshed commit log"
        );
        Ok(())
    }

    /// Resolve a revision spec to a commit id.
    ///
    /// `None` resolves `HEAD`. Anything `git rev-parse` would accept works
    /// as a spec: full or abbreviated hash, branch or tag name.
    pub fn resolve_commit(&self, reference: Option<&str>) -> Result<CommitId> {
        let repo = self.repo.to_thread_local();
        match reference {
            None => {
                let id = repo
                    .head_id()
                    .map_err(|e| Error::commit_resolution("HEAD", e.to_string()))?;
                Ok(id.detach())
            }
            Some(spec) => {
                let id = repo
                    .rev_parse_single(spec)
                    .map_err(|e| Error::commit_resolution(spec, e.to_string()))?;
                let object = id
                    .object()
                    .map_err(|e| Error::commit_resolution(spec, e.to_string()))?;
                let commit = object
                    .peel_to_kind(gix::object::Kind::Commit)
                    .map_err(|e| Error::commit_resolution(spec, e.to_string()))?;
                Ok(commit.id)
            }
        }
    }

    /// Cached record of a commit, loading it from the backend once.
    pub fn commit_by_hash(&self, id: CommitId) -> Result<CommitRecord> {
        if let Some(record) = self
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
        {
            return Ok(record.clone());
        }
        let record = self.load_commit(id)?;
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, record.clone());
        Ok(record)
    }

    /// Commit record by position in the log, refreshing the log first.
    pub fn commit_by_index(&self, index: usize) -> Result<CommitRecord> {
        self.refresh()?;
        let id = {
            let log = self.log.lock().unwrap_or_else(PoisonError::into_inner);
            log.commits
                .get(index)
                .copied()
                .ok_or_else(|| Error::index_out_of_range(index, log.commits.len()))?
        };
        self.commit_by_hash(id)
    }

    /// Commit messages for the whole log, in log order.
    pub fn commit_messages(&self) -> Result<Vec<String>> {
        self.commits()
            .into_iter()
            .map(|id| Ok(self.commit_by_hash(id)?.message))
            .collect()
    }

    /// Handle to the commit's root tree, memoized per commit.
    pub fn tree_at(&self, commit: CommitId) -> Result<TreeView> {
        if let Some(root) = self
            .trees
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&commit)
            .copied()
        {
            return Ok(TreeView { commit, root });
        }
        let record = self.commit_by_hash(commit)?;
        self.metrics.record_tree_load();
        self.trees
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(commit, record.tree);
        Ok(TreeView {
            commit,
            root: record.tree,
        })
    }

    /// Blob bytes at a repository-relative path, as of `commit`.
    ///
    /// Returns `None` for missing paths and for directories. Both outcomes
    /// are cached permanently, negative ones included.
    pub fn file_contents_at(&self, commit: CommitId, rel_path: &str) -> Result<Option<Bytes>> {
        let key = (commit, rel_path.to_string());
        if let Some(cached) = self
            .blobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(cached.clone());
        }
        let repo = self.repo.to_thread_local();
        let contents = match self.entry_at(&repo, commit, rel_path)? {
            Some(Node::Content(id)) => {
                let mut blob = repo.find_blob(id).map_err(|e| Error::git(e.to_string()))?;
                self.metrics.record_blob_load();
                Some(Bytes::from(blob.take_data()))
            }
            _ => None,
        };
        self.blobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, contents.clone());
        Ok(contents)
    }

    /// Whether the path names a directory at `commit`. The empty path is
    /// the repository root and always a directory.
    pub fn is_directory_at(&self, commit: CommitId, rel_path: &str) -> Result<bool> {
        let repo = self.repo.to_thread_local();
        Ok(matches!(
            self.entry_at(&repo, commit, rel_path)?,
            Some(Node::Directory(_))
        ))
    }

    /// Whether the path exists at all (file, symlink or directory) at
    /// `commit`.
    pub fn path_exists(&self, commit: CommitId, rel_path: &str) -> Result<bool> {
        let repo = self.repo.to_thread_local();
        Ok(self.entry_at(&repo, commit, rel_path)?.is_some())
    }

    /// Entry names of the directory at `rel_path`, in tree order.
    ///
    /// Missing paths and non-directories produce an empty list. Listings
    /// are memoized per `(commit, path)`, empty ones included.
    pub fn list_paths(&self, commit: CommitId, rel_path: &str) -> Result<Vec<String>> {
        let key = (commit, rel_path.to_string());
        if let Some(names) = self
            .listings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(names.clone());
        }
        let repo = self.repo.to_thread_local();
        let mut names = Vec::new();
        if let Some(Node::Directory(tree_id)) = self.entry_at(&repo, commit, rel_path)? {
            let tree = repo
                .find_tree(tree_id)
                .map_err(|e| Error::git(e.to_string()))?;
            for entry in tree.iter() {
                let entry = entry.map_err(|e| Error::git(e.to_string()))?;
                names.push(entry.filename().to_string());
            }
        }
        self.listings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, names.clone());
        Ok(names)
    }

    /// Paths touched by a commit (against its first parent), or by the
    /// working copy when `commit` is `None`.
    ///
    /// Commit-keyed results are cached permanently; the working-copy query
    /// always re-inspects the worktree.
    pub fn changed_paths(&self, commit: Option<CommitId>) -> Result<ChangeSet> {
        let repo = self.repo.to_thread_local();
        match commit {
            None => {
                self.metrics.record_diff_computation();
                changeset::working_copy_changes(&repo)
            }
            Some(id) => {
                if let Some(set) = self
                    .changed
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .get(&id)
                {
                    return Ok(set.clone());
                }
                let record = self.commit_by_hash(id)?;
                let parent = record.parents.first().copied();
                self.metrics.record_diff_computation();
                let set = changeset::commit_changes(&repo, parent, id)?;
                self.changed
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(id, set.clone());
                Ok(set)
            }
        }
    }

    /// Point-in-time view of this cache's backend fetch counters.
    #[must_use]
    pub fn metrics(&self) -> CacheMetricsSnapshot {
        self.metrics.snapshot()
    }

    fn load_commit(&self, id: CommitId) -> Result<CommitRecord> {
        let repo = self.repo.to_thread_local();
        let commit = repo
            .find_commit(id)
            .map_err(|e| Error::git(e.to_string()))?;
        let message = commit.message_raw_sloppy().to_string();
        let parents = commit.parent_ids().map(gix::Id::detach).collect();
        let tree = commit
            .tree_id()
            .map_err(|e| Error::git(e.to_string()))?
            .detach();
        self.metrics.record_commit_load();
        Ok(CommitRecord {
            id,
            message,
            parents,
            tree,
        })
    }

    /// Resolve what lives at a repository-relative path in the commit's
    /// tree. Blob and symlink entries count as content; anything else that
    /// is not a tree (submodule entries) resolves to nothing.
    ///
    /// Resolutions are memoized per `(commit, path)`, misses included, so
    /// repeated tree-level queries never re-decode trees from the backend.
    fn entry_at(
        &self,
        repo: &gix::Repository,
        commit: CommitId,
        rel_path: &str,
    ) -> Result<Option<Node>> {
        let key = (commit, rel_path.to_string());
        if let Some(node) = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(*node);
        }
        let node = self.resolve_entry(repo, commit, rel_path)?;
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, node);
        Ok(node)
    }

    fn resolve_entry(
        &self,
        repo: &gix::Repository,
        commit: CommitId,
        rel_path: &str,
    ) -> Result<Option<Node>> {
        let view = self.tree_at(commit)?;
        if rel_path.is_empty() {
            return Ok(Some(Node::Directory(view.root)));
        }
        let tree = repo
            .find_tree(view.root)
            .map_err(|e| Error::git(e.to_string()))?;
        let entry = match tree.lookup_entry_by_path(rel_path) {
            Ok(Some(entry)) => entry,
            Ok(None) => return Ok(None),
            Err(e) => return Err(Error::git(e.to_string())),
        };
        let mode = entry.mode();
        if mode.is_tree() {
            Ok(Some(Node::Directory(entry.oid().to_owned())))
        } else if mode.is_blob() || mode.is_link() {
            Ok(Some(Node::Content(entry.oid().to_owned())))
        } else {
            Ok(None)
        }
    }
}
