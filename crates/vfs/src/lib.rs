//! Read-only filesystem views bound to a single git commit
//!
//! A [`CommitFs`] is opened on a directory inside a repository and pinned to
//! one commit at construction. From then on every lookup answers from that
//! commit's tree, whatever happens to the repository afterwards. The full
//! mutating surface exists but fails unconditionally; consumers get a
//! filesystem that is read-only by contract, not by omission.
//!
//! Lookup failures of any kind collapse to [`Error::NotFound`] at this
//! boundary. A missing blob, a missing tree entry and a backend hiccup are
//! indistinguishable to the consumer.

mod error;

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use commitfs_cache::{CommitId, RepoCache, RepoRegistry};
use tracing::debug;

pub use error::{Error, Result};

/// Minimal metadata of a tree entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stat {
    /// Final path component; empty for the view root.
    pub name: String,
    /// Whether the entry is a directory.
    pub is_dir: bool,
}

/// A read-only view of one directory as it existed at one commit.
///
/// Cheap to clone; clones share the underlying repository cache and stay
/// bound to the same commit.
#[derive(Debug, Clone)]
pub struct CommitFs {
    cache: Arc<RepoCache>,
    base: String,
    commit: CommitId,
}

impl CommitFs {
    /// Open a view of `path` pinned to `reference` (`None` pins `HEAD`).
    ///
    /// `path` must exist on disk inside a non-bare repository; the view's
    /// base becomes its repository-relative location. The commit is
    /// resolved once, here, and never again.
    pub fn open(
        registry: &RepoRegistry,
        path: impl AsRef<Path>,
        reference: Option<&str>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let cache = registry.open(path)?;
        let commit = cache.resolve_commit(reference)?;
        let base = repo_relative(path, cache.root())?;
        debug!(base = %base, commit = %commit, "opened commit view");
        Ok(Self {
            cache,
            base,
            commit,
        })
    }

    /// The commit this view is bound to.
    #[must_use]
    pub fn commit(&self) -> CommitId {
        self.commit
    }

    /// Repository-relative base path of this view; empty at the root.
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Metadata of the entry at `path`, relative to the view base.
    pub fn stat(&self, path: &str) -> Result<Stat> {
        let target = join_rel(&self.base, path);
        if self
            .cache
            .is_directory_at(self.commit, &target)
            .unwrap_or(false)
        {
            return Ok(Stat {
                name: entry_name(&target),
                is_dir: true,
            });
        }
        if self
            .cache
            .path_exists(self.commit, &target)
            .unwrap_or(false)
        {
            return Ok(Stat {
                name: entry_name(&target),
                is_dir: false,
            });
        }
        Err(Error::not_found(path))
    }

    /// Contents of the file at `path`. Directories are not readable.
    pub fn read(&self, path: &str) -> Result<Bytes> {
        let target = join_rel(&self.base, path);
        match self.cache.file_contents_at(self.commit, &target) {
            Ok(Some(contents)) => Ok(contents),
            _ => Err(Error::not_found(path)),
        }
    }

    /// Entry names of the directory at `path`, in tree order.
    pub fn list_dir(&self, path: &str) -> Result<Vec<String>> {
        let target = join_rel(&self.base, path);
        if !self
            .cache
            .is_directory_at(self.commit, &target)
            .unwrap_or(false)
        {
            return Err(Error::not_found(path));
        }
        self.cache
            .list_paths(self.commit, &target)
            .map_err(|_| Error::not_found(path))
    }

    /// A view of the directory at `path`, bound to the same commit.
    pub fn subview(&self, path: &str) -> Result<Self> {
        let target = join_rel(&self.base, path);
        if !self
            .cache
            .is_directory_at(self.commit, &target)
            .unwrap_or(false)
        {
            return Err(Error::not_found(path));
        }
        Ok(Self {
            cache: Arc::clone(&self.cache),
            base: target,
            commit: self.commit,
        })
    }

    /// Always fails; commit-bound views are immutable.
    pub fn write(&self, path: &str, _contents: &[u8]) -> Result<()> {
        Err(Error::read_only(path))
    }

    /// Always fails; commit-bound views are immutable.
    pub fn create_dir(&self, path: &str) -> Result<()> {
        Err(Error::read_only(path))
    }

    /// Always fails; commit-bound views are immutable.
    pub fn remove(&self, path: &str) -> Result<()> {
        Err(Error::read_only(path))
    }

    /// Always fails; commit-bound views are immutable.
    pub fn remove_dir(&self, path: &str) -> Result<()> {
        Err(Error::read_only(path))
    }

    /// Always fails; commit-bound views are immutable.
    pub fn set_stat(&self, path: &str, _stat: &Stat) -> Result<()> {
        Err(Error::read_only(path))
    }
}

/// Repository-relative `/`-separated location of an on-disk path.
fn repo_relative(path: &Path, root: &Path) -> Result<String> {
    let canonical = std::fs::canonicalize(path)
        .map_err(|e| commitfs_cache::Error::repository_init(path, e.to_string()))?;
    let relative = canonical
        .strip_prefix(root)
        .map_err(|e| commitfs_cache::Error::repository_init(path, e.to_string()))?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(parts.join("/"))
}

/// Join a request path onto the view base, lexically.
///
/// Empty and `.` components drop out; `..` stays as an ordinary component
/// that no tree entry can match, so escapes above the base resolve to
/// nothing rather than to a parent.
fn join_rel(base: &str, path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if !base.is_empty() {
        parts.extend(base.split('/'));
    }
    for component in path.split('/') {
        match component {
            "" | "." => {}
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// Final component of a repository-relative path; empty for the root.
fn entry_name(target: &str) -> String {
    target.rsplit('/').next().unwrap_or("").to_string()
}
