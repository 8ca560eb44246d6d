//! Process-scoped registry handing out one [`RepoCache`] per repository.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::error::Result;
use crate::repo::RepoCache;

#[derive(Default)]
struct RegistryState {
    /// Literal opened path to canonical repository root.
    path_roots: HashMap<PathBuf, PathBuf>,
    /// Canonical repository root to its cache.
    caches: HashMap<PathBuf, Arc<RepoCache>>,
}

/// Hands out repository caches, at most one per repository root.
///
/// Two paths inside the same working directory always resolve to the same
/// [`RepoCache`] instance. The registry lock also serializes first-time
/// construction, so concurrent opens of a new root cannot build two caches.
#[derive(Default)]
pub struct RepoRegistry {
    state: Mutex<RegistryState>,
}

impl RepoRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the repository enclosing `path`.
    ///
    /// The literal path is memoized against the discovered root, so repeat
    /// opens skip discovery entirely. Fails with
    /// [`Error::RepositoryInit`](crate::Error::RepositoryInit) when no
    /// enclosing non-bare repository exists.
    pub fn open(&self, path: impl AsRef<Path>) -> Result<Arc<RepoCache>> {
        let path = path.as_ref();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(root) = state.path_roots.get(path)
            && let Some(cache) = state.caches.get(root)
        {
            return Ok(Arc::clone(cache));
        }

        // Root resolution is cheap; the history walk only runs for roots
        // the registry has never seen.
        let (repo, root) = RepoCache::discover(path)?;
        state.path_roots.insert(path.to_path_buf(), root.clone());
        if let Some(cache) = state.caches.get(&root) {
            return Ok(Arc::clone(cache));
        }

        let cache = Arc::new(RepoCache::open(repo, root.clone())?);
        debug!(path = %path.display(), root = %root.display(), "registered repository");
        state.caches.insert(root, Arc::clone(&cache));
        Ok(cache)
    }

    /// Drop every cached handle and memoized path.
    ///
    /// Existing `Arc<RepoCache>` handles stay valid; the next `open` of any
    /// path rediscovers and rebuilds from scratch.
    pub fn shutdown(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.path_roots.clear();
        state.caches.clear();
    }
}
