//! Backend fetch counters.
//!
//! The caches in this crate never invalidate, so "how often did we hit the
//! object database" is the observable difference between a warm and a cold
//! path. Counters are monotonic for the lifetime of the [`RepoCache`] they
//! belong to.
//!
//! [`RepoCache`]: crate::RepoCache

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
struct CacheMetricsInner {
    commit_loads: AtomicU64,
    tree_loads: AtomicU64,
    blob_loads: AtomicU64,
    diff_computations: AtomicU64,
    log_refreshes: AtomicU64,
}

/// Shared handle to a cache's backend fetch counters.
#[derive(Debug, Clone, Default)]
pub(crate) struct CacheMetrics {
    inner: Arc<CacheMetricsInner>,
}

impl CacheMetrics {
    pub(crate) fn record_commit_load(&self) {
        self.inner.commit_loads.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_tree_load(&self) {
        self.inner.tree_loads.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_blob_load(&self) {
        self.inner.blob_loads.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_diff_computation(&self) {
        self.inner.diff_computations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_log_refresh(&self) {
        self.inner.log_refreshes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> CacheMetricsSnapshot {
        CacheMetricsSnapshot {
            commit_loads: self.inner.commit_loads.load(Ordering::Relaxed),
            tree_loads: self.inner.tree_loads.load(Ordering::Relaxed),
            blob_loads: self.inner.blob_loads.load(Ordering::Relaxed),
            diff_computations: self.inner.diff_computations.load(Ordering::Relaxed),
            log_refreshes: self.inner.log_refreshes.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of a cache's backend fetch counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheMetricsSnapshot {
    /// Commit objects read from the object database.
    pub commit_loads: u64,
    /// Root trees resolved from the object database.
    pub tree_loads: u64,
    /// Blob payloads read from the object database.
    pub blob_loads: u64,
    /// Tree-to-tree diffs computed.
    pub diff_computations: u64,
    /// History walks that ran to completion.
    pub log_refreshes: u64,
}
