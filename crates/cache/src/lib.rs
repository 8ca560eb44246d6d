//! Commit-scoped caching over git repositories
//!
//! This crate reads a repository's history and trees through a permanent
//! in-process cache:
//! - One [`RepoCache`] per repository root, handed out by [`RepoRegistry`]
//! - Commit records, root trees and blob contents memoized for the process
//!   lifetime (negative blob lookups included)
//! - Changed-path queries between a commit and its first parent, or between
//!   the working copy and the last committed state
//!
//! Git objects are immutable, so cached entries are never invalidated. The
//! only state that moves is the commit log, which [`RepoCache::refresh`]
//! extends when new history appears.

mod changeset;
mod error;
mod metrics;
mod registry;
mod repo;

// Re-export error types at crate root
pub use error::{Error, Result};

// Re-export main types
pub use changeset::ChangeSet;
pub use metrics::CacheMetricsSnapshot;
pub use registry::RepoRegistry;
pub use repo::{CommitId, CommitRecord, RepoCache, TreeView};
