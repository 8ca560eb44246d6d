//! Error types for the cache crate

use miette::Diagnostic;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error type for repository cache operations
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// No usable repository at or above the requested path
    #[error("Failed to open repository at {}: {message}", path.display())]
    #[diagnostic(
        code(commitfs::cache::repository_init),
        help("The path must live inside a non-bare git working directory")
    )]
    RepositoryInit {
        /// Path the caller asked to open
        path: PathBuf,
        /// Backend description of what went wrong
        message: String,
    },

    /// A revision spec did not resolve to a commit
    #[error("Failed to resolve '{reference}' to a commit: {message}")]
    #[diagnostic(code(commitfs::cache::commit_resolution))]
    CommitResolution {
        /// The revision spec as given by the caller
        reference: String,
        /// Backend description of what went wrong
        message: String,
    },

    /// A positional commit lookup fell outside the known log
    #[error("Commit index {index} out of range. There are {len} commits.")]
    #[diagnostic(code(commitfs::cache::index_out_of_range))]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Current log length
        len: usize,
    },

    /// Backend failure during an object or diff operation
    #[error("Git backend error: {message}")]
    #[diagnostic(code(commitfs::cache::git))]
    Git {
        /// Backend description of what went wrong
        message: String,
    },
}

impl Error {
    /// Create a repository initialization error
    #[must_use]
    pub fn repository_init(path: impl AsRef<Path>, msg: impl Into<String>) -> Self {
        Self::RepositoryInit {
            path: path.as_ref().to_path_buf(),
            message: msg.into(),
        }
    }

    /// Create a commit resolution error
    #[must_use]
    pub fn commit_resolution(reference: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::CommitResolution {
            reference: reference.into(),
            message: msg.into(),
        }
    }

    /// Create an index out of range error
    #[must_use]
    pub const fn index_out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }

    /// Create a backend error
    #[must_use]
    pub fn git(msg: impl Into<String>) -> Self {
        Self::Git {
            message: msg.into(),
        }
    }
}

/// Result type for cache operations
pub type Result<T> = std::result::Result<T, Error>;
