//! Error types for commit-bound filesystem views

use miette::Diagnostic;
use thiserror::Error;

/// Error type for view operations
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// Nothing lives at the path in the bound commit
    #[error("Resource not found: {path}")]
    #[diagnostic(code(commitfs::vfs::not_found))]
    NotFound {
        /// Path as the caller gave it
        path: String,
    },

    /// A mutating operation was attempted on a commit-bound view
    #[error("Resource is read-only: {path}")]
    #[diagnostic(
        code(commitfs::vfs::read_only),
        help("Commit-bound views never support mutation")
    )]
    ReadOnly {
        /// Path as the caller gave it
        path: String,
    },

    /// Failure while opening the repository or resolving the commit
    #[error(transparent)]
    #[diagnostic(transparent)]
    Repo(#[from] commitfs_cache::Error),
}

impl Error {
    /// Create a not found error
    #[must_use]
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Create a read-only violation error
    #[must_use]
    pub fn read_only(path: impl Into<String>) -> Self {
        Self::ReadOnly { path: path.into() }
    }
}

/// Result type for view operations
pub type Result<T> = std::result::Result<T, Error>;
