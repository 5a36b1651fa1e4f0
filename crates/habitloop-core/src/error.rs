//! Error types for habitloop-core.
//!
//! Engine entry points are total: repository failures are logged and
//! degraded to empty results, so these types surface only at the repository
//! and seed boundaries.

use thiserror::Error;

/// Errors a repository backend may report on fetch.
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Backend could not be reached at all
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),

    /// A query was attempted but failed
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// The fetch was cancelled by the caller
    #[error("fetch cancelled")]
    Cancelled,
}

/// Errors raised while loading seed data.
#[derive(Error, Debug)]
pub enum SeedError {
    #[error("failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse seed JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unsupported seed schema version {found}, expected {expected}")]
    UnsupportedVersion { found: u32, expected: u32 },
}

pub type Result<T, E = RepositoryError> = std::result::Result<T, E>;
