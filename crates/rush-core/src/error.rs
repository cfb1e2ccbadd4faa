//! Error types shared across the crate

use crate::category::Category;
use std::path::PathBuf;
use thiserror::Error;

/// Rejected player name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("player name is empty")]
    Empty,
    #[error("player name is {len} characters long (max {max})")]
    TooLong { len: usize, max: usize },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{category}: {reason}")]
    Invalid { category: Category, reason: String },
}

/// Failure of the local key-value store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("failed to read {key}: {reason}")]
    Read { key: String, reason: String },
    #[error("failed to write {key}: {reason}")]
    Write { key: String, reason: String },
}

/// Failure of the remote table
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("network error: {0}")]
    Network(String),
    #[error("not authorized: {0}")]
    Auth(String),
    #[error("remote call timed out after {0}s")]
    Timeout(u64),
    #[error("protocol error: {0}")]
    Protocol(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LeaderboardError {
    #[error(transparent)]
    InvalidName(#[from] NameError),
    /// Local write failed with no remote configured
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("score was not stored (remote: {remote}; local: {local})")]
    BothBackendsFailed {
        remote: RemoteError,
        local: StorageError,
    },
}

pub type LeaderboardResult<T> = Result<T, LeaderboardError>;
