//! Error types for repo-core

use std::path::PathBuf;

/// Result type for repo-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in repo-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The persisted configuration exists but holds no content
    #[error("Configuration file {path} is empty")]
    EmptyConfig { path: PathBuf },

    /// A non-blocking lock acquisition found the lock held
    #[error("Cannot acquire {name} lock for the configuration file")]
    LockUnavailable { name: String },

    /// A flush was attempted with a guard this store did not hand out
    #[error("The {name} lock is not held by this store")]
    LockNotHeld { name: String },

    /// An update targeted a repository that is no longer registered
    #[error("Unknown repository: {id}")]
    UnknownRepository { id: String },

    #[error("Invalid repository: {reason}")]
    InvalidRepository { reason: String },

    /// A webhook payload without the fields needed to resolve a repository
    #[error("Invalid webhook payload: {reason}")]
    InvalidPayload { reason: String },

    #[error("Invalid lock file: {reason}")]
    InvalidLockFile { reason: String },

    /// The build queue has no consumer left
    #[error("Build queue is closed")]
    BuildQueueClosed,

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from repo-fs
    #[error(transparent)]
    Fs(#[from] repo_fs::Error),

    /// Document model error from repo-meta
    #[error(transparent)]
    Meta(#[from] repo_meta::Error),

    /// Process error from repo-process
    #[error(transparent)]
    Process(#[from] repo_process::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
