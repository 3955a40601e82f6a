//! repo-fs errors

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A read, write, rename or metadata call failed on `path`.
    #[error("Cannot access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The lock file exists but `flock` refused it for a reason other than
    /// contention.
    #[error("Cannot lock {}", .path.display())]
    LockFailed { path: PathBuf },

    /// Names must keep at least one character other than dots once
    /// sanitized.
    #[error("Invalid lock name: {name:?}")]
    InvalidLockName { name: String },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
