//! Named advisory locks backed by lock files.
//!
//! Every lock name maps to `<dir>/<name>.lock`. Each acquisition opens its
//! own file handle, so two threads of one process exclude each other exactly
//! like two processes do.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::{Error, Result};

/// Creates named locks rooted in a single directory.
#[derive(Debug, Clone)]
pub struct LockFactory {
    dir: PathBuf,
}

impl LockFactory {
    /// Create a factory storing its lock files in `dir`.
    ///
    /// The directory is created lazily on first acquisition.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the lock files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create a handle for the lock called `name`.
    pub fn create_lock(&self, name: &str) -> Result<NamedLock> {
        let sanitized: String = name
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        if sanitized.trim_matches('.').is_empty() {
            return Err(Error::InvalidLockName {
                name: name.to_string(),
            });
        }

        Ok(NamedLock {
            name: name.to_string(),
            path: self.dir.join(format!("{}.lock", sanitized)),
        })
    }
}

/// A named exclusive lock. Cheap to clone; holds no OS resource until acquired.
#[derive(Debug, Clone)]
pub struct NamedLock {
    name: String,
    path: PathBuf,
}

impl NamedLock {
    /// Lock name as requested by the caller.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path of the backing lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Acquire the lock.
    ///
    /// In blocking mode this waits until the lock is free and always returns
    /// `Some`. In non-blocking mode `None` means another holder has it.
    pub fn acquire(&self, blocking: bool) -> Result<Option<LockGuard>> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .map_err(|e| Error::io(&self.path, e))?;

        if blocking {
            file.lock_exclusive().map_err(|_| Error::LockFailed {
                path: self.path.clone(),
            })?;
        } else if let Err(e) = file.try_lock_exclusive() {
            if e.kind() == fs2::lock_contended_error().kind() {
                tracing::debug!(lock = %self.name, "lock is held elsewhere");
                return Ok(None);
            }
            return Err(Error::LockFailed {
                path: self.path.clone(),
            });
        }

        tracing::debug!(lock = %self.name, blocking, "lock acquired");
        Ok(Some(LockGuard {
            name: self.name.clone(),
            file: Some(file),
        }))
    }

    /// Acquire the lock, waiting as long as necessary.
    pub fn acquire_blocking(&self) -> Result<LockGuard> {
        self.acquire(true)?.ok_or_else(|| Error::LockFailed {
            path: self.path.clone(),
        })
    }
}

/// Proof of holding a [`NamedLock`]. The lock is released on drop.
#[derive(Debug)]
pub struct LockGuard {
    name: String,
    file: Option<File>,
}

impl LockGuard {
    /// Name of the held lock.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Release the lock explicitly.
    pub fn release(mut self) {
        self.unlock();
    }

    fn unlock(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = FileExt::unlock(&file);
            tracing::debug!(lock = %self.name, "lock released");
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        self.unlock();
    }
}
