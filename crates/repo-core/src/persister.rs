//! Persistence seam for the configuration document

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use repo_fs::io;

use crate::Result;

/// Raw storage for the serialized configuration document.
///
/// `load` returns `None` when nothing has been stored yet; an empty string is
/// returned as-is and rejected by the store.
pub trait Persister: Send + Sync {
    /// Location reported in errors.
    fn path(&self) -> &Path;

    fn load(&self) -> Result<Option<String>>;

    fn flush(&self, content: &str) -> Result<()>;
}

/// Stores the document in a JSON file, replacing it atomically on flush.
#[derive(Debug, Clone)]
pub struct JsonFilePersister {
    path: PathBuf,
}

impl JsonFilePersister {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Persister for JsonFilePersister {
    fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Option<String>> {
        Ok(io::read_optional(&self.path)?)
    }

    fn flush(&self, content: &str) -> Result<()> {
        let mut data = content.to_string();
        if !data.ends_with('\n') {
            data.push('\n');
        }
        io::write_atomic(&self.path, data.as_bytes())?;
        Ok(())
    }
}

/// Keeps the document in memory and counts flushes.
#[derive(Debug, Default)]
pub struct MemoryPersister {
    path: PathBuf,
    content: Mutex<Option<String>>,
    flushes: AtomicUsize,
}

impl MemoryPersister {
    pub fn new() -> Self {
        Self {
            path: PathBuf::from("memory://satis.json"),
            ..Self::default()
        }
    }

    /// Start from existing document content.
    pub fn with_content(content: impl Into<String>) -> Self {
        let persister = Self::new();
        *persister.lock_content() = Some(content.into());
        persister
    }

    /// Number of flushes performed so far.
    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }

    /// Last flushed (or initial) content.
    pub fn content(&self) -> Option<String> {
        self.lock_content().clone()
    }

    fn lock_content(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.content.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Persister for MemoryPersister {
    fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Option<String>> {
        Ok(self.content())
    }

    fn flush(&self, content: &str) -> Result<()> {
        *self.lock_content() = Some(content.to_string());
        self.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
