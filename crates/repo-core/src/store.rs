//! The configuration store: cached document, persisted under the `config` lock

use std::marker::PhantomData;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, ThreadId};

use repo_fs::{LockFactory, LockGuard, NamedLock};
use repo_meta::Configuration;

use crate::persister::{JsonFilePersister, Persister};
use crate::settings::Settings;
use crate::{Error, Result};

/// Name of the lock serializing writers of the configuration document.
pub const CONFIG_LOCK: &str = "config";

/// Owns the single live [`Configuration`].
///
/// Reads are served from an in-memory cache filled on first access. Every
/// mutation goes through [`ConfigStore::transaction`], which holds the
/// `config` lock while it re-reads, mutates and flushes the document, so two
/// writers (threads or processes) never interleave.
///
/// Callers only ever receive clones; a copy obtained before someone else's
/// write must be re-fetched with [`ConfigStore::load`].
///
/// The lock is re-entrant per thread: a thread holding a [`ConfigLock`] may
/// call [`ConfigStore::acquire_lock`] or [`ConfigStore::transaction`] again
/// and shares the held file lock. Other threads and stores still wait, or fail
/// in non-blocking mode.
pub struct ConfigStore {
    persister: Arc<dyn Persister>,
    lock: NamedLock,
    blocking: bool,
    cache: Mutex<Option<Configuration>>,
    held: Mutex<Holder>,
}

/// Owner and nesting depth of the file lock this store holds.
#[derive(Debug, Default)]
struct Holder {
    owner: Option<ThreadId>,
    depth: usize,
    guard: Option<LockGuard>,
}

/// Proof that the current thread holds the `config` lock of one store.
///
/// Nested guards of the same thread share the file lock; it is released when
/// the outermost guard drops.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct ConfigLock<'a> {
    store: &'a ConfigStore,
    // tied to the acquiring thread
    _not_send: PhantomData<*const ()>,
}

impl ConfigLock<'_> {
    pub fn name(&self) -> &str {
        self.store.lock.name()
    }

    /// Nesting depth of the lock at the time of the call, outermost being 1.
    pub fn depth(&self) -> usize {
        self.store.held().depth
    }

    pub fn release(self) {}
}

impl Drop for ConfigLock<'_> {
    fn drop(&mut self) {
        let mut held = self.store.held();
        held.depth = held.depth.saturating_sub(1);
        if held.depth == 0 {
            held.owner = None;
            if let Some(guard) = held.guard.take() {
                guard.release();
                tracing::debug!(lock = %self.store.lock.name(), "configuration lock released");
            }
        }
    }
}

impl std::fmt::Debug for ConfigLock<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigLock")
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("path", &self.persister.path())
            .field("lock", &self.lock)
            .field("blocking", &self.blocking)
            .finish()
    }
}

impl ConfigStore {
    pub fn new(persister: Arc<dyn Persister>, locks: &LockFactory) -> Result<Self> {
        Ok(Self {
            persister,
            lock: locks.create_lock(CONFIG_LOCK)?,
            blocking: true,
            cache: Mutex::new(None),
            held: Mutex::new(Holder::default()),
        })
    }

    /// Store over the JSON file and lock directory named by `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let persister = Arc::new(JsonFilePersister::new(settings.config_path()));
        Ok(Self::new(persister, &settings.lock_factory())?
            .with_blocking(settings.blocking_config_lock))
    }

    /// Choose between waiting for the lock and failing fast when it is held.
    pub fn with_blocking(mut self, blocking: bool) -> Self {
        self.blocking = blocking;
        self
    }

    /// Location of the persisted document.
    pub fn path(&self) -> &Path {
        self.persister.path()
    }

    /// The current document, loading it on first access.
    ///
    /// A document that was never stored yields the defaults. Stored but
    /// empty content is an [`Error::EmptyConfig`].
    pub fn load(&self) -> Result<Configuration> {
        let mut cache = self.cache();
        if let Some(config) = cache.as_ref() {
            return Ok(config.clone());
        }
        let config = self.read()?;
        *cache = Some(config.clone());
        Ok(config)
    }

    /// Drop the cache and read the persisted document again.
    pub fn reload(&self) -> Result<Configuration> {
        let config = self.read()?;
        *self.cache() = Some(config.clone());
        Ok(config)
    }

    /// Acquire the `config` lock.
    ///
    /// Blocks unless the store was switched to non-blocking mode, in which
    /// case a lock held elsewhere is reported as [`Error::LockUnavailable`].
    /// A thread already holding this store's lock gets a nested guard at
    /// once. The lock is released when the outermost guard drops.
    pub fn acquire_lock(&self) -> Result<ConfigLock<'_>> {
        let me = thread::current().id();
        {
            let mut held = self.held();
            if held.owner == Some(me) {
                held.depth += 1;
                tracing::debug!(lock = %self.lock.name(), depth = held.depth, "configuration lock re-entered");
                return Ok(self.guard());
            }
        }

        // the file lock is taken without holding `held`, so other threads
        // of this store queue on flock instead of on the mutex
        let guard = match self.lock.acquire(self.blocking) {
            Ok(Some(guard)) => guard,
            Ok(None) | Err(repo_fs::Error::LockFailed { .. }) => {
                tracing::warn!(lock = %self.lock.name(), "configuration lock unavailable");
                return Err(Error::LockUnavailable {
                    name: self.lock.name().to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let mut held = self.held();
        held.owner = Some(me);
        held.depth = 1;
        held.guard = Some(guard);
        Ok(self.guard())
    }

    /// Write the cached document back to storage.
    ///
    /// Requires a guard returned by this store's
    /// [`ConfigStore::acquire_lock`]; a guard of another store is rejected
    /// with [`Error::LockNotHeld`].
    pub fn flush(&self, lock: &ConfigLock<'_>) -> Result<()> {
        if !std::ptr::eq(lock.store, self) {
            return Err(Error::LockNotHeld {
                name: self.lock.name().to_string(),
            });
        }
        let config = self.load()?;
        self.write(&config)
    }

    /// Run `mutate` as one critical section.
    ///
    /// Acquires the lock, re-reads the persisted document, applies `mutate`
    /// and flushes the result. When `mutate` fails nothing is written and the
    /// error is returned. The lock is released on every path.
    pub fn transaction<T, F>(&self, mutate: F) -> Result<T>
    where
        F: FnOnce(&mut Configuration) -> Result<T>,
    {
        let guard = self.acquire_lock()?;

        let mut config = self.reload()?;
        let value = mutate(&mut config)?;
        self.write(&config)?;
        *self.cache() = Some(config);

        guard.release();
        Ok(value)
    }

    fn read(&self) -> Result<Configuration> {
        match self.persister.load()? {
            None => {
                tracing::debug!(path = %self.path().display(), "no stored configuration, using defaults");
                Ok(Configuration::default())
            }
            Some(content) if content.trim().is_empty() => Err(Error::EmptyConfig {
                path: self.path().to_path_buf(),
            }),
            Some(content) => Ok(Configuration::from_json(&content)?),
        }
    }

    fn write(&self, config: &Configuration) -> Result<()> {
        let content = config.to_json()?;
        self.persister.flush(&content)?;
        tracing::info!(
            path = %self.path().display(),
            repositories = config.repositories.len(),
            "configuration flushed"
        );
        Ok(())
    }

    fn cache(&self) -> MutexGuard<'_, Option<Configuration>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn held(&self) -> MutexGuard<'_, Holder> {
        self.held.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn guard(&self) -> ConfigLock<'_> {
        ConfigLock {
            store: self,
            _not_send: PhantomData,
        }
    }
}
