//! Filesystem primitives for the package repository manager
//!
//! Provides atomic file replacement, tolerant reads, modification times and
//! named advisory locks shared between threads and processes.

pub mod error;
pub mod io;
pub mod lock;

pub use error::{Error, Result};
pub use lock::{LockFactory, LockGuard, NamedLock};
