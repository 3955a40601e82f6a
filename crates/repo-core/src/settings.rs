//! Operator-tunable settings shared by the store and the build pipeline

use std::path::{Path, PathBuf};
use std::time::Duration;

use repo_fs::LockFactory;
use repo_process::{EnvironmentBuilder, ProcessFactory};

pub const DEFAULT_CONFIG_FILE: &str = "satis.json";
pub const DEFAULT_BINARY: &str = "vendor/bin/satis";
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Where things live and how long builds may take.
///
/// Relative paths are resolved against [`Settings::root`], the install root
/// of the build tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub root: PathBuf,
    pub config_file: PathBuf,
    pub lock_dir: PathBuf,
    pub composer_home: PathBuf,
    pub binary: String,
    /// `None` disables the build timeout.
    pub build_timeout: Option<Duration>,
    /// Wait for the config lock instead of failing when it is held.
    pub blocking_config_lock: bool,
}

impl Settings {
    /// Defaults rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            config_file: PathBuf::from(DEFAULT_CONFIG_FILE),
            lock_dir: root.join("var/lock"),
            composer_home: root.join("var/composer"),
            binary: DEFAULT_BINARY.to_string(),
            build_timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            blocking_config_lock: true,
            root,
        }
    }

    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = path.into();
        self
    }

    pub fn with_lock_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.lock_dir = path.into();
        self
    }

    pub fn with_composer_home(mut self, path: impl Into<PathBuf>) -> Self {
        self.composer_home = path.into();
        self
    }

    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Build timeout in seconds, `0` meaning no timeout.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.build_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        self
    }

    pub fn with_blocking_config_lock(mut self, blocking: bool) -> Self {
        self.blocking_config_lock = blocking;
        self
    }

    /// Absolute location of the configuration document.
    pub fn config_path(&self) -> PathBuf {
        self.resolve(&self.config_file)
    }

    /// Resolve `path` against the install root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }

    pub fn lock_factory(&self) -> LockFactory {
        LockFactory::new(self.resolve(&self.lock_dir))
    }

    /// Process factory rooted at the install root, with the host environment
    /// snapshotted now.
    pub fn process_factory(&self) -> ProcessFactory {
        let home = self.resolve(&self.composer_home);
        ProcessFactory::new(&self.root, EnvironmentBuilder::new(home.to_string_lossy()))
    }
}
