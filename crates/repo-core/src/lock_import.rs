//! Register repositories from a dependency lock file

use serde::Deserialize;

use repo_meta::{Repository, RepositoryType};

use crate::registry::RepositoryRegistry;
use crate::{Error, Result};

#[derive(Debug, Default, Deserialize)]
struct LockFile {
    #[serde(default)]
    packages: Vec<LockedPackage>,
    #[serde(default, rename = "packages-dev")]
    packages_dev: Vec<LockedPackage>,
}

#[derive(Debug, Deserialize)]
struct LockedPackage {
    #[serde(default)]
    name: String,
    #[serde(default)]
    source: Option<PackageSource>,
}

#[derive(Debug, Deserialize)]
struct PackageSource {
    #[serde(default)]
    url: String,
    #[serde(default, rename = "type")]
    kind: String,
}

/// Turns the sources of a lock file into registered repositories.
#[derive(Debug, Clone)]
pub struct LockImporter {
    registry: RepositoryRegistry,
}

impl LockImporter {
    pub fn new(registry: RepositoryRegistry) -> Self {
        Self { registry }
    }

    /// Register every package source found in `content`, dev packages
    /// included, with a single flush. Returns the repositories added.
    pub fn import(&self, content: &str) -> Result<Vec<Repository>> {
        let repositories = parse_lock_file(content)?;
        self.registry.add_all(repositories.clone())?;
        tracing::info!(count = repositories.len(), "imported repositories from lock file");
        Ok(repositories)
    }
}

/// Repositories named by the `source` entries of a lock file.
///
/// Packages without a source url and type are ignored; sources of a kind the
/// aggregator does not support are skipped with a warning.
pub fn parse_lock_file(content: &str) -> Result<Vec<Repository>> {
    let lock: LockFile = serde_json::from_str(content).map_err(|e| Error::InvalidLockFile {
        reason: e.to_string(),
    })?;

    let repositories = lock
        .packages
        .iter()
        .chain(&lock.packages_dev)
        .filter_map(|package| {
            let source = package.source.as_ref()?;
            if source.url.is_empty() || source.kind.is_empty() {
                return None;
            }
            match source.kind.parse::<RepositoryType>() {
                Ok(kind) => Some(Repository::new(source.url.clone(), kind)),
                Err(_) => {
                    tracing::warn!(
                        package = %package.name,
                        kind = %source.kind,
                        "skipping source of unsupported type"
                    );
                    None
                }
            }
        })
        .collect();

    Ok(repositories)
}
