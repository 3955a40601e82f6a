//! Repository list mutations over the configuration store

use std::sync::Arc;

use repo_meta::Repository;

use crate::store::ConfigStore;
use crate::{Error, Result};

/// Mutation and lookup API for the repository list.
///
/// Every mutation is one [`ConfigStore::transaction`]. Lookups read the last
/// loaded snapshot without locking.
#[derive(Debug, Clone)]
pub struct RepositoryRegistry {
    store: Arc<ConfigStore>,
}

impl RepositoryRegistry {
    pub fn new(store: Arc<ConfigStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    /// All repositories in document order.
    pub fn repositories(&self) -> Result<Vec<Repository>> {
        Ok(self.store.load()?.repositories.iter().cloned().collect())
    }

    pub fn find_one_repository(&self, id: &str) -> Result<Option<Repository>> {
        Ok(self.store.load()?.repositories.get(id).cloned())
    }

    /// Resolve a repository from a url reported by an outside system.
    ///
    /// Three passes, the first hit wins:
    /// 1. same url, ignoring trailing slashes
    /// 2. same host
    /// 3. the stored url contains `url`
    ///
    /// The host and substring passes match loosely; an unrelated repository on
    /// a shared host or with an overlapping url can be returned.
    pub fn find_by_url(&self, url: &str) -> Result<Option<Repository>> {
        let config = self.store.load()?;
        let repositories: Vec<&Repository> = config.repositories.iter().collect();

        let wanted = url.trim_end_matches('/');
        let found = repositories
            .iter()
            .find(|repo| repo.url.trim_end_matches('/') == wanted)
            .or_else(|| {
                let host = url_host(url)?;
                repositories
                    .iter()
                    .find(|repo| url_host(&repo.url).as_deref() == Some(host.as_str()))
            })
            .or_else(|| repositories.iter().find(|repo| repo.url.contains(url)));

        tracing::debug!(url, found = ?found.map(|repo| repo.name.as_str()), "resolved repository by url");
        Ok(found.map(|repo| (*repo).clone()))
    }

    /// Insert `repository`, overwriting any entry with the same identifier.
    pub fn add(&self, repository: Repository) -> Result<()> {
        validate(&repository)?;
        self.store.transaction(|config| {
            tracing::info!(url = %repository.url, "adding repository");
            config.repositories.insert(repository);
            Ok(())
        })
    }

    /// Insert every repository in order with a single flush.
    pub fn add_all(&self, repositories: impl IntoIterator<Item = Repository>) -> Result<()> {
        let repositories: Vec<Repository> = repositories.into_iter().collect();
        for repository in &repositories {
            validate(repository)?;
        }

        self.store.transaction(|config| {
            tracing::info!(count = repositories.len(), "adding repositories");
            config.repositories.extend(repositories);
            Ok(())
        })
    }

    /// Replace `existing` with `updated`.
    ///
    /// Fails with [`Error::UnknownRepository`] when `existing` is no longer
    /// registered. The old identifier is removed before the new one is
    /// inserted, so a changed url never leaves both entries behind.
    pub fn update(&self, existing: &Repository, updated: Repository) -> Result<Repository> {
        validate(&updated)?;
        let id = existing.id();

        self.store.transaction(|config| {
            if config.repositories.remove(&id).is_none() {
                return Err(Error::UnknownRepository { id: id.clone() });
            }
            tracing::info!(from = %existing.url, to = %updated.url, "updating repository");
            config.repositories.insert(updated.clone());
            Ok(updated)
        })
    }

    /// Remove `existing`; an absent entry is left alone.
    pub fn delete(&self, existing: &Repository) -> Result<()> {
        let id = existing.id();
        self.store.transaction(|config| {
            if config.repositories.remove(&id).is_some() {
                tracing::info!(url = %existing.url, "deleted repository");
            }
            Ok(())
        })
    }
}

fn validate(repository: &Repository) -> Result<()> {
    repository.validate().map_err(|e| match e {
        repo_meta::Error::InvalidRepository { reason } => Error::InvalidRepository { reason },
        other => other.into(),
    })
}

/// Host part of a url, including scp-like `user@host:path` forms.
fn url_host(url: &str) -> Option<String> {
    if let Ok(parsed) = url::Url::parse(url) {
        return parsed.host_str().map(str::to_lowercase);
    }

    let (before_path, _) = url.split_once(':')?;
    let host = before_path.rsplit_once('@').map_or(before_path, |(_, host)| host);
    if host.is_empty() || host.contains('/') {
        return None;
    }
    Some(host.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://github.com/acme/lib", Some("github.com"))]
    #[case("git@gitlab.acme.test:tools/cli.git", Some("gitlab.acme.test"))]
    #[case("ssh://git@Bitbucket.org/acme/x.git", Some("bitbucket.org"))]
    #[case("acme/lib", None)]
    #[case("file:///srv/repos/lib", None)]
    fn extracts_host(#[case] url: &str, #[case] expected: Option<&str>) {
        assert_eq!(url_host(url).as_deref(), expected);
    }
}
