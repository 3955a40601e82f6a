//! Build requests raised by package push notifications

use serde_json::Value;

use repo_fs::{LockFactory, NamedLock};

use crate::build::{BuildRequest, BuildTrigger, PendingBuild};
use crate::registry::RepositoryRegistry;
use crate::{Error, Result};

/// Name of the lock serializing webhook deliveries.
pub const PACKAGE_LOCK: &str = "package";

/// Resolves the repository named by a webhook payload and queues its build.
#[derive(Debug)]
pub struct PackageWebhookConsumer {
    lock: NamedLock,
    registry: RepositoryRegistry,
    trigger: BuildTrigger,
}

impl PackageWebhookConsumer {
    pub fn new(
        registry: RepositoryRegistry,
        trigger: BuildTrigger,
        locks: &LockFactory,
    ) -> Result<Self> {
        Ok(Self {
            lock: locks.create_lock(PACKAGE_LOCK)?,
            registry,
            trigger,
        })
    }

    /// Handle an already validated payload of the form
    /// `{"repository": {"url": "..."}}`.
    ///
    /// The build is scoped to the matching repository. When nothing matches,
    /// everything is rebuilt.
    pub fn consume(&self, payload: &Value) -> Result<PendingBuild> {
        let url = payload
            .pointer("/repository/url")
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| Error::InvalidPayload {
                reason: "missing repository.url".to_string(),
            })?;

        let _guard = self.lock.acquire_blocking()?;

        let repository = self.registry.find_by_url(url)?;
        let request = match &repository {
            Some(repo) => {
                tracing::info!(url, repository = %repo.name, "webhook matched repository");
                BuildRequest::new(Some(repo.name.clone()).filter(|name| !name.is_empty()))
            }
            None => {
                tracing::warn!(url, "webhook matched no repository, building everything");
                BuildRequest::all()
            }
        };

        self.trigger.request(request)
    }
}
