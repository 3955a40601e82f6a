//! Configuration store and build orchestration for the package repository manager
//!
//! This crate coordinates the Layer 0 crates:
//!
//! - **ConfigStore**: cached configuration document, persisted under the
//!   `config` lock
//! - **RepositoryRegistry**: add, update, delete and lookup of repositories,
//!   each mutation one locked read-modify-write
//! - **BuildOrchestrator**: builds serialized by the `build` lock, triggered
//!   through an explicit request channel
//! - **LockImporter** and **PackageWebhookConsumer**: repository sources from
//!   lock files and push notifications
//!
//! # Architecture
//!
//! ```text
//!                  satisctl (repo-cli)
//!                          |
//!                      repo-core
//!                          |
//!          +---------------+---------------+
//!          |               |               |
//!       repo-fs        repo-meta      repo-process
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use repo_core::{BuildOrchestrator, BuildRequest, ConfigStore, RepositoryRegistry, Settings};
//! use repo_meta::{Repository, RepositoryType};
//!
//! fn example() -> repo_core::Result<()> {
//!     let settings = Settings::new("/srv/satis");
//!     let store = Arc::new(ConfigStore::from_settings(&settings)?);
//!     let registry = RepositoryRegistry::new(Arc::clone(&store));
//!     let orchestrator = BuildOrchestrator::from_settings(&settings, store)?;
//!
//!     let repo = Repository::new("https://github.com/acme/lib.git", RepositoryType::Git)
//!         .with_name("acme/lib");
//!     registry.add(repo)?;
//!
//!     let mut request = BuildRequest::for_repository("acme/lib");
//!     orchestrator.on_build(&mut request);
//!     println!("status: {:?}", request.status());
//!     Ok(())
//! }
//! ```

pub mod build;
pub mod error;
pub mod lock_import;
pub mod persister;
pub mod registry;
pub mod settings;
pub mod store;
pub mod webhook;

pub use build::{
    BuildOrchestrator, BuildOutput, BuildQueue, BuildRequest, BuildState, BuildStream,
    BuildTrigger, CommandBuilder, PendingBuild, RebuildOptions, RebuildReport, build_channel,
};
pub use error::{Error, Result};
pub use lock_import::{LockImporter, parse_lock_file};
pub use persister::{JsonFilePersister, MemoryPersister, Persister};
pub use registry::RepositoryRegistry;
pub use settings::Settings;
pub use store::{ConfigLock, ConfigStore};
pub use webhook::PackageWebhookConsumer;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn error_empty_config_displays_path() {
        let error = Error::EmptyConfig {
            path: PathBuf::from("/srv/satis/satis.json"),
        };
        assert!(error.to_string().contains("/srv/satis/satis.json"));
    }

    #[test]
    fn error_lock_unavailable_names_lock() {
        let error = Error::LockUnavailable {
            name: "config".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Cannot acquire config lock for the configuration file"
        );
    }

    #[test]
    fn process_errors_convert() {
        let error: Error = repo_process::Error::InvalidCommand.into();
        assert_eq!(error.to_string(), "Command array cannot be empty.");
    }
}
