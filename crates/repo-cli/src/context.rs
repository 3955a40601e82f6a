//! Wiring of settings, store and orchestrator for one CLI invocation

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use repo_core::{
    BuildOrchestrator, BuildRequest, ConfigStore, RepositoryRegistry, Settings, build_channel,
};
use repo_meta::Repository;

use crate::cli::SettingsArgs;
use crate::error::{CliError, Result};

/// Everything a command needs, built once from the global flags.
pub struct AppContext {
    pub settings: Settings,
    pub store: Arc<ConfigStore>,
    pub registry: RepositoryRegistry,
}

impl AppContext {
    pub fn new(args: &SettingsArgs, cwd: &Path) -> Result<Self> {
        let settings = resolve_settings(args, cwd);
        tracing::debug!(?settings, "resolved settings");

        let store = Arc::new(ConfigStore::from_settings(&settings)?);
        let registry = RepositoryRegistry::new(Arc::clone(&store));
        Ok(Self {
            settings,
            store,
            registry,
        })
    }

    pub fn orchestrator(&self) -> Result<BuildOrchestrator> {
        Ok(BuildOrchestrator::from_settings(
            &self.settings,
            Arc::clone(&self.store),
        )?)
    }

    /// Queue `request` and serve it on a worker thread, returning it with
    /// its status.
    pub fn run_build(&self, request: BuildRequest) -> Result<BuildRequest> {
        let orchestrator = self.orchestrator()?;
        let (trigger, queue) = build_channel();
        let worker = thread::spawn(move || orchestrator.serve(queue));

        let pending = trigger.request(request)?;
        drop(trigger);
        let done = pending.wait()?;

        worker
            .join()
            .map_err(|_| CliError::user("build worker panicked"))?;
        Ok(done)
    }

    /// Find a repository by identifier or unique identifier prefix.
    pub fn resolve_repository(&self, id: &str) -> Result<Repository> {
        if let Some(repo) = self.registry.find_one_repository(id)? {
            return Ok(repo);
        }

        let mut matches = self
            .registry
            .repositories()?
            .into_iter()
            .filter(|repo| repo.id().starts_with(id));
        match (matches.next(), matches.next()) {
            (Some(repo), None) if !id.is_empty() => Ok(repo),
            (Some(_), Some(_)) => Err(CliError::user(format!(
                "Repository id '{}' is ambiguous",
                id
            ))),
            _ => Err(CliError::user(format!("Repository '{}' not found", id))),
        }
    }
}

/// Turn the global flags into settings rooted at an absolute install root.
pub fn resolve_settings(args: &SettingsArgs, cwd: &Path) -> Settings {
    let root = match &args.root {
        Some(root) => cwd.join(root),
        None => cwd.to_path_buf(),
    };
    let root: PathBuf = dunce::canonicalize(&root).unwrap_or(root);

    let mut settings = Settings::new(&root)
        .with_config_file(&args.config)
        .with_binary(args.binary.clone())
        .with_timeout_secs(args.timeout)
        .with_blocking_config_lock(!args.no_wait);
    if let Some(dir) = &args.lock_dir {
        settings = settings.with_lock_dir(root.join(dir));
    }
    if let Some(dir) = &args.composer_home {
        settings = settings.with_composer_home(root.join(dir));
    }
    settings
}
