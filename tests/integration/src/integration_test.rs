//! End-to-end test of the vertical slice
//!
//! Edits go through the registry and the locked store, builds go through the
//! orchestrator and the real process layer into a fake build tool.

#![cfg(unix)]

use std::sync::Arc;
use std::thread;

use pretty_assertions::assert_eq;
use repo_core::{
    BuildOrchestrator, BuildRequest, ConfigStore, RebuildOptions, RepositoryRegistry, Settings,
    build_channel,
};
use repo_meta::{Repository, RepositoryType};
use repo_test_utils::TestWorkspace;

struct Slice {
    ws: TestWorkspace,
    settings: Settings,
    store: Arc<ConfigStore>,
    registry: RepositoryRegistry,
}

impl Slice {
    fn new() -> Self {
        let ws = TestWorkspace::new();
        let settings = Settings::new(ws.root()).with_timeout_secs(30);
        let store = Arc::new(ConfigStore::from_settings(&settings).unwrap());
        let registry = RepositoryRegistry::new(Arc::clone(&store));
        Self {
            ws,
            settings,
            store,
            registry,
        }
    }

    fn orchestrator(&self) -> BuildOrchestrator {
        BuildOrchestrator::from_settings(&self.settings, Arc::clone(&self.store)).unwrap()
    }
}

#[test]
fn test_edit_then_build_writes_artifact() {
    let slice = Slice::new();
    slice.ws.install_build_tool(0);

    slice
        .registry
        .add(
            Repository::new("https://github.com/acme/lib.git", RepositoryType::Git)
                .with_name("acme/lib"),
        )
        .unwrap();

    let mut request = BuildRequest::for_repository("acme/lib");
    slice.orchestrator().on_build(&mut request);

    assert_eq!(request.status(), Some(0));
    slice.ws.assert_file_exists("public/packages.json");

    let invocations = slice.ws.invocations();
    assert_eq!(invocations.len(), 1);
    let expected = format!(
        "build {} public --skip-errors --no-ansi --verbose acme/lib",
        slice.ws.config_path().display()
    );
    assert_eq!(invocations[0], expected);
}

#[test]
fn test_build_passes_tool_environment() {
    let slice = Slice::new();
    repo_test_utils::tool::write_script(
        &slice.ws.root().join(repo_test_utils::workspace::BINARY),
        "echo \"$COMPOSER_HOME $COMPOSER_NO_INTERACTION\" > env.txt",
    );

    let mut request = BuildRequest::all();
    slice.orchestrator().on_build(&mut request);

    assert!(request.is_success());
    // a home set on the host wins over the default
    let home = std::env::var("COMPOSER_HOME")
        .unwrap_or_else(|_| slice.ws.composer_home().display().to_string());
    let env = std::fs::read_to_string(slice.ws.root().join("env.txt")).unwrap();
    assert_eq!(env.trim(), format!("{home} 1"));
}

#[test]
fn test_queued_build_reports_tool_status() {
    let slice = Slice::new();
    slice.ws.install_build_tool(2);

    let orchestrator = slice.orchestrator();
    let (trigger, queue) = build_channel();
    let worker = thread::spawn(move || orchestrator.serve(queue));

    let done = trigger.request(BuildRequest::all()).unwrap().wait().unwrap();
    drop(trigger);
    worker.join().unwrap();

    assert_eq!(done.status(), Some(2));
    assert!(!done.is_success());
}

#[test]
fn test_rebuild_then_skip_while_fresh() {
    let slice = Slice::new();
    slice.ws.install_build_tool(0);
    slice
        .registry
        .add(Repository::new("https://github.com/acme/lib.git", RepositoryType::Vcs))
        .unwrap();

    let orchestrator = slice.orchestrator();
    let options = RebuildOptions {
        lifetime: Some(std::time::Duration::from_secs(3600)),
        ..RebuildOptions::default()
    };

    let first = orchestrator.rebuild(&options).unwrap();
    assert!(!first.skipped);
    assert!(first.is_success());

    let second = orchestrator.rebuild(&options).unwrap();
    assert!(second.skipped);
    assert_eq!(slice.ws.invocations().len(), 1);

    // touching the configuration invalidates the output
    thread::sleep(std::time::Duration::from_millis(50));
    slice
        .registry
        .add(Repository::new("https://github.com/acme/cli.git", RepositoryType::Vcs))
        .unwrap();

    let third = orchestrator.rebuild(&options).unwrap();
    assert!(!third.skipped);
    assert_eq!(slice.ws.invocations().len(), 2);
}

#[test]
fn test_lock_import_then_webhook_build() {
    let slice = Slice::new();
    slice.ws.install_build_tool(0);

    let imported = repo_core::LockImporter::new(slice.registry.clone())
        .import(
            r#"{"packages": [
                {"name": "acme/lib", "source": {"type": "git", "url": "https://github.com/acme/lib.git"}}
            ]}"#,
        )
        .unwrap();
    assert_eq!(imported.len(), 1);

    // imported entries carry no name, so the webhook builds everything
    let orchestrator = slice.orchestrator();
    let (trigger, queue) = build_channel();
    let consumer = repo_core::PackageWebhookConsumer::new(
        slice.registry.clone(),
        trigger,
        &slice.settings.lock_factory(),
    )
    .unwrap();
    let worker = thread::spawn(move || orchestrator.serve(queue));

    let payload = serde_json::json!({"repository": {"url": "https://github.com/acme/lib.git"}});
    let done = consumer.consume(&payload).unwrap().wait().unwrap();
    drop(consumer);
    worker.join().unwrap();

    assert!(done.is_success());
    assert_eq!(done.repository(), None);
    slice.ws.assert_file_exists("public/packages.json");
}
