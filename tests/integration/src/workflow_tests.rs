//! Workflow tests: concurrent editors, serialized builds and timeouts
//! against real files, real locks and real processes.

#![cfg(unix)]

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use repo_core::{
    BuildOrchestrator, BuildOutput, BuildRequest, ConfigStore, RepositoryRegistry, Settings,
};
use repo_meta::{Repository, RepositoryType};
use repo_test_utils::TestWorkspace;

fn settings(ws: &TestWorkspace) -> Settings {
    Settings::new(ws.root()).with_timeout_secs(30)
}

fn registry(settings: &Settings) -> RepositoryRegistry {
    RepositoryRegistry::new(Arc::new(ConfigStore::from_settings(settings).unwrap()))
}

// =============================================================================
// Concurrent edits
// =============================================================================

mod edits {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn independent_stores_do_not_lose_updates() {
        let ws = TestWorkspace::new();
        let settings = settings(&ws);

        let handles: Vec<_> = (0..4)
            .map(|worker| {
                let settings = settings.clone();
                thread::spawn(move || {
                    // one store per thread, as separate processes would have
                    let registry = registry(&settings);
                    for n in 0..5 {
                        registry
                            .add(Repository::new(
                                format!("https://github.com/acme/w{worker}-{n}.git"),
                                RepositoryType::Vcs,
                            ))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let fresh = registry(&settings);
        assert_eq!(fresh.repositories().unwrap().len(), 20);
    }

    #[test]
    fn foreign_settings_survive_edits() {
        let ws = TestWorkspace::new();
        ws.write_config(
            r#"{"name": "acme/packages", "homepage": "https://packages.acme.test",
                "require-all": true, "repositories": []}"#,
        );

        let registry = registry(&settings(&ws));
        registry
            .add(Repository::new("https://github.com/acme/lib.git", RepositoryType::Git))
            .unwrap();

        let written: serde_json::Value = serde_json::from_str(&ws.read_config()).unwrap();
        assert_eq!(written["name"], "acme/packages");
        assert_eq!(written["homepage"], "https://packages.acme.test");
        assert_eq!(written["require-all"], true);
        assert_eq!(written["repositories"][0]["type"], "git");
    }

    #[test]
    fn no_wait_store_gives_up_while_another_edits() {
        let ws = TestWorkspace::new();
        let settings = settings(&ws).with_blocking_config_lock(false);
        let store = ConfigStore::from_settings(&settings).unwrap();

        let holder = settings.lock_factory().create_lock("config").unwrap();
        let guard = holder.acquire_blocking().unwrap();
        let result = store.transaction(|config| {
            config.description = "never written".to_string();
            Ok(())
        });
        assert!(matches!(result, Err(repo_core::Error::LockUnavailable { .. })));

        drop(guard);
        store
            .transaction(|config| {
                config.description = "written".to_string();
                Ok(())
            })
            .unwrap();
        assert!(ws.read_config().contains("\"written\""));
    }
}

// =============================================================================
// Builds
// =============================================================================

mod builds {
    use super::*;
    use pretty_assertions::assert_eq;

    fn orchestrator(settings: &Settings) -> BuildOrchestrator {
        let store = Arc::new(ConfigStore::from_settings(settings).unwrap());
        BuildOrchestrator::from_settings(settings, store).unwrap()
    }

    #[test]
    fn concurrent_builds_run_one_at_a_time() {
        let ws = TestWorkspace::new();
        repo_test_utils::tool::write_script(
            &ws.root().join(repo_test_utils::workspace::BINARY),
            "echo start >> trace.log\nsleep 0.2\necho end >> trace.log",
        );
        let settings = settings(&ws);

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let settings = settings.clone();
                thread::spawn(move || {
                    let mut request = BuildRequest::all();
                    orchestrator(&settings).on_build(&mut request);
                    request.status()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), Some(0));
        }

        let trace = std::fs::read_to_string(ws.root().join("trace.log")).unwrap();
        let lines: Vec<&str> = trace.lines().collect();
        assert_eq!(lines, ["start", "end", "start", "end", "start", "end"]);
    }

    #[test]
    fn timed_out_build_reports_failure() {
        let ws = TestWorkspace::new();
        ws.install_slow_tool(10);
        let settings = settings(&ws).with_timeout_secs(1);

        let started = Instant::now();
        let mut request = BuildRequest::all();
        orchestrator(&settings).on_build(&mut request);

        assert_eq!(request.status(), Some(1));
        assert!(started.elapsed() < Duration::from_secs(8));
    }

    #[test]
    fn build_lock_is_free_after_timeout() {
        let ws = TestWorkspace::new();
        ws.install_slow_tool(10);
        let settings = settings(&ws).with_timeout_secs(1);

        let mut request = BuildRequest::all();
        orchestrator(&settings).on_build(&mut request);

        let lock = settings.lock_factory().create_lock("build").unwrap();
        assert!(lock.acquire(false).unwrap().is_some());
    }

    #[test]
    fn streamed_build_yields_tool_output() {
        let ws = TestWorkspace::new();
        ws.install_build_tool(0);
        let settings = settings(&ws);

        let messages: Vec<BuildOutput> = orchestrator(&settings).stream(Some("acme/lib")).collect();

        let BuildOutput::CommandLine(command_line) = &messages[0] else {
            panic!("expected the command line first, got {:?}", messages[0]);
        };
        assert!(command_line.starts_with(&format!(
            "'{}'",
            ws.root().join("vendor/bin/satis").display()
        )));
        assert!(command_line.ends_with("'acme/lib'"));

        let lines: Vec<&str> = messages
            .iter()
            .filter_map(|m| match m {
                BuildOutput::Line(line) => Some(line.as_str()),
                _ => None,
            })
            .collect();
        assert!(lines.contains(&"Scanning packages"));
        assert!(lines.contains(&"Writing packages.json"));

        assert_eq!(
            messages.last(),
            Some(&BuildOutput::Finished {
                status: 0,
                text: "OK".to_string()
            })
        );
    }

    #[test]
    fn dropped_stream_kills_quiet_tool() {
        let ws = TestWorkspace::new();
        ws.install_slow_tool(10);
        let settings = settings(&ws);

        let mut stream = orchestrator(&settings).stream(None);
        assert!(matches!(stream.next(), Some(BuildOutput::CommandLine(_))));
        assert_eq!(stream.next(), Some(BuildOutput::Line("starting".to_string())));

        let started = Instant::now();
        drop(stream);
        let guard = settings
            .lock_factory()
            .create_lock("build")
            .unwrap()
            .acquire_blocking()
            .unwrap();

        assert!(started.elapsed() < Duration::from_secs(3));
        drop(guard);
    }

    #[test]
    fn missing_tool_streams_failure() {
        let ws = TestWorkspace::new();
        let settings = settings(&ws);

        let messages: Vec<BuildOutput> = orchestrator(&settings).stream(None).collect();

        assert_eq!(messages.len(), 1);
        assert!(matches!(messages[0], BuildOutput::Finished { status: 1, .. }));
    }
}
