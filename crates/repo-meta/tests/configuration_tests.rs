//! Integration tests for the configuration document mapping

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use repo_meta::{
    Configuration, InstallationSource, Repository, RepositoryCollection, RepositoryType,
    repository_id,
};
use serde_json::Value;

const FULL_FIXTURE: &str = include_str!("../../../test-fixtures/config/satis-full.json");

#[test]
fn test_load_full_document() {
    let config = Configuration::from_json(FULL_FIXTURE).unwrap();

    assert_eq!(config.name, "acme/packages");
    assert_eq!(config.output_dir, "web");
    assert_eq!(config.repositories.len(), 2);

    let cli = config
        .repositories
        .get(&repository_id("git@gitlab.acme.test:tools/cli.git"))
        .expect("repository keyed by url hash");
    assert_eq!(cli.kind, RepositoryType::Vcs);
    assert_eq!(cli.installation_source, InstallationSource::Source);

    assert_eq!(config.require.len(), 1);
    assert_eq!(config.blacklist[0].constraint, "1.0.1");
    assert_eq!(config.minimum_stability_per_package[0].stability, "beta");
    assert_eq!(config.abandoned.len(), 2);
    assert_eq!(config.archive.format, "tar");
    assert_eq!(config.archive.prefix_url.as_deref(), Some("https://dl.acme.test"));
    assert!(config.archive.override_dist_type);
    assert_eq!(config.comment.as_deref(), Some("managed by satisctl"));
}

#[test]
fn test_full_document_survives_write_and_read() {
    let config = Configuration::from_json(FULL_FIXTURE).unwrap();

    let rendered = config.to_json().unwrap();
    let reloaded = Configuration::from_json(&rendered).unwrap();

    assert_eq!(reloaded, config);

    let original: Value = serde_json::from_str(FULL_FIXTURE).unwrap();
    let written: Value = serde_json::from_str(&rendered).unwrap();
    assert_eq!(written, original);
}

#[test]
fn test_repositories_written_as_array() {
    let mut config = Configuration::default();
    config
        .repositories
        .insert(Repository::new("https://example.com/a.git", RepositoryType::Git).with_name("a/a"));

    let value: Value = serde_json::to_value(&config).unwrap();
    let repos = value["repositories"].as_array().unwrap();
    assert_eq!(repos.len(), 1);
    assert_eq!(repos[0]["type"], "git");
    assert_eq!(repos[0]["installation-source"], "dist");
    assert!(repos[0].get("id").is_none());
}

#[test]
fn test_unknown_repository_type_is_rejected() {
    let result = Configuration::from_json(
        r#"{"repositories": [{"type": "cvs", "url": "https://x", "name": "x/x"}]}"#,
    );
    assert!(result.is_err());
}

fn url_strategy() -> impl Strategy<Value = String> {
    "https://[a-z]{1,8}\\.test/[a-z]{1,8}(\\.git)?"
}

proptest! {
    #[test]
    fn test_collection_round_trip_preserves_order(urls in prop::collection::vec(url_strategy(), 0..12)) {
        let collection: RepositoryCollection = urls
            .iter()
            .map(|url| Repository::new(url.clone(), RepositoryType::Vcs))
            .collect();

        let json = serde_json::to_string(&collection).unwrap();
        let reloaded: RepositoryCollection = serde_json::from_str(&json).unwrap();

        prop_assert_eq!(reloaded, collection);
    }

    #[test]
    fn test_identifier_is_deterministic(url in url_strategy()) {
        prop_assert_eq!(repository_id(&url), repository_id(&url.clone()));
        prop_assert_eq!(repository_id(&url).len(), 64);
    }
}
