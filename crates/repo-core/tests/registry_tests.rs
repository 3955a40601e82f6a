//! Tests for the repository registry over the configuration store

use std::sync::Arc;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use repo_core::{ConfigStore, Error, LockImporter, MemoryPersister, RepositoryRegistry};
use repo_fs::LockFactory;
use repo_meta::{Configuration, Repository, RepositoryType};
use tempfile::{TempDir, tempdir};

struct Fixture {
    _dir: TempDir,
    persister: Arc<MemoryPersister>,
    registry: RepositoryRegistry,
}

fn fixture() -> Fixture {
    let dir = tempdir().unwrap();
    let persister = Arc::new(MemoryPersister::new());
    let store = ConfigStore::new(persister.clone(), &LockFactory::new(dir.path())).unwrap();
    Fixture {
        _dir: dir,
        persister,
        registry: RepositoryRegistry::new(Arc::new(store)),
    }
}

fn git(url: &str, name: &str) -> Repository {
    Repository::new(url, RepositoryType::Git).with_name(name)
}

fn persisted(persister: &MemoryPersister) -> Configuration {
    Configuration::from_json(&persister.content().unwrap()).unwrap()
}

#[test]
fn test_add_persists_repository() {
    let f = fixture();
    let repo = git("https://github.com/acme/lib.git", "acme/lib");

    f.registry.add(repo.clone()).unwrap();

    assert_eq!(f.registry.find_one_repository(&repo.id()).unwrap(), Some(repo.clone()));
    assert_eq!(persisted(&f.persister).repositories.get(&repo.id()), Some(&repo));
    assert_eq!(f.persister.flush_count(), 1);
}

#[test]
fn test_add_overwrites_same_url() {
    let f = fixture();
    f.registry.add(git("https://github.com/acme/lib.git", "acme/lib")).unwrap();
    f.registry.add(git("https://github.com/acme/lib.git", "acme/renamed")).unwrap();

    let repos = f.registry.repositories().unwrap();
    assert_eq!(repos.len(), 1);
    assert_eq!(repos[0].name, "acme/renamed");
}

#[test]
fn test_add_rejects_empty_url() {
    let f = fixture();
    let result = f.registry.add(git("", "acme/none"));
    assert!(matches!(result, Err(Error::InvalidRepository { .. })));
    assert_eq!(f.persister.flush_count(), 0);
}

#[test]
fn test_add_all_flushes_once() {
    let f = fixture();
    let first = git("https://github.com/acme/a.git", "acme/a");
    let second = git("https://github.com/acme/b.git", "acme/b");

    f.registry.add_all(vec![first.clone(), second.clone()]).unwrap();

    assert_eq!(f.persister.flush_count(), 1);
    assert_eq!(f.registry.repositories().unwrap(), vec![first, second]);
}

#[test]
fn test_update_of_unknown_repository_fails_and_changes_nothing() {
    let f = fixture();
    f.registry.add(git("https://github.com/acme/a.git", "acme/a")).unwrap();
    let before = f.persister.content();

    let ghost = git("https://github.com/acme/ghost.git", "acme/ghost");
    let result = f.registry.update(&ghost, git("https://github.com/acme/new.git", "acme/new"));

    assert!(matches!(result, Err(Error::UnknownRepository { ref id }) if *id == ghost.id()));
    assert_eq!(f.persister.content(), before);
    assert_eq!(f.persister.flush_count(), 1);
}

#[test]
fn test_update_changing_url_changes_identifier() {
    let f = fixture();
    let old = git("https://github.com/acme/lib.git", "acme/lib");
    f.registry.add(old.clone()).unwrap();

    let new = git("https://gitlab.com/acme/lib.git", "acme/lib");
    f.registry.update(&old, new.clone()).unwrap();

    assert_eq!(f.registry.find_one_repository(&old.id()).unwrap(), None);
    assert_eq!(f.registry.find_one_repository(&new.id()).unwrap(), Some(new));
    assert_eq!(f.registry.repositories().unwrap().len(), 1);
}

#[test]
fn test_update_keeping_url_replaces_fields() {
    let f = fixture();
    let old = git("https://github.com/acme/lib.git", "acme/lib");
    f.registry.add(old.clone()).unwrap();

    let renamed = old.clone().with_name("acme/library");
    f.registry.update(&old, renamed.clone()).unwrap();

    assert_eq!(f.registry.find_one_repository(&old.id()).unwrap(), Some(renamed));
}

#[test]
fn test_delete_absent_repository_is_noop() {
    let f = fixture();
    f.registry.add(git("https://github.com/acme/a.git", "acme/a")).unwrap();
    let before = persisted(&f.persister);

    f.registry.delete(&git("https://github.com/acme/ghost.git", "acme/ghost")).unwrap();

    assert_eq!(persisted(&f.persister), before);
}

#[test]
fn test_delete_removes_repository() {
    let f = fixture();
    let repo = git("https://github.com/acme/a.git", "acme/a");
    f.registry.add(repo.clone()).unwrap();

    f.registry.delete(&repo).unwrap();

    assert!(f.registry.repositories().unwrap().is_empty());
    assert!(persisted(&f.persister).repositories.is_empty());
}

#[test]
fn test_find_by_url_tiers() {
    let f = fixture();
    f.registry
        .add_all(vec![
            git("https://github.com/acme/lib.git", "acme/lib"),
            git("https://gitlab.acme.test/tools/cli.git", "acme/cli"),
            git("https://bitbucket.org/acme/legacy/", "acme/legacy"),
        ])
        .unwrap();

    let name = |url: &str| f.registry.find_by_url(url).unwrap().map(|r| r.name);

    // exact, ignoring trailing slash
    assert_eq!(name("https://github.com/acme/lib.git/").as_deref(), Some("acme/lib"));
    assert_eq!(name("https://bitbucket.org/acme/legacy").as_deref(), Some("acme/legacy"));
    // same host
    assert_eq!(name("https://gitlab.acme.test/other/project").as_deref(), Some("acme/cli"));
    // substring
    assert_eq!(name("acme/lib").as_deref(), Some("acme/lib"));
    // nothing
    assert_eq!(name("https://example.test/none"), None);
}

#[test]
fn test_lock_import_adds_all_sources_in_one_flush() {
    let f = fixture();
    let importer = LockImporter::new(f.registry.clone());
    let lock = r#"{
        "packages": [
            {"name": "acme/a", "source": {"type": "git", "url": "https://git.test/acme/a.git"}},
            {"name": "acme/b", "source": {"type": "github", "url": "https://github.com/acme/b"}}
        ],
        "packages-dev": [
            {"name": "acme/c", "source": {"type": "svn", "url": "https://svn.test/acme/c"}}
        ]
    }"#;

    let imported = importer.import(lock).unwrap();

    assert_eq!(imported.len(), 3);
    assert_eq!(f.persister.flush_count(), 1);
    let urls: Vec<String> = f.registry.repositories().unwrap().into_iter().map(|r| r.url).collect();
    assert_eq!(
        urls,
        vec!["https://git.test/acme/a.git", "https://github.com/acme/b", "https://svn.test/acme/c"]
    );
}

#[test]
fn test_lock_import_rejects_malformed_file() {
    let f = fixture();
    let result = LockImporter::new(f.registry.clone()).import("not json");
    assert!(matches!(result, Err(Error::InvalidLockFile { .. })));
    assert_eq!(f.persister.flush_count(), 0);
}

#[derive(Debug, Clone)]
enum Op {
    Add(usize),
    Update(usize, usize),
    Delete(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..6usize).prop_map(Op::Add),
        (0..6usize, 0..6usize).prop_map(|(a, b)| Op::Update(a, b)),
        (0..6usize).prop_map(Op::Delete),
    ]
}

fn numbered(i: usize) -> Repository {
    git(&format!("https://git.test/acme/pkg{i}.git"), &format!("acme/pkg{i}"))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn test_persisted_document_matches_memory(ops in prop::collection::vec(op_strategy(), 1..16)) {
        let f = fixture();
        for op in ops {
            let result = match op {
                Op::Add(i) => f.registry.add(numbered(i)),
                Op::Update(a, b) => f.registry.update(&numbered(a), numbered(b)).map(|_| ()),
                Op::Delete(i) => f.registry.delete(&numbered(i)),
            };
            if let Err(e) = result {
                let is_unknown_repository = matches!(e, Error::UnknownRepository { .. });
                prop_assert!(is_unknown_repository);
            }
        }

        let in_memory = f.registry.store().load().unwrap();
        let stored = f
            .persister
            .content()
            .map(|content| Configuration::from_json(&content).unwrap())
            .unwrap_or_default();
        prop_assert_eq!(stored, in_memory);
    }
}
