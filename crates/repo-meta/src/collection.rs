//! Insertion-ordered repository collection keyed by identifier

use std::collections::HashMap;
use std::fmt;

use serde::de::{MapAccess, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::repository::Repository;

/// Ordered map from repository identifier to [`Repository`].
///
/// Lookup by identifier is O(1); iteration follows insertion order, which is
/// also the order repositories are written back to disk. Overwriting an
/// existing identifier keeps its original position.
#[derive(Debug, Clone, Default)]
pub struct RepositoryCollection {
    order: Vec<String>,
    entries: HashMap<String, Repository>,
}

impl RepositoryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Repository> {
        self.entries.get(id)
    }

    /// Insert under the repository's own identifier.
    ///
    /// Returns the entry it replaced, if any.
    pub fn insert(&mut self, repository: Repository) -> Option<Repository> {
        let id = repository.id();
        let previous = self.entries.insert(id.clone(), repository);
        if previous.is_none() {
            self.order.push(id);
        }
        previous
    }

    pub fn remove(&mut self, id: &str) -> Option<Repository> {
        let removed = self.entries.remove(id)?;
        self.order.retain(|key| key != id);
        Some(removed)
    }

    /// Identifiers in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Repositories in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Repository> {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }
}

impl PartialEq for RepositoryCollection {
    fn eq(&self, other: &Self) -> bool {
        self.order == other.order && self.entries == other.entries
    }
}

impl Eq for RepositoryCollection {}

impl FromIterator<Repository> for RepositoryCollection {
    fn from_iter<I: IntoIterator<Item = Repository>>(iter: I) -> Self {
        let mut collection = Self::new();
        collection.extend(iter);
        collection
    }
}

impl Extend<Repository> for RepositoryCollection {
    fn extend<I: IntoIterator<Item = Repository>>(&mut self, iter: I) {
        for repository in iter {
            self.insert(repository);
        }
    }
}

impl Serialize for RepositoryCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for repository in self.iter() {
            seq.serialize_element(repository)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for RepositoryCollection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(CollectionVisitor)
    }
}

/// Accepts the canonical array form as well as an object whose values are
/// repositories (keys are ignored and re-derived from the url).
struct CollectionVisitor;

impl<'de> Visitor<'de> for CollectionVisitor {
    type Value = RepositoryCollection;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a list or map of repositories")
    }

    fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
        Ok(RepositoryCollection::new())
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut collection = RepositoryCollection::new();
        while let Some(repository) = seq.next_element::<Repository>()? {
            collection.insert(repository);
        }
        Ok(collection)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut collection = RepositoryCollection::new();
        while let Some((_, repository)) = map.next_entry::<String, Repository>()? {
            collection.insert(repository);
        }
        Ok(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::RepositoryType;
    use pretty_assertions::assert_eq;

    fn repo(url: &str) -> Repository {
        Repository::new(url, RepositoryType::Git)
    }

    #[test]
    fn iteration_follows_insertion_order() {
        let collection: RepositoryCollection = ["https://c", "https://a", "https://b"]
            .into_iter()
            .map(repo)
            .collect();
        let urls: Vec<_> = collection.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["https://c", "https://a", "https://b"]);
    }

    #[test]
    fn overwrite_keeps_position() {
        let mut collection: RepositoryCollection =
            ["https://a", "https://b"].into_iter().map(repo).collect();

        let previous = collection.insert(repo("https://a").with_name("vendor/renamed"));

        assert!(previous.is_some());
        assert_eq!(collection.len(), 2);
        let first = collection.iter().next().unwrap();
        assert_eq!(first.name, "vendor/renamed");
    }

    #[test]
    fn remove_absent_is_none() {
        let mut collection = RepositoryCollection::new();
        assert!(collection.remove("missing").is_none());
        assert!(collection.is_empty());
    }

    #[test]
    fn deserializes_object_form() {
        let json = r#"{"k1":{"type":"git","url":"https://a","name":"a/a"},"k2":{"type":"vcs","url":"https://b","name":"b/b"}}"#;
        let collection: RepositoryCollection = serde_json::from_str(json).unwrap();
        let ids: Vec<_> = collection.ids().map(str::to_string).collect();
        assert_eq!(ids, vec![repo("https://a").id(), repo("https://b").id()]);
    }
}
