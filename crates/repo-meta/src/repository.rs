//! Repository entries of the configuration document

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Kind of upstream source a repository entry points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepositoryType {
    Artifact,
    Composer,
    Git,
    Github,
    Gitlab,
    GitBitbucket,
    Hg,
    HgBitbucket,
    Package,
    Path,
    Pear,
    Perforce,
    Svn,
    #[default]
    Vcs,
}

impl RepositoryType {
    /// Every supported kind, in display order.
    pub const ALL: [RepositoryType; 14] = [
        Self::Artifact,
        Self::Composer,
        Self::Git,
        Self::Github,
        Self::Gitlab,
        Self::GitBitbucket,
        Self::Hg,
        Self::HgBitbucket,
        Self::Package,
        Self::Path,
        Self::Pear,
        Self::Perforce,
        Self::Svn,
        Self::Vcs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Artifact => "artifact",
            Self::Composer => "composer",
            Self::Git => "git",
            Self::Github => "github",
            Self::Gitlab => "gitlab",
            Self::GitBitbucket => "git-bitbucket",
            Self::Hg => "hg",
            Self::HgBitbucket => "hg-bitbucket",
            Self::Package => "package",
            Self::Path => "path",
            Self::Pear => "pear",
            Self::Perforce => "perforce",
            Self::Svn => "svn",
            Self::Vcs => "vcs",
        }
    }
}

impl FromStr for RepositoryType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| Error::UnsupportedRepositoryType {
                kind: s.to_string(),
            })
    }
}

impl fmt::Display for RepositoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether packages are installed from archives or from source checkouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallationSource {
    #[default]
    Dist,
    Source,
}

impl FromStr for InstallationSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "dist" => Ok(Self::Dist),
            "source" => Ok(Self::Source),
            _ => Err(Error::UnsupportedInstallationSource {
                source_kind: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for InstallationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dist => write!(f, "dist"),
            Self::Source => write!(f, "source"),
        }
    }
}

/// Derive the collection key of a repository from its url.
///
/// Pure and deterministic: the same url always yields the same identifier,
/// and the identifier is never stored next to the url.
pub fn repository_id(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// One upstream source the aggregator pulls packages from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Repository {
    #[serde(rename = "type", default)]
    pub kind: RepositoryType,
    pub url: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub installation_source: InstallationSource,
}

impl Repository {
    pub fn new(url: impl Into<String>, kind: RepositoryType) -> Self {
        Self {
            kind,
            url: url.into(),
            name: String::new(),
            installation_source: InstallationSource::default(),
        }
    }

    /// Set the display name (`vendor/package`).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_installation_source(mut self, source: InstallationSource) -> Self {
        self.installation_source = source;
        self
    }

    /// Collection key, derived from the url.
    pub fn id(&self) -> String {
        repository_id(&self.url)
    }

    /// Check the invariants a stored repository must satisfy.
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(Error::InvalidRepository {
                reason: "url must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("git-bitbucket", RepositoryType::GitBitbucket)]
    #[case("hg-bitbucket", RepositoryType::HgBitbucket)]
    #[case("GitHub", RepositoryType::Github)]
    #[case(" vcs ", RepositoryType::Vcs)]
    fn parses_repository_type(#[case] input: &str, #[case] expected: RepositoryType) {
        assert_eq!(input.parse::<RepositoryType>().unwrap(), expected);
    }

    #[test]
    fn rejects_unknown_repository_type() {
        assert!(matches!(
            "cvs".parse::<RepositoryType>(),
            Err(Error::UnsupportedRepositoryType { .. })
        ));
    }

    #[test]
    fn serde_names_match_display() {
        for kind in RepositoryType::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind));
        }
    }

    #[test]
    fn id_depends_only_on_url() {
        let a = Repository::new("https://example.com/a.git", RepositoryType::Git).with_name("a/a");
        let b = Repository::new("https://example.com/a.git", RepositoryType::Vcs).with_name("b/b");
        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), repository_id("https://example.com/b.git"));
    }

    #[test]
    fn empty_url_is_invalid() {
        let repo = Repository::new("  ", RepositoryType::Git);
        assert!(repo.validate().is_err());
    }

    #[test]
    fn defaults_to_dist_installation() {
        let repo: Repository =
            serde_json::from_str(r#"{"type":"git","url":"https://x/y.git","name":"x/y"}"#).unwrap();
        assert_eq!(repo.installation_source, InstallationSource::Dist);
    }
}
