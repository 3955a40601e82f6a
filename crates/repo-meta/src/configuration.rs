//! The configuration document

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::archive::Archive;
use crate::collection::RepositoryCollection;
use crate::error::Result;
use crate::pairs;

pub const DEFAULT_OUTPUT_DIR: &str = "public";

/// A package name bound to a version constraint (`require`, `blacklist`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageConstraint {
    pub package: String,
    pub constraint: String,
}

impl PackageConstraint {
    pub fn new(package: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            constraint: constraint.into(),
        }
    }
}

/// A package flagged as abandoned, optionally naming its replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Abandoned {
    pub package: String,
    pub replacement: Option<String>,
}

impl Abandoned {
    pub fn new(package: impl Into<String>, replacement: Option<String>) -> Self {
        Self {
            package: package.into(),
            replacement,
        }
    }
}

/// Minimum stability override for a single package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageStability {
    pub package: String,
    pub stability: String,
}

impl PackageStability {
    pub fn new(package: impl Into<String>, stability: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            stability: stability.into(),
        }
    }
}

/// The aggregator configuration document.
///
/// Missing keys take the documented defaults, so `{}` and an absent file both
/// describe the same document as [`Configuration::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Configuration {
    pub name: String,
    pub description: String,
    pub homepage: String,
    pub output_dir: String,
    pub output_html: bool,
    pub repositories: RepositoryCollection,
    #[serde(
        serialize_with = "serialize_constraints",
        deserialize_with = "deserialize_constraints",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub require: Vec<PackageConstraint>,
    pub require_all: bool,
    pub require_dependencies: bool,
    pub require_dev_dependencies: bool,
    pub require_dependency_filter: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strip_hosts: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_filename: Option<String>,
    pub archive: Archive,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_stability: Option<String>,
    #[serde(
        serialize_with = "serialize_stabilities",
        deserialize_with = "deserialize_stabilities",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub minimum_stability_per_package: Vec<PackageStability>,
    pub providers: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub providers_history_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twig_template: Option<String>,
    #[serde(
        serialize_with = "serialize_abandoned",
        deserialize_with = "deserialize_abandoned",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub abandoned: Vec<Abandoned>,
    #[serde(
        serialize_with = "serialize_constraints",
        deserialize_with = "deserialize_constraints",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub blacklist: Vec<PackageConstraint>,
    /// Free-form tool configuration passed through untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify_batch: Option<String>,
    #[serde(rename = "_comment", skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub pretty_print: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            name: "localhost/repository".to_string(),
            description: String::new(),
            homepage: "http://localhost".to_string(),
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
            output_html: true,
            repositories: RepositoryCollection::new(),
            require: Vec::new(),
            require_all: false,
            require_dependencies: false,
            require_dev_dependencies: false,
            require_dependency_filter: true,
            strip_hosts: None,
            include_filename: None,
            archive: Archive::default(),
            minimum_stability: Some("dev".to_string()),
            minimum_stability_per_package: Vec::new(),
            providers: false,
            providers_history_size: None,
            twig_template: None,
            abandoned: Vec::new(),
            blacklist: Vec::new(),
            config: None,
            notify_batch: None,
            comment: None,
            pretty_print: true,
        }
    }
}

impl Configuration {
    /// Parse a JSON document.
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Render the document as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn serialize_constraints<S: Serializer>(
    list: &[PackageConstraint],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    pairs::serialize(
        list.iter().map(|c| (c.package.as_str(), c.constraint.as_str())),
        serializer,
    )
}

fn deserialize_constraints<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Vec<PackageConstraint>, D::Error> {
    Ok(pairs::deserialize::<D, String>(deserializer)?
        .into_iter()
        .map(|(package, constraint)| PackageConstraint::new(package, constraint))
        .collect())
}

fn serialize_stabilities<S: Serializer>(
    list: &[PackageStability],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    pairs::serialize(
        list.iter().map(|s| (s.package.as_str(), s.stability.as_str())),
        serializer,
    )
}

fn deserialize_stabilities<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Vec<PackageStability>, D::Error> {
    Ok(pairs::deserialize::<D, String>(deserializer)?
        .into_iter()
        .map(|(package, stability)| PackageStability::new(package, stability))
        .collect())
}

// An abandoned package without a replacement is written as `true`.
fn serialize_abandoned<S: Serializer>(
    list: &[Abandoned],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    pairs::serialize(
        list.iter().map(|a| {
            let value = match a.replacement.as_deref() {
                Some(replacement) if !replacement.is_empty() => {
                    serde_json::Value::String(replacement.to_string())
                }
                _ => serde_json::Value::Bool(true),
            };
            (a.package.as_str(), value)
        }),
        serializer,
    )
}

fn deserialize_abandoned<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Vec<Abandoned>, D::Error> {
    Ok(pairs::deserialize::<D, serde_json::Value>(deserializer)?
        .into_iter()
        .map(|(package, value)| {
            let replacement = value.as_str().map(str::to_string);
            Abandoned::new(package, replacement)
        })
        .collect())
}
