//! The `archive` section of the configuration document

use serde::{Deserialize, Serialize, Serializer};

const DEFAULT_FORMAT: &str = "zip";

/// Archive settings: where and how dist archives are produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Archive {
    pub directory: String,
    /// Archive format; an empty value is written out as `zip`.
    #[serde(serialize_with = "serialize_format")]
    pub format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub absolute_directory: Option<String>,
    pub skip_dev: bool,
    pub whitelist: Vec<String>,
    pub blacklist: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix_url: Option<String>,
    pub checksum: bool,
    pub ignore_filters: bool,
    pub override_dist_type: bool,
    pub rearchive: bool,
}

impl Default for Archive {
    fn default() -> Self {
        Self {
            directory: String::new(),
            format: String::new(),
            absolute_directory: None,
            skip_dev: true,
            whitelist: Vec::new(),
            blacklist: Vec::new(),
            prefix_url: None,
            checksum: true,
            ignore_filters: false,
            override_dist_type: false,
            rearchive: true,
        }
    }
}

impl Archive {
    /// Format that will actually be written.
    pub fn effective_format(&self) -> &str {
        if self.format.is_empty() {
            DEFAULT_FORMAT
        } else {
            &self.format
        }
    }
}

fn serialize_format<S: Serializer>(format: &str, serializer: S) -> Result<S::Ok, S::Error> {
    if format.is_empty() {
        serializer.serialize_str(DEFAULT_FORMAT)
    } else {
        serializer.serialize_str(format)
    }
}
