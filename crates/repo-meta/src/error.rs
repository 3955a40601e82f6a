//! Error types for repo-meta

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unsupported repository type: {kind}")]
    UnsupportedRepositoryType { kind: String },

    #[error("Unsupported installation source: {source_kind}")]
    UnsupportedInstallationSource { source_kind: String },

    #[error("Invalid repository: {reason}")]
    InvalidRepository { reason: String },

    /// A settings key that does not name a document setting
    #[error("Unknown setting: {key}")]
    UnknownSetting { key: String },

    #[error("Invalid value for {key}: {reason}")]
    InvalidSetting { key: String, reason: String },

    #[error("Invalid configuration document: {0}")]
    Parse(#[from] serde_json::Error),
}
