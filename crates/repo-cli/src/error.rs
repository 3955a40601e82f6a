//! satisctl errors

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] repo_core::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Malformed JSON input or output
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// A lock file or payload given on the command line could not be read
    #[error("Cannot read {what} {}: {source}", .path.display())]
    ReadInput {
        what: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{message}")]
    User { message: String },
}

impl CliError {
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }

    pub fn read_input(what: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadInput {
            what,
            path: path.into(),
            source,
        }
    }
}
