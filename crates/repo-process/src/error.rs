//! Error types for process execution

use std::path::PathBuf;
use std::time::Duration;

/// Errors that can occur while launching or supervising a process
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An empty argument vector was handed to the factory
    #[error("Command array cannot be empty.")]
    InvalidCommand,

    /// The program could not be started
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The process exceeded its timeout and was killed
    #[error("The process \"{command}\" exceeded the timeout of {} seconds.", .timeout.as_secs())]
    TimedOut { command: String, timeout: Duration },

    /// I/O error while supervising the process
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for process operations
pub type Result<T> = std::result::Result<T, Error>;
