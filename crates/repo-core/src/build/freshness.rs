//! Staleness check for full rebuilds

use std::time::{Duration, SystemTime};

/// Artifact whose age decides whether a rebuild is needed.
pub const ARTIFACT_FILE: &str = "packages.json";

/// Whether the existing build output can be kept.
///
/// True when the artifact exists, is newer than the configuration and is
/// younger than `lifetime` at `now`.
pub fn is_fresh(
    config_modified: SystemTime,
    artifact_modified: Option<SystemTime>,
    lifetime: Duration,
    now: SystemTime,
) -> bool {
    let Some(artifact_modified) = artifact_modified else {
        return false;
    };
    if config_modified >= artifact_modified {
        return false;
    }
    match now.duration_since(artifact_modified) {
        Ok(age) => age < lifetime,
        // artifact stamped in the future
        Err(_) => true,
    }
}
