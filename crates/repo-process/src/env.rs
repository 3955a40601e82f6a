//! Environment computation for spawned build processes

use std::collections::BTreeMap;

/// Variable pointing the build tool at its home/cache directory
pub const HOME_VAR: &str = "COMPOSER_HOME";
/// Variable disabling interactive prompts in the build tool
pub const NO_INTERACTION_VAR: &str = "COMPOSER_NO_INTERACTION";

/// Computes the environment passed to spawned processes.
///
/// The result is built in four passes, later passes writing over earlier
/// ones:
///
/// 1. host variables from the snapshot that still resolve through a live
///    lookup (variables unset since the snapshot are dropped)
/// 2. every variable of the secondary source
/// 3. the home directory variable, only when still absent
/// 4. the no-interaction flag, always
#[derive(Debug, Clone)]
pub struct EnvironmentBuilder {
    snapshot: Vec<String>,
    secondary: BTreeMap<String, String>,
    home_default: String,
}

impl EnvironmentBuilder {
    /// Snapshot the current host environment.
    pub fn new(home_default: impl Into<String>) -> Self {
        let snapshot = std::env::vars_os()
            .filter_map(|(key, _)| key.into_string().ok())
            .collect();
        Self {
            snapshot,
            secondary: BTreeMap::new(),
            home_default: home_default.into(),
        }
    }

    /// Replace the snapshot with an explicit list of variable names.
    pub fn with_snapshot<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.snapshot = names.into_iter().map(Into::into).collect();
        self
    }

    /// Add variables from a secondary source (e.g. an application env file).
    pub fn with_secondary<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.secondary
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn home_default(&self) -> &str {
        &self.home_default
    }

    /// Compute the environment for a new process.
    pub fn get_env(&self) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();

        for key in &self.snapshot {
            if let Ok(value) = std::env::var(key) {
                env.insert(key.clone(), value);
            }
        }

        for (key, value) in &self.secondary {
            env.insert(key.clone(), value.clone());
        }

        env.entry(HOME_VAR.to_string())
            .or_insert_with(|| self.home_default.clone());
        env.insert(NO_INTERACTION_VAR.to_string(), "1".to_string());

        env
    }
}
