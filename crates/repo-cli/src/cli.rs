//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// satisctl - Manage a package repository aggregator configuration and its builds
#[derive(Parser, Debug)]
#[command(name = "satisctl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub settings: SettingsArgs,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Locations and limits shared by every command.
///
/// Relative paths other than `--root` are resolved against the root.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct SettingsArgs {
    /// Configuration file
    #[arg(long, global = true, env = "SATIS_FILENAME", default_value = "satis.json")]
    pub config: PathBuf,

    /// Install root of the build tool (defaults to the current directory)
    #[arg(long, global = true, env = "SATIS_ROOT")]
    pub root: Option<PathBuf>,

    /// Directory holding lock files [default: <root>/var/lock]
    #[arg(long, global = true, env = "SATIS_LOCK_DIR")]
    pub lock_dir: Option<PathBuf>,

    /// Home directory handed to the build tool [default: <root>/var/composer]
    #[arg(long, global = true, env = "COMPOSER_HOME_DEFAULT")]
    pub composer_home: Option<PathBuf>,

    /// Build tool, relative to the root
    #[arg(long, global = true, env = "SATIS_BINARY", default_value = "vendor/bin/satis")]
    pub binary: String,

    /// Build timeout in seconds, 0 disables it
    #[arg(long, global = true, env = "SATIS_BUILD_TIMEOUT", default_value_t = 600)]
    pub timeout: u64,

    /// Fail instead of waiting when the configuration is locked
    #[arg(long, global = true)]
    pub no_wait: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Rebuild packages when the configuration changed or the output is outdated
    ///
    /// Examples:
    ///   satisctl rebuild                       # Rebuild into the configured output-dir
    ///   satisctl rebuild web acme/lib          # Rebuild acme/lib into web/
    ///   satisctl rebuild --lifetime 3600       # Skip if output is younger than an hour
    Rebuild {
        /// Location where to output built files
        output_dir: Option<String>,

        /// Packages that should be built; all when omitted
        packages: Vec<String>,

        /// Maximum lifetime of the built definitions in seconds
        #[arg(short, long)]
        lifetime: Option<u64>,

        /// Rebuild even when the output is still fresh
        #[arg(long)]
        no_cache: bool,
    },

    /// Run a build and stream its output
    Build {
        /// Restrict the build to one repository name
        #[arg(short, long)]
        repository: Option<String>,
    },

    /// Manage configured repositories
    Repo {
        #[command(subcommand)]
        action: RepoAction,
    },

    /// Show or edit document-level settings
    ///
    /// Examples:
    ///   satisctl config show
    ///   satisctl config set output-dir web
    ///   satisctl config set require acme/lib=^1.0
    ///   satisctl config set abandoned acme/old=acme/new
    ///   satisctl config unset require acme/lib
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Add the package sources of a lock file as repositories
    ImportLock {
        /// Path to the lock file
        file: PathBuf,
    },

    /// Replay a package webhook payload and run the resulting build
    Webhook {
        /// JSON payload containing `repository.url`
        payload: PathBuf,
    },
}

/// Repository actions
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum RepoAction {
    /// List configured repositories
    List {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Show one repository
    Show {
        /// Repository identifier or a unique prefix of it
        id: String,
    },

    /// Add a repository
    Add {
        /// Repository url
        url: String,

        /// Repository type
        #[arg(short = 't', long = "type", default_value = "vcs")]
        kind: String,

        /// Package name (vendor/package)
        #[arg(short, long, default_value = "")]
        name: String,

        /// Installation source: dist or source
        #[arg(short, long, default_value = "dist")]
        source: String,

        /// Build the repository after saving it
        #[arg(long)]
        build: bool,
    },

    /// Update a repository
    Update {
        /// Repository identifier or a unique prefix of it
        id: String,

        /// New url
        #[arg(long)]
        url: Option<String>,

        /// New repository type
        #[arg(short = 't', long = "type")]
        kind: Option<String>,

        /// New package name
        #[arg(short, long)]
        name: Option<String>,

        /// New installation source
        #[arg(short, long)]
        source: Option<String>,

        /// Build the repository after saving it
        #[arg(long)]
        build: bool,
    },

    /// Remove a repository
    Remove {
        /// Repository identifier or a unique prefix of it
        id: String,
    },
}

/// Settings actions
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigAction {
    /// Show document settings
    Show {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Set a document setting
    Set {
        /// Setting key, e.g. `output-dir` or `archive.format`
        key: String,

        /// New value; keyed lists take `<package>=<value>`
        value: String,
    },

    /// Reset a setting to its default
    Unset {
        /// Setting key
        key: String,

        /// Remove only this package from a keyed list
        package: Option<String>,
    },
}
