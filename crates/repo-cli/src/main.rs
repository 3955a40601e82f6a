//! satisctl
//!
//! Command-line interface for the package repository aggregator: edits the
//! configuration document under its lock and runs the build tool.

mod cli;
mod commands;
mod context;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cli::{Cli, Commands, ConfigAction, RepoAction};
use commands::repository::RepoUpdate;
use context::AppContext;
use error::Result;

fn main() {
    match run() {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cwd = std::env::current_dir()?;
    let ctx = AppContext::new(&cli.settings, &cwd)?;
    execute_command(&ctx, cli.command)
}

/// Log to stderr, `RUST_LOG` taking precedence over the verbosity flag.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_ok() {
        tracing::debug!("Verbose mode enabled");
    }
}

fn execute_command(ctx: &AppContext, cmd: Commands) -> Result<i32> {
    match cmd {
        Commands::Rebuild {
            output_dir,
            packages,
            lifetime,
            no_cache,
        } => commands::run_rebuild(ctx, output_dir, packages, lifetime, no_cache),
        Commands::Build { repository } => commands::run_build(ctx, repository.as_deref()),
        Commands::Repo { action } => cmd_repo(ctx, action),
        Commands::Config { action } => cmd_config(ctx, action),
        Commands::ImportLock { file } => commands::run_import_lock(ctx, &file),
        Commands::Webhook { payload } => commands::run_webhook(ctx, &payload),
    }
}

fn cmd_config(ctx: &AppContext, action: ConfigAction) -> Result<i32> {
    match action {
        ConfigAction::Show { json } => commands::run_config_show(ctx, json),
        ConfigAction::Set { key, value } => commands::run_config_set(ctx, &key, &value),
        ConfigAction::Unset { key, package } => {
            commands::run_config_unset(ctx, &key, package.as_deref())
        }
    }
}

fn cmd_repo(ctx: &AppContext, action: RepoAction) -> Result<i32> {
    match action {
        RepoAction::List { json } => commands::run_repo_list(ctx, json),
        RepoAction::Show { id } => commands::run_repo_show(ctx, &id),
        RepoAction::Add {
            url,
            kind,
            name,
            source,
            build,
        } => commands::run_repo_add(ctx, &url, &kind, &name, &source, build),
        RepoAction::Update {
            id,
            url,
            kind,
            name,
            source,
            build,
        } => {
            let changes = RepoUpdate {
                url: url.as_deref(),
                kind: kind.as_deref(),
                name: name.as_deref(),
                source: source.as_deref(),
            };
            commands::run_repo_update(ctx, &id, changes, build)
        }
        RepoAction::Remove { id } => commands::run_repo_remove(ctx, &id),
    }
}
