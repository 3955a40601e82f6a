//! Repository list management

use colored::Colorize;
use repo_core::BuildRequest;
use repo_meta::{InstallationSource, Repository, RepositoryType};

use super::report_build;
use crate::context::AppContext;
use crate::error::{CliError, Result};

/// Run the repo list command
pub fn run_repo_list(ctx: &AppContext, json: bool) -> Result<i32> {
    let repositories = ctx.registry.repositories()?;

    if json {
        let entries: Vec<serde_json::Value> = repositories
            .iter()
            .map(|repo| {
                serde_json::json!({
                    "id": repo.id(),
                    "name": repo.name,
                    "type": repo.kind.as_str(),
                    "url": repo.url,
                    "installation-source": repo.installation_source.to_string(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(0);
    }

    if repositories.is_empty() {
        println!(
            "No repositories configured. Use {} to add one.",
            "satisctl repo add <url>".cyan()
        );
        return Ok(0);
    }

    for repo in &repositories {
        let id = repo.id();
        println!(
            "{}  {:<30} {:<14} {}",
            id[..12].yellow(),
            display_name(repo),
            repo.kind.as_str().dimmed(),
            repo.url
        );
    }
    println!();
    println!("{} {} repositories", "Total:".dimmed(), repositories.len());
    Ok(0)
}

/// Run the repo show command
pub fn run_repo_show(ctx: &AppContext, id: &str) -> Result<i32> {
    let repo = ctx.resolve_repository(id)?;
    println!("{:<20} {}", "id:".bold(), repo.id());
    println!("{:<20} {}", "name:".bold(), display_name(&repo));
    println!("{:<20} {}", "type:".bold(), repo.kind);
    println!("{:<20} {}", "url:".bold(), repo.url);
    println!(
        "{:<20} {}",
        "installation-source:".bold(),
        repo.installation_source
    );
    Ok(0)
}

/// Run the repo add command
pub fn run_repo_add(
    ctx: &AppContext,
    url: &str,
    kind: &str,
    name: &str,
    source: &str,
    build: bool,
) -> Result<i32> {
    let repo = Repository::new(url, parse_kind(kind)?)
        .with_name(name)
        .with_installation_source(parse_source(source)?);

    ctx.registry.add(repo.clone())?;
    println!(
        "{} Added {} ({})",
        "OK".green().bold(),
        repo.url.cyan(),
        &repo.id()[..12]
    );

    if build {
        return build_repository(ctx, &repo);
    }
    Ok(0)
}

/// Field overrides for the repo update command
#[derive(Debug, Default)]
pub struct RepoUpdate<'a> {
    pub url: Option<&'a str>,
    pub kind: Option<&'a str>,
    pub name: Option<&'a str>,
    pub source: Option<&'a str>,
}

/// Run the repo update command
pub fn run_repo_update(ctx: &AppContext, id: &str, changes: RepoUpdate<'_>, build: bool) -> Result<i32> {
    let existing = ctx.resolve_repository(id)?;

    let mut updated = existing.clone();
    if let Some(url) = changes.url {
        updated.url = url.to_string();
    }
    if let Some(kind) = changes.kind {
        updated.kind = parse_kind(kind)?;
    }
    if let Some(name) = changes.name {
        updated.name = name.to_string();
    }
    if let Some(source) = changes.source {
        updated.installation_source = parse_source(source)?;
    }

    let updated = ctx.registry.update(&existing, updated)?;
    println!(
        "{} Updated {} ({})",
        "OK".green().bold(),
        updated.url.cyan(),
        &updated.id()[..12]
    );

    if build {
        return build_repository(ctx, &updated);
    }
    Ok(0)
}

/// Run the repo remove command
pub fn run_repo_remove(ctx: &AppContext, id: &str) -> Result<i32> {
    let repo = ctx.resolve_repository(id)?;
    ctx.registry.delete(&repo)?;
    println!("{} Removed {}", "OK".green().bold(), repo.url.cyan());
    Ok(0)
}

fn build_repository(ctx: &AppContext, repo: &Repository) -> Result<i32> {
    let request = if repo.name.is_empty() {
        BuildRequest::all()
    } else {
        BuildRequest::for_repository(repo.name.clone())
    };
    let done = ctx.run_build(request)?;
    Ok(report_build(&done))
}

fn display_name(repo: &Repository) -> &str {
    if repo.name.is_empty() {
        "-"
    } else {
        &repo.name
    }
}

fn parse_kind(kind: &str) -> Result<RepositoryType> {
    kind.parse().map_err(|_| {
        let valid: Vec<&str> = RepositoryType::ALL.iter().map(|k| k.as_str()).collect();
        CliError::user(format!(
            "Unknown repository type '{}'. Valid: {}",
            kind,
            valid.join(", ")
        ))
    })
}

fn parse_source(source: &str) -> Result<InstallationSource> {
    source
        .parse()
        .map_err(|_| CliError::user(format!("Unknown installation source '{}'. Valid: dist, source", source)))
}
