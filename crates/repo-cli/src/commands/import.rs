//! Lock file import

use std::path::Path;

use colored::Colorize;
use repo_core::LockImporter;

use crate::context::AppContext;
use crate::error::{CliError, Result};

/// Run the import-lock command
pub fn run_import_lock(ctx: &AppContext, file: &Path) -> Result<i32> {
    let content = std::fs::read_to_string(file)
        .map_err(|e| CliError::read_input("lock file", file, e))?;

    let imported = LockImporter::new(ctx.registry.clone()).import(&content)?;

    for repo in &imported {
        println!("  {} {} ({})", "+".green(), repo.url, repo.kind);
    }
    println!(
        "{} Imported {} repositories from {}",
        "OK".green().bold(),
        imported.len(),
        file.display()
    );
    Ok(0)
}
