//! Cache-aware full rebuild

use std::time::Duration;

use colored::Colorize;
use repo_core::RebuildOptions;

use crate::context::AppContext;
use crate::error::Result;

/// Run the rebuild command
pub fn run_rebuild(
    ctx: &AppContext,
    output_dir: Option<String>,
    packages: Vec<String>,
    lifetime: Option<u64>,
    no_cache: bool,
) -> Result<i32> {
    println!("{}", "Starting rebuild".bold());
    println!(
        "Using config file: {}",
        ctx.settings.config_path().display().to_string().cyan()
    );
    if let Some(dir) = &output_dir {
        println!("Output directory: {}", dir.cyan());
    }

    let options = RebuildOptions {
        output_dir,
        packages,
        lifetime: lifetime.map(Duration::from_secs),
        force: no_cache,
    };
    let report = ctx.orchestrator()?.rebuild(&options)?;

    if report.skipped {
        println!(
            "{} Cache is still valid, skipping rebuild of {}",
            "OK".green().bold(),
            report.output_dir.cyan()
        );
    } else if report.is_success() {
        println!(
            "{} Rebuild of {} completed in {:.2}s",
            "OK".green().bold(),
            report.output_dir.cyan(),
            report.elapsed.as_secs_f64()
        );
    } else {
        eprintln!(
            "{} Rebuild failed with status {}. Run with --verbose for the build output.",
            "FAILED".red().bold(),
            report.status
        );
    }

    Ok(report.status)
}
