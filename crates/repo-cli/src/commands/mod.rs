//! Command implementations for satisctl
//!
//! Every command returns the process exit code on success.

pub mod build;
pub mod config;
pub mod import;
pub mod rebuild;
pub mod repository;
pub mod webhook;

pub use build::run_build;
pub use config::{run_config_set, run_config_show, run_config_unset};
pub use import::run_import_lock;
pub use rebuild::run_rebuild;
pub use repository::{run_repo_add, run_repo_list, run_repo_remove, run_repo_show, run_repo_update};
pub use webhook::run_webhook;

use colored::Colorize;
use repo_core::BuildRequest;

/// Print the outcome of a queued build and turn it into an exit code.
pub(crate) fn report_build(request: &BuildRequest) -> i32 {
    let status = request.status().unwrap_or(1);
    let scope = request.repository().unwrap_or("all repositories");
    if status == 0 {
        println!("{} Built {}", "OK".green().bold(), scope.cyan());
    } else {
        eprintln!(
            "{} Build of {} exited with status {}",
            "FAILED".red().bold(),
            scope.cyan(),
            status
        );
    }
    status
}
