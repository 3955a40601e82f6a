//! Webhook replay

use std::path::Path;
use std::thread;

use repo_core::{PackageWebhookConsumer, build_channel};

use super::report_build;
use crate::context::AppContext;
use crate::error::{CliError, Result};

/// Run the webhook command
pub fn run_webhook(ctx: &AppContext, payload_file: &Path) -> Result<i32> {
    let content = std::fs::read_to_string(payload_file)
        .map_err(|e| CliError::read_input("payload", payload_file, e))?;
    let payload: serde_json::Value = serde_json::from_str(&content)?;

    let orchestrator = ctx.orchestrator()?;
    let (trigger, queue) = build_channel();
    let consumer =
        PackageWebhookConsumer::new(ctx.registry.clone(), trigger, &ctx.settings.lock_factory())?;
    let worker = thread::spawn(move || orchestrator.serve(queue));

    let result = consumer.consume(&payload).and_then(|pending| pending.wait());
    drop(consumer);
    worker
        .join()
        .map_err(|_| CliError::user("build worker panicked"))?;

    Ok(report_build(&result?))
}
