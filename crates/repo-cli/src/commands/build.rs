//! Streaming build

use colored::Colorize;
use repo_core::BuildOutput;

use crate::context::AppContext;
use crate::error::Result;

/// Run the build command, printing output as it arrives
pub fn run_build(ctx: &AppContext, repository: Option<&str>) -> Result<i32> {
    let orchestrator = ctx.orchestrator()?;
    let mut status = 1;

    for message in orchestrator.stream(repository) {
        match message {
            BuildOutput::CommandLine(line) => println!("{} {}", "$".dimmed(), line.dimmed()),
            BuildOutput::Line(line) => println!("{}", line),
            BuildOutput::Finished { status: code, text } => {
                status = code;
                if code == 0 {
                    println!("{}", text.green().bold());
                } else {
                    eprintln!("{}", text.red().bold());
                }
            }
        }
    }

    Ok(status)
}
