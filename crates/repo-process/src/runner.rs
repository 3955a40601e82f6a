//! Trait seam between build orchestration and real process execution

use std::time::Duration;

use crate::error::Result;
use crate::process::{ProcessFactory, RunningProcess};

/// Runs external commands on behalf of the build orchestrator.
pub trait ProcessRunner: Send + Sync {
    /// Run `command` to completion and return its exit code.
    fn run(&self, command: Vec<String>, timeout: Option<Duration>) -> Result<i32>;

    /// Start `command` and stream its output.
    fn start(&self, command: Vec<String>, timeout: Option<Duration>)
    -> Result<Box<dyn OutputStream>>;
}

/// Result of waiting a bounded time for the next output line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinePoll {
    Line(String),
    /// Nothing arrived in time, the command is still running.
    Pending,
    /// The output is exhausted or the timeout expired.
    Done,
}

/// Output lines of a started command, followed by its exit code.
///
/// Dropping a stream before [`OutputStream::wait`] stops the command.
pub trait OutputStream: Iterator<Item = String> + Send {
    fn command_line(&self) -> &str;

    /// Wait at most `wait` for the next line.
    ///
    /// The default blocks like [`Iterator::next`]; streams over real
    /// processes return [`LinePoll::Pending`] while the process stays quiet.
    fn poll_line(&mut self, wait: Duration) -> LinePoll {
        let _ = wait;
        match self.next() {
            Some(line) => LinePoll::Line(line),
            None => LinePoll::Done,
        }
    }

    /// Consume remaining output and wait for the exit code.
    fn wait(self: Box<Self>) -> Result<i32>;
}

impl ProcessRunner for ProcessFactory {
    fn run(&self, command: Vec<String>, timeout: Option<Duration>) -> Result<i32> {
        self.create(command, timeout)?.run()
    }

    fn start(
        &self,
        command: Vec<String>,
        timeout: Option<Duration>,
    ) -> Result<Box<dyn OutputStream>> {
        Ok(Box::new(self.create(command, timeout)?.start()?))
    }
}

impl OutputStream for RunningProcess {
    fn command_line(&self) -> &str {
        RunningProcess::command_line(self)
    }

    fn poll_line(&mut self, wait: Duration) -> LinePoll {
        RunningProcess::poll_line(self, wait)
    }

    fn wait(self: Box<Self>) -> Result<i32> {
        RunningProcess::wait(*self)
    }
}
