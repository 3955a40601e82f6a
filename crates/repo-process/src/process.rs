//! Process creation, supervision and output streaming

use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use crate::env::EnvironmentBuilder;
use crate::error::{Error, Result};
use crate::runner::LinePoll;

/// How often a process whose pipes are closed is polled for exit
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Characters stripped from both ends of every output line
const TRIM_CHARS: &[char] = &[' ', '\t', '\n', '\r', '\0', '\x0B', '\x08'];

/// Strip whitespace, NUL, vertical tab and backspace from both ends.
pub fn trim_line(line: &str) -> &str {
    line.trim_matches(TRIM_CHARS)
}

/// Human readable text for a process exit code.
pub fn exit_code_text(code: i32) -> &'static str {
    match code {
        0 => "OK",
        1 => "General error",
        2 => "Misuse of shell builtins",
        126 => "Invoked command cannot execute",
        127 => "Command not found",
        128 => "Invalid exit argument",
        129 => "Hangup",
        130 => "Interrupt",
        131 => "Quit and dump core",
        132 => "Illegal instruction",
        133 => "Trace/breakpoint trap",
        134 => "Process aborted",
        135 => "Bus error: \"access to undefined portion of memory object\"",
        136 => "Floating point exception: \"erroneous arithmetic operation\"",
        137 => "Kill (terminate immediately)",
        138 => "User-defined 1",
        139 => "Segmentation violation",
        140 => "User-defined 2",
        141 => "Write to pipe with no one reading",
        142 => "Signal raised by alarm",
        143 => "Termination (request to terminate)",
        145 => "Child process terminated, stopped (or continued*)",
        146 => "Continue if stopped",
        147 => "Stop executing temporarily",
        148 => "Terminal stop signal",
        149 => "Background process attempting to read from tty (\"in\")",
        150 => "Background process attempting to write to tty (\"out\")",
        151 => "Urgent data available on socket",
        152 => "CPU time limit exceeded",
        153 => "File size limit exceeded",
        154 => "Signal raised by timer counting virtual time: \"virtual timer expired\"",
        155 => "Profiling timer expired",
        157 => "Pollable event",
        159 => "Bad syscall",
        _ => "Unknown error",
    }
}

/// Creates processes rooted at the build tool's install directory.
#[derive(Debug, Clone)]
pub struct ProcessFactory {
    root: PathBuf,
    env: EnvironmentBuilder,
}

impl ProcessFactory {
    pub fn new(root: impl Into<PathBuf>, env: EnvironmentBuilder) -> Self {
        Self {
            root: root.into(),
            env,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Configure a process for `command`.
    ///
    /// The first token is resolved against the root path, which is also the
    /// working directory. `None` disables the timeout.
    pub fn create(&self, command: Vec<String>, timeout: Option<Duration>) -> Result<Process> {
        let mut tokens = command.into_iter();
        let first = tokens.next().ok_or(Error::InvalidCommand)?;

        Ok(Process {
            program: self.root.join(first),
            args: tokens.collect(),
            working_dir: self.root.clone(),
            env: self.env.get_env(),
            timeout,
        })
    }
}

/// A configured, not yet started process. Stdin is always closed.
#[derive(Debug, Clone)]
pub struct Process {
    program: PathBuf,
    args: Vec<String>,
    working_dir: PathBuf,
    env: BTreeMap<String, String>,
    timeout: Option<Duration>,
}

impl Process {
    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// The command line as a shell would need it quoted.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.to_string_lossy().into_owned())
            .chain(self.args.iter().cloned())
            .map(|arg| escape_argument(&arg))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run to completion and return the exit code.
    ///
    /// Output is consumed and logged at debug level.
    pub fn run(&self) -> Result<i32> {
        let mut running = self.start()?;
        for line in running.by_ref() {
            tracing::debug!(target: "build_output", "{}", line);
        }
        running.wait()
    }

    /// Start the process and stream its output.
    pub fn start(&self) -> Result<RunningProcess> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.working_dir)
            .env_clear()
            .envs(&self.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| Error::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let (sender, lines) = mpsc::channel();
        if let Some(stdout) = child.stdout.take() {
            spawn_reader(stdout, sender.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_reader(stderr, sender);
        }

        let command_line = self.command_line();
        tracing::info!(command = %command_line, pid = child.id(), "process started");

        Ok(RunningProcess {
            child,
            lines,
            deadline: self.timeout.map(|t| Instant::now() + t),
            timeout: self.timeout,
            command_line,
            timed_out: false,
            drained: false,
        })
    }
}

/// Forward trimmed, non-empty lines of `pipe` into the channel.
fn spawn_reader<R: Read + Send + 'static>(pipe: R, sender: Sender<String>) {
    thread::spawn(move || {
        let mut reader = BufReader::new(pipe);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    let line = trim_line(&line);
                    if line.is_empty() {
                        continue;
                    }
                    if sender.send(line.to_string()).is_err() {
                        break;
                    }
                }
            }
        }
    });
}

fn escape_argument(arg: &str) -> String {
    if arg.is_empty() {
        return "\"\"".to_string();
    }
    format!("'{}'", arg.replace('\'', "'\\''"))
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

/// A started process.
///
/// Iterating yields trimmed, non-empty output lines (stdout and stderr
/// interleaved in arrival order) until the process closes its pipes or the
/// timeout expires. [`RunningProcess::wait`] then delivers the final status.
/// A process still alive when this handle is dropped is killed.
#[derive(Debug)]
pub struct RunningProcess {
    child: Child,
    lines: Receiver<String>,
    deadline: Option<Instant>,
    timeout: Option<Duration>,
    command_line: String,
    timed_out: bool,
    drained: bool,
}

impl RunningProcess {
    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Wait for the process to exit, consuming any unread output.
    ///
    /// Fails with [`Error::TimedOut`] if the timeout expired.
    pub fn wait(mut self) -> Result<i32> {
        while self.next().is_some() {}

        loop {
            if self.timed_out {
                return Err(self.timed_out_error());
            }
            if let Some(status) = self.child.try_wait()? {
                let code = exit_code(status);
                tracing::info!(command = %self.command_line, code, "process exited");
                return Ok(code);
            }
            if self.deadline.is_some_and(|d| Instant::now() >= d) {
                self.expire();
                continue;
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    /// Wait at most `wait` for the next line, never past the timeout.
    pub fn poll_line(&mut self, wait: Duration) -> LinePoll {
        self.receive(Some(wait))
    }

    /// Receive one line, bounded by `wait` when given and by the deadline.
    fn receive(&mut self, wait: Option<Duration>) -> LinePoll {
        if self.drained {
            return LinePoll::Done;
        }

        let remaining = self
            .deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()));
        if remaining.is_some_and(|r| r.is_zero()) {
            self.expire();
            return LinePoll::Done;
        }
        let limit = match (wait, remaining) {
            (Some(wait), Some(remaining)) => Some(wait.min(remaining)),
            (wait, remaining) => wait.or(remaining),
        };

        let received = match limit {
            Some(limit) => self.lines.recv_timeout(limit),
            None => self.lines.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(line) => LinePoll::Line(line),
            Err(RecvTimeoutError::Timeout) => {
                if self.deadline.is_some_and(|d| Instant::now() >= d) {
                    self.expire();
                    LinePoll::Done
                } else {
                    LinePoll::Pending
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                self.drained = true;
                LinePoll::Done
            }
        }
    }

    fn expire(&mut self) {
        tracing::warn!(command = %self.command_line, "process timed out, killing it");
        let _ = self.child.kill();
        let _ = self.child.wait();
        self.timed_out = true;
        self.drained = true;
    }

    fn timed_out_error(&self) -> Error {
        Error::TimedOut {
            command: self.command_line.clone(),
            timeout: self.timeout.unwrap_or_default(),
        }
    }
}

impl Iterator for RunningProcess {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            match self.receive(None) {
                LinePoll::Line(line) => return Some(line),
                LinePoll::Done => return None,
                LinePoll::Pending => continue,
            }
        }
    }
}

impl Drop for RunningProcess {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn factory(root: &str) -> ProcessFactory {
        let env = EnvironmentBuilder::new("/var/composer")
            .with_snapshot(Vec::<String>::new())
            .with_secondary([("A", "B")]);
        ProcessFactory::new(root, env)
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn create_returns_configured_process() {
        let process = factory("/root")
            .create(strings(&["bin/tool", "arg1", "arg2"]), Some(Duration::from_secs(123)))
            .unwrap();

        assert_eq!(process.command_line(), "'/root/bin/tool' 'arg1' 'arg2'");
        assert_eq!(process.working_dir(), Path::new("/root"));
        assert_eq!(process.env()["A"], "B");
        assert_eq!(process.env()["COMPOSER_NO_INTERACTION"], "1");
        assert_eq!(process.timeout(), Some(Duration::from_secs(123)));
    }

    #[test]
    fn create_rejects_empty_command() {
        let result = factory("/root").create(Vec::new(), None);
        assert!(matches!(result, Err(Error::InvalidCommand)));
    }

    #[test]
    fn command_is_prefixed_with_root_path() {
        let process = factory("/abc").create(strings(&["vendor/bin/satis"]), None).unwrap();
        assert_eq!(process.command_line(), "'/abc/vendor/bin/satis'");
        assert_eq!(process.timeout(), None);
    }

    #[rstest]
    #[case("plain", "'plain'")]
    #[case("it's", "'it'\\''s'")]
    #[case("", "\"\"")]
    fn escapes_arguments(#[case] arg: &str, #[case] expected: &str) {
        assert_eq!(escape_argument(arg), expected);
    }

    #[rstest]
    #[case("  line \r\n", "line")]
    #[case("\x08\x0Bvalue\0", "value")]
    #[case(" \t ", "")]
    fn trims_output_lines(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(trim_line(raw), expected);
    }

    #[test]
    fn exit_code_texts() {
        assert_eq!(exit_code_text(0), "OK");
        assert_eq!(exit_code_text(127), "Command not found");
        assert_eq!(exit_code_text(4242), "Unknown error");
    }
}
