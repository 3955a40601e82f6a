//! Locked build execution

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant, SystemTime};

use repo_fs::{LockFactory, NamedLock, io};
use repo_process::{LinePoll, ProcessRunner, exit_code_text};

use super::command::CommandBuilder;
use super::freshness::{ARTIFACT_FILE, is_fresh};
use super::request::{BuildQueue, BuildRequest};
use crate::settings::{DEFAULT_BINARY, DEFAULT_TIMEOUT_SECS, Settings};
use crate::store::ConfigStore;
use crate::Result;

/// Name of the lock serializing build processes.
pub const BUILD_LOCK: &str = "build";

/// Status reported for builds that could not run to an exit code.
const FAILURE_STATUS: i32 = 1;

/// How often a streaming producer checks whether its consumer went away.
const CANCEL_POLL: Duration = Duration::from_millis(50);

/// Lifecycle of one build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    Idle,
    LockAcquired,
    Running,
    Succeeded,
    Failed,
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::LockAcquired => "lock-acquired",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Options of a full rebuild.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebuildOptions {
    /// Overrides the document's `output-dir`.
    pub output_dir: Option<String>,
    /// Package names restricting the build, passed as trailing arguments.
    pub packages: Vec<String>,
    /// Keep output younger than this when the configuration did not change.
    pub lifetime: Option<Duration>,
    /// Skip the staleness check.
    pub force: bool,
}

/// Outcome of [`BuildOrchestrator::rebuild`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuildReport {
    pub skipped: bool,
    pub status: i32,
    pub output_dir: String,
    pub elapsed: Duration,
}

impl RebuildReport {
    pub fn is_success(&self) -> bool {
        self.status == 0
    }
}

/// One message of a streamed build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutput {
    /// The resolved command line, always first when the process started.
    CommandLine(String),
    /// A trimmed, non-empty output line.
    Line(String),
    /// Terminal message: exit status and its description.
    Finished { status: i32, text: String },
}

/// Output of a build running on a producer thread.
///
/// Ends with exactly one [`BuildOutput::Finished`]. Dropping the stream early
/// kills the process and releases the build lock.
#[derive(Debug)]
pub struct BuildStream {
    receiver: Receiver<BuildOutput>,
    cancel: Arc<AtomicBool>,
}

impl Iterator for BuildStream {
    type Item = BuildOutput;

    fn next(&mut self) -> Option<BuildOutput> {
        self.receiver.recv().ok()
    }
}

impl Drop for BuildStream {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::Release);
    }
}

/// Runs the build tool, one process at a time.
///
/// Every entry point takes the `build` lock in blocking mode, so concurrent
/// requests queue up instead of failing. Execution failures never escape as
/// errors from [`BuildOrchestrator::on_build`]; they are reported as status
/// `1` on the request.
pub struct BuildOrchestrator {
    store: Arc<ConfigStore>,
    runner: Arc<dyn ProcessRunner>,
    lock: NamedLock,
    root: PathBuf,
    config_file: String,
    binary: String,
    timeout: Option<Duration>,
}

impl fmt::Debug for BuildOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildOrchestrator")
            .field("lock", &self.lock)
            .field("root", &self.root)
            .field("config_file", &self.config_file)
            .field("binary", &self.binary)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl BuildOrchestrator {
    pub fn new(
        store: Arc<ConfigStore>,
        runner: Arc<dyn ProcessRunner>,
        locks: &LockFactory,
    ) -> Result<Self> {
        let config_file = store.path().to_string_lossy().into_owned();
        Ok(Self {
            store,
            runner,
            lock: locks.create_lock(BUILD_LOCK)?,
            root: PathBuf::new(),
            config_file,
            binary: DEFAULT_BINARY.to_string(),
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        })
    }

    /// Orchestrator running the real build tool as described by `settings`.
    pub fn from_settings(settings: &Settings, store: Arc<ConfigStore>) -> Result<Self> {
        let runner: Arc<dyn ProcessRunner> = Arc::new(settings.process_factory());
        Ok(Self::new(store, runner, &settings.lock_factory())?
            .with_root(&settings.root)
            .with_binary(settings.binary.clone())
            .with_timeout(settings.build_timeout))
    }

    /// Directory relative output directories are resolved against.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    /// Command building `repository`, or everything when `None`, into the
    /// document's output directory.
    pub fn command(&self, repository: Option<&str>) -> Result<Vec<String>> {
        let output_dir = self.store.load()?.output_dir;
        self.command_for(&output_dir, repository, &[])
    }

    fn command_for(
        &self,
        output_dir: &str,
        repository: Option<&str>,
        extra_args: &[String],
    ) -> Result<Vec<String>> {
        let mut builder = CommandBuilder::from(self.config_file.as_str(), output_dir)
            .with_binary(self.binary.as_str())
            .add_args(extra_args.iter().cloned());
        if let Some(name) = repository {
            builder = builder.with_repository(name);
        }

        let command = builder.build();
        tracing::info!("{}", serde_json::to_string(&command)?);
        Ok(command)
    }

    /// Run the build described by `request` and record its status.
    pub fn on_build(&self, request: &mut BuildRequest) {
        let status = match self.command(request.repository()) {
            Ok(command) => self.execute(command),
            Err(e) => {
                tracing::warn!(id = %request.id(), error = %e, "could not prepare build");
                FAILURE_STATUS
            }
        };
        request.set_status(status);
    }

    /// Handle queued requests until every trigger is dropped.
    pub fn serve(&self, queue: BuildQueue) {
        tracing::debug!("build queue open");
        for queued in queue.receiver.iter() {
            let mut request = queued.request;
            self.on_build(&mut request);
            // the requester may have stopped waiting
            let _ = queued.reply.send(request);
        }
        tracing::debug!("build queue closed");
    }

    /// Start a build on a producer thread and stream its output.
    pub fn stream(&self, repository: Option<&str>) -> BuildStream {
        let (sender, receiver) = mpsc::channel();
        let cancel = Arc::new(AtomicBool::new(false));
        let producer = Producer {
            runner: Arc::clone(&self.runner),
            lock: self.lock.clone(),
            timeout: self.timeout,
            sender,
            cancel: Arc::clone(&cancel),
        };

        match self.command(repository) {
            Ok(command) => {
                thread::spawn(move || producer.run(command));
            }
            Err(e) => producer.finish(FAILURE_STATUS, e.to_string()),
        }

        BuildStream { receiver, cancel }
    }

    /// Rebuild everything, or the packages named in `options`.
    ///
    /// With a lifetime and an existing configuration file, output that is
    /// newer than the configuration and younger than the lifetime is kept and
    /// the build tool does not run, unless `force` is set.
    pub fn rebuild(&self, options: &RebuildOptions) -> Result<RebuildReport> {
        let started = Instant::now();
        let output_dir = match &options.output_dir {
            Some(dir) => dir.clone(),
            None => self.store.load()?.output_dir,
        };

        if !options.force && self.output_is_fresh(&output_dir, options.lifetime)? {
            tracing::info!(output_dir = %output_dir, "cache is still valid, skipping rebuild");
            return Ok(RebuildReport {
                skipped: true,
                status: 0,
                output_dir,
                elapsed: started.elapsed(),
            });
        }

        let command = self.command_for(&output_dir, None, &options.packages)?;
        let status = self.execute(command);

        Ok(RebuildReport {
            skipped: false,
            status,
            output_dir,
            elapsed: started.elapsed(),
        })
    }

    fn output_is_fresh(&self, output_dir: &str, lifetime: Option<Duration>) -> Result<bool> {
        let Some(lifetime) = lifetime.filter(|l| !l.is_zero()) else {
            return Ok(false);
        };
        let Some(config_modified) = io::modified_time(self.store.path())? else {
            return Ok(false);
        };
        let artifact = self.resolve(output_dir).join(ARTIFACT_FILE);
        let artifact_modified = io::modified_time(&artifact)?;

        Ok(is_fresh(
            config_modified,
            artifact_modified,
            lifetime,
            SystemTime::now(),
        ))
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(Path::new(path))
    }

    /// Run `command` under the build lock and return its status.
    fn execute(&self, command: Vec<String>) -> i32 {
        transition(BuildState::Idle, BuildState::LockAcquired);
        let guard = match self.lock.acquire_blocking() {
            Ok(guard) => guard,
            Err(e) => {
                tracing::warn!(error = %e, "could not acquire build lock");
                transition(BuildState::Idle, BuildState::Failed);
                return FAILURE_STATUS;
            }
        };

        transition(BuildState::LockAcquired, BuildState::Running);
        let status = match self.runner.run(command, self.timeout) {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!(error = %e, "build failed to run");
                FAILURE_STATUS
            }
        };
        guard.release();

        let outcome = if status == 0 {
            BuildState::Succeeded
        } else {
            BuildState::Failed
        };
        transition(BuildState::Running, outcome);
        tracing::info!(status, text = exit_code_text(status), "build finished");
        transition(outcome, BuildState::Idle);
        status
    }
}

fn transition(from: BuildState, to: BuildState) {
    tracing::debug!(%from, %to, "build state");
}

/// State moved onto the producer thread of a [`BuildStream`].
struct Producer {
    runner: Arc<dyn ProcessRunner>,
    lock: NamedLock,
    timeout: Option<Duration>,
    sender: Sender<BuildOutput>,
    cancel: Arc<AtomicBool>,
}

impl Producer {
    fn run(self, command: Vec<String>) {
        let guard = match self.lock.acquire_blocking() {
            Ok(guard) => guard,
            Err(e) => return self.finish(FAILURE_STATUS, e.to_string()),
        };
        if self.cancelled() {
            tracing::debug!("build stream dropped while queued");
            return;
        }

        let mut output = match self.runner.start(command, self.timeout) {
            Ok(output) => output,
            Err(e) => return self.finish(FAILURE_STATUS, e.to_string()),
        };

        // returning early drops the output before the guard, which kills
        // the process first and then frees the lock
        if !self.send(BuildOutput::CommandLine(output.command_line().to_string())) {
            return;
        }
        loop {
            if self.cancelled() {
                tracing::info!("build stream dropped, stopping the build");
                return;
            }
            match output.poll_line(CANCEL_POLL) {
                LinePoll::Line(line) => {
                    if !self.send(BuildOutput::Line(line)) {
                        tracing::debug!("build stream consumer went away");
                        return;
                    }
                }
                LinePoll::Pending => {}
                LinePoll::Done => break,
            }
        }

        let (status, text) = match output.wait() {
            Ok(status) => (status, exit_code_text(status).to_string()),
            Err(e) => (FAILURE_STATUS, e.to_string()),
        };
        guard.release();
        self.finish(status, text);
    }

    fn send(&self, message: BuildOutput) -> bool {
        self.sender.send(message).is_ok()
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }

    fn finish(&self, status: i32, text: String) {
        tracing::info!(status, text = %text, "streamed build finished");
        self.send(BuildOutput::Finished { status, text });
    }
}
