//! Build orchestration
//!
//! - [`CommandBuilder`]: argument vector of one build tool invocation
//! - [`BuildRequest`] and [`build_channel`]: explicit hand-off of build
//!   requests from mutators to the orchestrator
//! - [`BuildOrchestrator`]: runs builds one at a time under the `build` lock,
//!   synchronously, as a stream, or as a cache-aware full rebuild

mod command;
mod freshness;
mod orchestrator;
mod request;

pub use command::{BASE_OPTIONS, CommandBuilder};
pub use freshness::{ARTIFACT_FILE, is_fresh};
pub use orchestrator::{
    BUILD_LOCK, BuildOrchestrator, BuildOutput, BuildState, BuildStream, RebuildOptions,
    RebuildReport,
};
pub use request::{BuildQueue, BuildRequest, BuildTrigger, PendingBuild, build_channel};
