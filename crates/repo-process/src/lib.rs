//! External build process execution for the package repository manager
//!
//! This crate launches the wrapped build tool as a child process:
//!
//! - [`EnvironmentBuilder`] computes the environment handed to the child
//! - [`ProcessFactory`] turns an argument vector into a configured [`Process`]
//! - [`RunningProcess`] streams trimmed output lines and enforces the timeout
//! - [`ProcessRunner`] is the seam the build orchestrator depends on, so
//!   tests can substitute an instrumented runner

pub mod env;
pub mod error;
pub mod process;
pub mod runner;

pub use env::EnvironmentBuilder;
pub use error::{Error, Result};
pub use process::{Process, ProcessFactory, RunningProcess, exit_code_text, trim_line};
pub use runner::{LinePoll, OutputStream, ProcessRunner};
