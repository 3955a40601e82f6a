//! Shared test utilities for the satis-manager workspace.
//!
//! Fixtures used by the crate test suites and the integration tests.
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`tool`]: fake build tool scripts standing in for the aggregator binary
//! - [`workspace`]: [`TestWorkspace`], a temp install root with config and lock dir

pub mod tool;
pub mod workspace;

pub use workspace::TestWorkspace;
