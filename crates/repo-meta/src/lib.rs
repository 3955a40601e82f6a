//! Configuration document model for the package repository manager.
//!
//! This crate holds the in-memory shape of the aggregator's JSON
//! configuration (`satis.json`) and its exact on-disk mapping:
//!
//! - [`Configuration`]: the singleton document
//! - [`Repository`] and [`RepositoryCollection`]: the insertion-ordered,
//!   identifier-keyed repository list
//! - [`Archive`]: the embedded archive settings
//! - [`PackageConstraint`], [`Abandoned`], [`PackageStability`]: keyed lists
//!   persisted as JSON objects
//! - [`SettingKey`]: document settings addressed by their JSON key

pub mod archive;
pub mod collection;
pub mod configuration;
pub mod error;
pub mod repository;
pub mod setting;

mod pairs;

pub use archive::Archive;
pub use collection::RepositoryCollection;
pub use configuration::{Abandoned, Configuration, PackageConstraint, PackageStability};
pub use error::{Error, Result};
pub use repository::{InstallationSource, Repository, RepositoryType, repository_id};
pub use setting::{ArchiveKey, STABILITIES, SettingKey};
