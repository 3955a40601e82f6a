//! Document-level settings addressed by their JSON key
//!
//! Keys are the kebab-case names of the document, archive settings are
//! reached through `archive.<key>`. Keyed lists (`require`, `blacklist`,
//! `abandoned`, `minimum-stability-per-package`) take `<package>=<value>`.

use std::fmt;
use std::str::FromStr;

use crate::archive::Archive;
use crate::configuration::{Abandoned, Configuration, PackageConstraint, PackageStability};
use crate::error::{Error, Result};

/// Stability flags accepted by `minimum-stability`.
pub const STABILITIES: [&str; 5] = ["stable", "RC", "beta", "alpha", "dev"];

/// A settable key of the `archive` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKey {
    Directory,
    Format,
    AbsoluteDirectory,
    PrefixUrl,
    SkipDev,
    Checksum,
    IgnoreFilters,
    OverrideDistType,
    Rearchive,
}

impl ArchiveKey {
    const ALL: [Self; 9] = [
        Self::Directory,
        Self::Format,
        Self::AbsoluteDirectory,
        Self::PrefixUrl,
        Self::SkipDev,
        Self::Checksum,
        Self::IgnoreFilters,
        Self::OverrideDistType,
        Self::Rearchive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Directory => "directory",
            Self::Format => "format",
            Self::AbsoluteDirectory => "absolute-directory",
            Self::PrefixUrl => "prefix-url",
            Self::SkipDev => "skip-dev",
            Self::Checksum => "checksum",
            Self::IgnoreFilters => "ignore-filters",
            Self::OverrideDistType => "override-dist-type",
            Self::Rearchive => "rearchive",
        }
    }
}

/// A settable key of the configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    Name,
    Description,
    Homepage,
    OutputDir,
    OutputHtml,
    IncludeFilename,
    TwigTemplate,
    NotifyBatch,
    MinimumStability,
    RequireAll,
    RequireDependencies,
    RequireDevDependencies,
    RequireDependencyFilter,
    Providers,
    ProvidersHistorySize,
    PrettyPrint,
    Require,
    Blacklist,
    Abandoned,
    MinimumStabilityPerPackage,
    Archive(ArchiveKey),
}

impl SettingKey {
    const DOCUMENT: [Self; 20] = [
        Self::Name,
        Self::Description,
        Self::Homepage,
        Self::OutputDir,
        Self::OutputHtml,
        Self::IncludeFilename,
        Self::TwigTemplate,
        Self::NotifyBatch,
        Self::MinimumStability,
        Self::RequireAll,
        Self::RequireDependencies,
        Self::RequireDevDependencies,
        Self::RequireDependencyFilter,
        Self::Providers,
        Self::ProvidersHistorySize,
        Self::PrettyPrint,
        Self::Require,
        Self::Blacklist,
        Self::Abandoned,
        Self::MinimumStabilityPerPackage,
    ];

    /// Every settable key, archive keys last.
    pub fn all() -> impl Iterator<Item = SettingKey> {
        Self::DOCUMENT
            .into_iter()
            .chain(ArchiveKey::ALL.into_iter().map(Self::Archive))
    }

    /// Whether the key holds a list keyed by package name.
    pub fn is_keyed_list(&self) -> bool {
        matches!(
            self,
            Self::Require | Self::Blacklist | Self::Abandoned | Self::MinimumStabilityPerPackage
        )
    }

    fn document_name(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Description => "description",
            Self::Homepage => "homepage",
            Self::OutputDir => "output-dir",
            Self::OutputHtml => "output-html",
            Self::IncludeFilename => "include-filename",
            Self::TwigTemplate => "twig-template",
            Self::NotifyBatch => "notify-batch",
            Self::MinimumStability => "minimum-stability",
            Self::RequireAll => "require-all",
            Self::RequireDependencies => "require-dependencies",
            Self::RequireDevDependencies => "require-dev-dependencies",
            Self::RequireDependencyFilter => "require-dependency-filter",
            Self::Providers => "providers",
            Self::ProvidersHistorySize => "providers-history-size",
            Self::PrettyPrint => "pretty-print",
            Self::Require => "require",
            Self::Blacklist => "blacklist",
            Self::Abandoned => "abandoned",
            Self::MinimumStabilityPerPackage => "minimum-stability-per-package",
            Self::Archive(_) => "archive",
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Archive(key) => write!(f, "archive.{}", key.as_str()),
            other => f.write_str(other.document_name()),
        }
    }
}

impl FromStr for SettingKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if let Some(archive) = s.strip_prefix("archive.") {
            return ArchiveKey::ALL
                .into_iter()
                .find(|key| key.as_str() == archive)
                .map(Self::Archive)
                .ok_or_else(|| Error::UnknownSetting { key: s.to_string() });
        }
        Self::DOCUMENT
            .into_iter()
            .find(|key| key.document_name() == s)
            .ok_or_else(|| Error::UnknownSetting { key: s.to_string() })
    }
}

impl Configuration {
    /// Assign `value` to `key`.
    ///
    /// Keyed lists replace the entry of the same package in place, or append
    /// a new one. An `abandoned` value without `=` marks the package
    /// abandoned without a replacement.
    pub fn set(&mut self, key: SettingKey, value: &str) -> Result<()> {
        let invalid = |reason: &str| Error::InvalidSetting {
            key: key.to_string(),
            reason: reason.to_string(),
        };

        match key {
            SettingKey::Name => self.name = value.to_string(),
            SettingKey::Description => self.description = value.to_string(),
            SettingKey::Homepage => self.homepage = value.to_string(),
            SettingKey::OutputDir => {
                if value.trim().is_empty() {
                    return Err(invalid("must not be empty"));
                }
                self.output_dir = value.to_string();
            }
            SettingKey::OutputHtml => self.output_html = parse_flag(key, value)?,
            SettingKey::IncludeFilename => self.include_filename = optional(value),
            SettingKey::TwigTemplate => self.twig_template = optional(value),
            SettingKey::NotifyBatch => self.notify_batch = optional(value),
            SettingKey::MinimumStability => {
                if !STABILITIES.contains(&value) {
                    return Err(invalid(&format!("expected one of {}", STABILITIES.join(", "))));
                }
                self.minimum_stability = Some(value.to_string());
            }
            SettingKey::RequireAll => self.require_all = parse_flag(key, value)?,
            SettingKey::RequireDependencies => self.require_dependencies = parse_flag(key, value)?,
            SettingKey::RequireDevDependencies => {
                self.require_dev_dependencies = parse_flag(key, value)?
            }
            SettingKey::RequireDependencyFilter => {
                self.require_dependency_filter = parse_flag(key, value)?
            }
            SettingKey::Providers => self.providers = parse_flag(key, value)?,
            SettingKey::ProvidersHistorySize => {
                let size = value
                    .parse()
                    .map_err(|_| invalid("expected a non-negative number"))?;
                self.providers_history_size = Some(size);
            }
            SettingKey::PrettyPrint => self.pretty_print = parse_flag(key, value)?,
            SettingKey::Require => {
                let (package, constraint) = split_pair(key, value)?;
                upsert(
                    &mut self.require,
                    PackageConstraint::new(package, constraint),
                    |c| &c.package,
                );
            }
            SettingKey::Blacklist => {
                let (package, constraint) = split_pair(key, value)?;
                upsert(
                    &mut self.blacklist,
                    PackageConstraint::new(package, constraint),
                    |c| &c.package,
                );
            }
            SettingKey::Abandoned => {
                let (package, replacement) = match value.split_once('=') {
                    Some((package, replacement)) => (package.trim(), optional(replacement.trim())),
                    None => (value.trim(), None),
                };
                if package.is_empty() {
                    return Err(invalid("expected <package>[=<replacement>]"));
                }
                upsert(
                    &mut self.abandoned,
                    Abandoned::new(package, replacement),
                    |a| &a.package,
                );
            }
            SettingKey::MinimumStabilityPerPackage => {
                let (package, stability) = split_pair(key, value)?;
                if !STABILITIES.contains(&stability) {
                    return Err(invalid(&format!("expected one of {}", STABILITIES.join(", "))));
                }
                upsert(
                    &mut self.minimum_stability_per_package,
                    PackageStability::new(package, stability),
                    |s| &s.package,
                );
            }
            SettingKey::Archive(archive) => set_archive(&mut self.archive, key, archive, value)?,
        }
        Ok(())
    }

    /// Reset `key` to its default.
    ///
    /// With a package, only that entry of a keyed list is removed. Returns
    /// whether the document changed.
    pub fn unset(&mut self, key: SettingKey, package: Option<&str>) -> Result<bool> {
        if package.is_some() && !key.is_keyed_list() {
            return Err(Error::InvalidSetting {
                key: key.to_string(),
                reason: "only keyed lists take a package".to_string(),
            });
        }

        let before = self.clone();
        let defaults = Configuration::default();
        match key {
            SettingKey::Name => self.name = defaults.name,
            SettingKey::Description => self.description = defaults.description,
            SettingKey::Homepage => self.homepage = defaults.homepage,
            SettingKey::OutputDir => self.output_dir = defaults.output_dir,
            SettingKey::OutputHtml => self.output_html = defaults.output_html,
            SettingKey::IncludeFilename => self.include_filename = defaults.include_filename,
            SettingKey::TwigTemplate => self.twig_template = defaults.twig_template,
            SettingKey::NotifyBatch => self.notify_batch = defaults.notify_batch,
            SettingKey::MinimumStability => self.minimum_stability = defaults.minimum_stability,
            SettingKey::RequireAll => self.require_all = defaults.require_all,
            SettingKey::RequireDependencies => {
                self.require_dependencies = defaults.require_dependencies
            }
            SettingKey::RequireDevDependencies => {
                self.require_dev_dependencies = defaults.require_dev_dependencies
            }
            SettingKey::RequireDependencyFilter => {
                self.require_dependency_filter = defaults.require_dependency_filter
            }
            SettingKey::Providers => self.providers = defaults.providers,
            SettingKey::ProvidersHistorySize => {
                self.providers_history_size = defaults.providers_history_size
            }
            SettingKey::PrettyPrint => self.pretty_print = defaults.pretty_print,
            SettingKey::Require => remove_entries(&mut self.require, package, |c| &c.package),
            SettingKey::Blacklist => remove_entries(&mut self.blacklist, package, |c| &c.package),
            SettingKey::Abandoned => remove_entries(&mut self.abandoned, package, |a| &a.package),
            SettingKey::MinimumStabilityPerPackage => {
                remove_entries(&mut self.minimum_stability_per_package, package, |s| &s.package)
            }
            SettingKey::Archive(archive) => unset_archive(&mut self.archive, archive),
        }
        Ok(*self != before)
    }
}

fn set_archive(archive: &mut Archive, key: SettingKey, field: ArchiveKey, value: &str) -> Result<()> {
    match field {
        ArchiveKey::Directory => archive.directory = value.to_string(),
        ArchiveKey::Format => archive.format = value.to_string(),
        ArchiveKey::AbsoluteDirectory => archive.absolute_directory = optional(value),
        ArchiveKey::PrefixUrl => archive.prefix_url = optional(value),
        ArchiveKey::SkipDev => archive.skip_dev = parse_flag(key, value)?,
        ArchiveKey::Checksum => archive.checksum = parse_flag(key, value)?,
        ArchiveKey::IgnoreFilters => archive.ignore_filters = parse_flag(key, value)?,
        ArchiveKey::OverrideDistType => archive.override_dist_type = parse_flag(key, value)?,
        ArchiveKey::Rearchive => archive.rearchive = parse_flag(key, value)?,
    }
    Ok(())
}

fn unset_archive(archive: &mut Archive, field: ArchiveKey) {
    let defaults = Archive::default();
    match field {
        ArchiveKey::Directory => archive.directory = defaults.directory,
        ArchiveKey::Format => archive.format = defaults.format,
        ArchiveKey::AbsoluteDirectory => archive.absolute_directory = defaults.absolute_directory,
        ArchiveKey::PrefixUrl => archive.prefix_url = defaults.prefix_url,
        ArchiveKey::SkipDev => archive.skip_dev = defaults.skip_dev,
        ArchiveKey::Checksum => archive.checksum = defaults.checksum,
        ArchiveKey::IgnoreFilters => archive.ignore_filters = defaults.ignore_filters,
        ArchiveKey::OverrideDistType => archive.override_dist_type = defaults.override_dist_type,
        ArchiveKey::Rearchive => archive.rearchive = defaults.rearchive,
    }
}

fn parse_flag(key: SettingKey, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(Error::InvalidSetting {
            key: key.to_string(),
            reason: format!("expected true or false, got '{value}'"),
        }),
    }
}

fn optional(value: &str) -> Option<String> {
    Some(value.to_string()).filter(|v| !v.is_empty())
}

fn split_pair(key: SettingKey, value: &str) -> Result<(&str, &str)> {
    value
        .split_once('=')
        .map(|(package, rest)| (package.trim(), rest.trim()))
        .filter(|(package, rest)| !package.is_empty() && !rest.is_empty())
        .ok_or_else(|| Error::InvalidSetting {
            key: key.to_string(),
            reason: format!("expected <package>=<value>, got '{value}'"),
        })
}

fn upsert<T>(list: &mut Vec<T>, entry: T, package: impl Fn(&T) -> &String) {
    match list.iter().position(|e| package(e) == package(&entry)) {
        Some(index) => list[index] = entry,
        None => list.push(entry),
    }
}

fn remove_entries<T>(list: &mut Vec<T>, only: Option<&str>, package: impl Fn(&T) -> &String) {
    match only {
        Some(name) => list.retain(|e| package(e) != name),
        None => list.clear(),
    }
}
