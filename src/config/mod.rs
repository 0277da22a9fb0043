// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Project configuration.
//!
//! # Sources
//!
//! ```text
//! pyproject.toml ----(toml + serde)----> ProjectDescriptor  (immutable, Arc-shared)
//!
//! Priority (low → high)                  BuildSettings      (per invocation)
//! 1. defaults
//! 2. packsmith.toml (optional)
//! 3. PACKSMITH_* / SOURCE_DATE_EPOCH (environment snapshot)
//! 4. CLI overrides
//! ```
//!
//! # Target Overrides
//!
//! ```toml
//! [tool.packsmith.build]
//! exclude = ["tests"]
//!
//! [tool.packsmith.build.targets.sdist]
//! exclude = []          # replaces the shared list for sdist only
//! ```

pub mod loader;
pub mod merge;
pub mod settings;
pub mod types;

#[cfg(test)]
mod tests;

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

pub use loader::SettingsLoader;
pub use settings::BuildSettings;
use types::{
    HookSpec, MetadataField, ProjectTable, RawDescriptor, TargetConfig, TargetTable,
    VersionSourceConfig,
};

/// Descriptor file name inside the project root.
pub const DESCRIPTOR_FILE: &str = "pyproject.toml";

/// Default output directory, relative to the project root.
pub const DEFAULT_OUTPUT_DIR: &str = "dist";

/// Validated, immutable project descriptor.
#[derive(Debug, Clone)]
pub struct ProjectDescriptor {
    root: PathBuf,
    text: String,
    project: ProjectTable,
    dynamic: BTreeSet<MetadataField>,
    version_source: VersionSourceConfig,
    metadata_hooks: Vec<HookSpec>,
    targets: BTreeMap<String, TargetConfig>,
    output_dir: PathBuf,
}

impl ProjectDescriptor {
    /// Load `pyproject.toml` from the given project root.
    ///
    /// A relative root is resolved against the working directory.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` when the descriptor is missing and any
    /// parse or validation error from [`ProjectDescriptor::parse`].
    pub fn load(root: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let root = root.as_ref();
        let root = std::path::absolute(root).map_err(|source| ConfigError::ReadError {
            path: root.display().to_string(),
            source,
        })?;
        let path = root.join(DESCRIPTOR_FILE);
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::ReadError {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(root, text)
    }

    /// Parse and validate descriptor text for the given project root.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is malformed, required keys are
    /// missing, or the version source does not agree with `project.dynamic`.
    pub fn parse(root: impl Into<PathBuf>, text: impl Into<String>) -> Result<Self, ConfigError> {
        let root = root.into();
        let text = text.into();
        let raw: RawDescriptor = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
            path: root.join(DESCRIPTOR_FILE).display().to_string(),
            message: e.message().to_string(),
        })?;

        let project = raw.project.ok_or_else(|| ConfigError::MissingKey {
            section: "project".to_string(),
            key: "name".to_string(),
        })?;
        validate_name(&project.name)?;

        let dynamic = project
            .dynamic
            .iter()
            .map(|field| field.parse::<MetadataField>())
            .collect::<Result<BTreeSet<_>, _>>()?;

        let tool = raw.tool.packsmith;
        let version_source = select_version_source(&project, &dynamic, tool.version)?;

        for hook in tool
            .metadata
            .hooks
            .iter()
            .chain(tool.build.hooks.iter())
            .chain(tool.build.targets.values().flat_map(|t| t.hooks.iter()))
        {
            if hook.name.trim().is_empty() {
                return Err(ConfigError::MissingKey {
                    section: "tool.packsmith hooks".to_string(),
                    key: "name".to_string(),
                });
            }
        }

        let targets = if tool.build.targets.is_empty() {
            ["sdist", "wheel"]
                .into_iter()
                .map(|name| {
                    merge::merge_target_config(name, &tool.build, &TargetTable::default())
                        .map(|cfg| (name.to_string(), cfg))
                })
                .collect::<Result<BTreeMap<_, _>, _>>()?
        } else {
            tool.build
                .targets
                .iter()
                .map(|(name, table)| {
                    merge::merge_target_config(name, &tool.build, table)
                        .map(|cfg| (name.clone(), cfg))
                })
                .collect::<Result<BTreeMap<_, _>, _>>()?
        };

        let output_dir = root.join(
            tool.build
                .directory
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
        );

        Ok(Self {
            root,
            text,
            project,
            dynamic,
            version_source,
            metadata_hooks: tool.metadata.hooks,
            targets,
            output_dir,
        })
    }

    /// Project root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Descriptor text exactly as read.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Project name as declared.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.project.name
    }

    /// Name normalized for comparison: lower-case, separator runs become `-`.
    #[must_use]
    pub fn normalized_name(&self) -> String {
        normalize_project_name(&self.project.name)
    }

    /// Name used in archive file names: normalized with `_` separators.
    #[must_use]
    pub fn dist_name(&self) -> String {
        self.normalized_name().replace('-', "_")
    }

    /// Static `[project]` table.
    #[must_use]
    pub const fn project(&self) -> &ProjectTable {
        &self.project
    }

    /// Fields declared in `project.dynamic`.
    #[must_use]
    pub const fn dynamic(&self) -> &BTreeSet<MetadataField> {
        &self.dynamic
    }

    #[must_use]
    pub fn is_dynamic(&self, field: MetadataField) -> bool {
        self.dynamic.contains(&field)
    }

    /// The single active version source.
    #[must_use]
    pub const fn version_source(&self) -> &VersionSourceConfig {
        &self.version_source
    }

    /// Metadata hooks in declaration order.
    #[must_use]
    pub fn metadata_hooks(&self) -> &[HookSpec] {
        &self.metadata_hooks
    }

    /// Resolved target configuration by name.
    #[must_use]
    pub fn target(&self, name: &str) -> Option<&TargetConfig> {
        self.targets.get(name)
    }

    /// Declared target names in sorted order.
    pub fn target_names(&self) -> impl Iterator<Item = &str> {
        self.targets.keys().map(String::as_str)
    }

    /// All resolved targets in sorted order.
    pub fn targets(&self) -> impl Iterator<Item = &TargetConfig> {
        self.targets.values()
    }

    /// Output directory declared by the descriptor (absolute under the root).
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

/// Collapse runs of `-`, `_` and `.` into `-` and lower-case the result.
pub(crate) fn normalize_project_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_separator = false;
    for c in name.chars() {
        if matches!(c, '-' | '_' | '.') {
            if !in_separator {
                out.push('-');
            }
            in_separator = true;
        } else {
            out.extend(c.to_lowercase());
            in_separator = false;
        }
    }
    out
}

fn validate_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::MissingKey {
            section: "project".to_string(),
            key: "name".to_string(),
        });
    }
    let bytes = name.as_bytes();
    let edge_ok = |b: u8| b.is_ascii_alphanumeric();
    let inner_ok = |b: u8| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-');
    let valid = edge_ok(bytes[0])
        && edge_ok(bytes[bytes.len() - 1])
        && bytes.iter().copied().all(inner_ok);
    if !valid {
        return Err(ConfigError::InvalidValue {
            section: "project".to_string(),
            key: "name".to_string(),
            message: format!("'{name}' is not a valid project name"),
        });
    }
    Ok(())
}

/// Pick the version source, enforcing that `version` is either static or
/// dynamic with a `[tool.packsmith.version]` block, never both.
fn select_version_source(
    project: &ProjectTable,
    dynamic: &BTreeSet<MetadataField>,
    declared: Option<VersionSourceConfig>,
) -> Result<VersionSourceConfig, ConfigError> {
    let is_dynamic = dynamic.contains(&MetadataField::Version);
    match (is_dynamic, project.version.as_ref(), declared) {
        (true, Some(_), _) => Err(ConfigError::InvalidValue {
            section: "project".to_string(),
            key: "version".to_string(),
            message: "version is declared dynamic but also set statically".to_string(),
        }),
        (true, None, Some(source)) => Ok(source),
        (true, None, None) => Err(ConfigError::MissingKey {
            section: "tool.packsmith.version".to_string(),
            key: "source".to_string(),
        }),
        (false, Some(version), None) => Ok(VersionSourceConfig::Static {
            version: version.clone(),
        }),
        (false, Some(_), Some(_)) => Err(ConfigError::InvalidValue {
            section: "tool.packsmith.version".to_string(),
            key: "source".to_string(),
            message: "a version source requires 'version' in project.dynamic".to_string(),
        }),
        (false, None, _) => Err(ConfigError::MissingKey {
            section: "project".to_string(),
            key: "version".to_string(),
        }),
    }
}
