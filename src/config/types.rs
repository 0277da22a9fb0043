// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Descriptor types for `pyproject.toml`.
//!
//! # Descriptor Structure
//!
//! ```text
//! [project]                         ProjectTable (static metadata, dynamic)
//! [tool.packsmith.version]          VersionSourceConfig (tagged by `source`)
//! [[tool.packsmith.metadata.hooks]] HookSpec
//! [tool.packsmith.build]            BuildTable (shared BuildRules + hooks)
//! [tool.packsmith.build.targets.X]  TargetTable (BuildRules overrides)
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::ConfigError;

/// Raw descriptor document as parsed from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawDescriptor {
    pub project: Option<ProjectTable>,
    pub tool: ToolTable,
}

/// `[tool]` table; only the `packsmith` key is consumed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ToolTable {
    pub packsmith: PacksmithTable,
}

/// `[tool.packsmith]` table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PacksmithTable {
    pub version: Option<VersionSourceConfig>,
    pub metadata: MetadataTable,
    pub build: BuildTable,
}

/// `[tool.packsmith.metadata]` table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetadataTable {
    pub hooks: Vec<HookSpec>,
}

/// `[project]` table (PEP 621 core metadata).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ProjectTable {
    pub name: String,
    pub version: Option<String>,
    pub dynamic: Vec<String>,
    pub description: Option<String>,
    pub readme: Option<ReadmeSpec>,
    pub requires_python: Option<String>,
    pub license: Option<LicenseSpec>,
    pub authors: Vec<Person>,
    pub maintainers: Vec<Person>,
    pub keywords: Vec<String>,
    pub classifiers: Vec<String>,
    pub urls: BTreeMap<String, String>,
    pub dependencies: Vec<String>,
    pub optional_dependencies: BTreeMap<String, Vec<String>>,
    pub scripts: BTreeMap<String, String>,
    pub gui_scripts: BTreeMap<String, String>,
    pub entry_points: BTreeMap<String, BTreeMap<String, String>>,
}

/// `readme` accepts a path or a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReadmeSpec {
    Path(PathBuf),
    Table {
        file: Option<PathBuf>,
        text: Option<String>,
        #[serde(rename = "content-type")]
        content_type: Option<String>,
    },
}

/// `license` accepts an SPDX expression or a `{ text }` / `{ file }` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LicenseSpec {
    Expression(String),
    Table {
        text: Option<String>,
        file: Option<PathBuf>,
    },
}

/// Author or maintainer entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Person {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Metadata fields that may be declared dynamic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetadataField {
    Version,
    Description,
    Readme,
    RequiresPython,
    License,
    Authors,
    Maintainers,
    Keywords,
    Classifiers,
    Urls,
    Dependencies,
    OptionalDependencies,
    Scripts,
    GuiScripts,
    EntryPoints,
}

impl MetadataField {
    /// Returns all fields in canonical order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Version,
            Self::Description,
            Self::Readme,
            Self::RequiresPython,
            Self::License,
            Self::Authors,
            Self::Maintainers,
            Self::Keywords,
            Self::Classifiers,
            Self::Urls,
            Self::Dependencies,
            Self::OptionalDependencies,
            Self::Scripts,
            Self::GuiScripts,
            Self::EntryPoints,
        ]
    }

    /// Returns the descriptor key for this field.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Version => "version",
            Self::Description => "description",
            Self::Readme => "readme",
            Self::RequiresPython => "requires-python",
            Self::License => "license",
            Self::Authors => "authors",
            Self::Maintainers => "maintainers",
            Self::Keywords => "keywords",
            Self::Classifiers => "classifiers",
            Self::Urls => "urls",
            Self::Dependencies => "dependencies",
            Self::OptionalDependencies => "optional-dependencies",
            Self::Scripts => "scripts",
            Self::GuiScripts => "gui-scripts",
            Self::EntryPoints => "entry-points",
        }
    }
}

impl std::fmt::Display for MetadataField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl std::str::FromStr for MetadataField {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|field| field.key() == s)
            .ok_or_else(|| ConfigError::InvalidValue {
                section: "project".to_string(),
                key: "dynamic".to_string(),
                message: format!("'{s}' cannot be declared dynamic"),
            })
    }
}

/// Version source block, tagged by `source`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "kebab-case", rename_all_fields = "kebab-case")]
pub enum VersionSourceConfig {
    /// Literal version.
    Static { version: String },
    /// Regex capture from a text file.
    Regex {
        path: PathBuf,
        #[serde(default)]
        pattern: Option<String>,
    },
    /// Expression evaluated against a module-like file.
    Code {
        path: PathBuf,
        #[serde(default = "default_expression")]
        expression: String,
    },
    /// Environment variable.
    Env {
        variable: String,
        #[serde(default)]
        default: Option<String>,
    },
    /// Nearest reachable git tag.
    Vcs {
        #[serde(default)]
        tag_pattern: Option<String>,
        #[serde(default)]
        fallback_version: Option<String>,
    },
}

fn default_expression() -> String {
    "__version__".to_string()
}

impl VersionSourceConfig {
    /// Returns the source name used in errors and provenance.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Static { .. } => "static",
            Self::Regex { .. } => "regex",
            Self::Code { .. } => "code",
            Self::Env { .. } => "env",
            Self::Vcs { .. } => "vcs",
        }
    }
}

/// A named hook declaration; extra keys are passed to the hook verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HookSpec {
    pub name: String,
    #[serde(default = "default_true")]
    pub enable_by_default: bool,
    #[serde(flatten)]
    pub config: toml::Table,
}

impl HookSpec {
    /// Creates a hook declaration with an empty configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enable_by_default: true,
            config: toml::Table::new(),
        }
    }

    /// Adds a configuration value.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<toml::Value>) -> Self {
        self.config.insert(key.to_string(), value.into());
        self
    }
}

const fn default_true() -> bool {
    true
}

/// Explicit source-to-archive mapping that bypasses pattern evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForceInclude {
    /// Source path, relative to the project root or absolute.
    pub source: PathBuf,
    /// Archive-relative destination path.
    pub path: String,
}

impl ForceInclude {
    pub fn new(source: impl Into<PathBuf>, path: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            path: path.into(),
        }
    }
}

/// File-selection rules shared by `[tool.packsmith.build]` and each target.
///
/// All fields are optional so a target can override field by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BuildRules {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub only_include: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packages: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_include: Option<Vec<ForceInclude>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_vcs: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_empty: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reproducible: Option<bool>,
}

/// `[tool.packsmith.build]` table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BuildTable {
    #[serde(flatten)]
    pub rules: BuildRules,
    /// Output directory relative to the project root.
    pub directory: Option<PathBuf>,
    /// Hooks applied to every target, before target hooks.
    pub hooks: Vec<HookSpec>,
    pub targets: BTreeMap<String, TargetTable>,
}

/// `[tool.packsmith.build.targets.<name>]` table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TargetTable {
    pub kind: Option<TargetKind>,
    #[serde(flatten)]
    pub rules: BuildRules,
    pub tag: Option<String>,
    pub infer_tag: Option<bool>,
    pub hooks: Vec<HookSpec>,
}

/// Archive family produced by a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Wheel,
    Sdist,
}

impl TargetKind {
    /// Infers the kind from a conventional target name.
    #[must_use]
    pub fn from_target_name(name: &str) -> Option<Self> {
        match name {
            "wheel" | "binary" => Some(Self::Wheel),
            "sdist" | "source" => Some(Self::Sdist),
            _ => None,
        }
    }
}

impl std::fmt::Display for TargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Wheel => write!(f, "wheel"),
            Self::Sdist => write!(f, "sdist"),
        }
    }
}

/// Resolved file-selection rules for one target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileRules {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub only_include: Vec<String>,
    pub packages: Vec<String>,
    pub artifacts: Vec<String>,
    pub force_include: Vec<ForceInclude>,
    pub ignore_vcs: bool,
    pub allow_empty: bool,
}

/// Fully merged configuration for one build target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetConfig {
    pub name: String,
    pub kind: TargetKind,
    pub rules: FileRules,
    pub reproducible: bool,
    pub tag: Option<String>,
    pub infer_tag: bool,
    pub hooks: Vec<HookSpec>,
}

impl TargetConfig {
    /// Creates a target with default rules and no hooks.
    pub fn new(name: impl Into<String>, kind: TargetKind) -> Self {
        Self {
            name: name.into(),
            kind,
            rules: FileRules::default(),
            reproducible: false,
            tag: None,
            infer_tag: false,
            hooks: Vec::new(),
        }
    }
}
