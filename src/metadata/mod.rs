// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Core metadata resolution.
//!
//! ```text
//! [project] static fields ----+
//! ResolvedVersion ------------+--> MetadataDraft
//!                                      |
//!                  metadata hooks, declaration order (last writer wins)
//!                  each hook's touched fields must be declared dynamic
//!                                      |
//!                  every dynamic field must be set
//!                                      v
//!                               ResolvedMetadata (immutable)
//!                                      |
//!                    render::core_metadata()   METADATA / PKG-INFO
//!                    render::entry_points()    entry_points.txt
//! ```

pub mod builtin;
pub mod render;

#[cfg(test)]
mod tests;

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use anyhow::bail;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::types::{LicenseSpec, MetadataField, Person, ProjectTable, ReadmeSpec};
use crate::config::{BuildSettings, ProjectDescriptor};
use crate::error::{ConfigError, HookError, HookFailure, HookPhase, PackResult, Result};
use crate::hooks::Registry;
use crate::hooks::orchestrator::guarded;
use crate::logging::LogContext;
use crate::version::ResolvedVersion;

/// Long description with its media type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Readme {
    pub content: String,
    pub content_type: String,
}

impl Readme {
    /// Reads a readme file, deriving the content type from its extension
    /// unless one is given.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ReadError` if the file cannot be read and
    /// `ConfigError::InvalidValue` if no content type can be derived.
    pub fn from_file(
        root: &Path,
        file: &Path,
        content_type: Option<&str>,
    ) -> std::result::Result<Self, ConfigError> {
        let content_type = match content_type {
            Some(explicit) => explicit.to_string(),
            None => content_type_for(file)
                .ok_or_else(|| ConfigError::InvalidValue {
                    section: "project".to_string(),
                    key: "readme".to_string(),
                    message: format!(
                        "cannot determine the content type of '{}'",
                        file.display()
                    ),
                })?
                .to_string(),
        };
        let path = root.join(file);
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::ReadError {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self {
            content,
            content_type,
        })
    }
}

/// Media type implied by a readme file extension.
#[must_use]
pub fn content_type_for(file: &Path) -> Option<&'static str> {
    match file
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("md" | "markdown") => Some("text/markdown"),
        Some("rst") => Some("text/x-rst"),
        Some("txt") | None => Some("text/plain"),
        Some(_) => None,
    }
}

/// License as declared: an SPDX expression or full text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum License {
    Expression(String),
    Text(String),
}

/// Fully resolved core metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResolvedMetadata {
    pub name: String,
    pub version: String,
    pub description: Option<String>,
    pub readme: Option<Readme>,
    pub requires_python: Option<String>,
    pub license: Option<License>,
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

impl ResolvedMetadata {
    /// Whether `field` holds a non-empty value.
    #[must_use]
    pub fn is_set(&self, field: MetadataField) -> bool {
        match field {
            MetadataField::Version => !self.version.is_empty(),
            MetadataField::Description => self.description.as_ref().is_some_and(|d| !d.is_empty()),
            MetadataField::Readme => self.readme.as_ref().is_some_and(|r| !r.content.is_empty()),
            MetadataField::RequiresPython => {
                self.requires_python.as_ref().is_some_and(|r| !r.trim().is_empty())
            }
            MetadataField::License => self.license.as_ref().is_some_and(|license| match license {
                License::Expression(value) | License::Text(value) => !value.trim().is_empty(),
            }),
            MetadataField::Authors => !self.authors.is_empty(),
            MetadataField::Maintainers => !self.maintainers.is_empty(),
            MetadataField::Keywords => !self.keywords.is_empty(),
            MetadataField::Classifiers => !self.classifiers.is_empty(),
            MetadataField::Urls => !self.urls.is_empty(),
            MetadataField::Dependencies => !self.dependencies.is_empty(),
            MetadataField::OptionalDependencies => !self.optional_dependencies.is_empty(),
            MetadataField::Scripts => !self.scripts.is_empty(),
            MetadataField::GuiScripts => !self.gui_scripts.is_empty(),
            MetadataField::EntryPoints => !self.entry_points.is_empty(),
        }
    }
}

/// Dynamic `readme` value accepted by [`MetadataDraft::set_value`].
#[derive(Deserialize)]
#[serde(untagged)]
enum ReadmeValue {
    Text(String),
    Table {
        text: String,
        #[serde(rename = "content-type", default = "plain_text")]
        content_type: String,
    },
}

fn plain_text() -> String {
    "text/plain".to_string()
}

/// Dynamic `license` value accepted by [`MetadataDraft::set_value`].
#[derive(Deserialize)]
#[serde(untagged)]
enum LicenseValue {
    Expression(String),
    Table { text: String },
}

/// Mutable metadata record handed to metadata hooks.
///
/// `name` and `version` are read-only; every setter records the field as
/// touched.
#[derive(Debug, Clone)]
pub struct MetadataDraft {
    record: ResolvedMetadata,
    touched: BTreeSet<MetadataField>,
}

impl MetadataDraft {
    /// Draft seeded from static `[project]` fields.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if a referenced readme or license file cannot
    /// be read.
    pub fn from_project(
        root: &Path,
        project: &ProjectTable,
        version: &ResolvedVersion,
    ) -> std::result::Result<Self, ConfigError> {
        let readme = match &project.readme {
            None => None,
            Some(ReadmeSpec::Path(file)) => Some(Readme::from_file(root, file, None)?),
            Some(ReadmeSpec::Table {
                file: Some(file),
                content_type,
                ..
            }) => Some(Readme::from_file(root, file, content_type.as_deref())?),
            Some(ReadmeSpec::Table {
                file: None,
                text,
                content_type,
            }) => text.as_ref().map(|text| Readme {
                content: text.clone(),
                content_type: content_type.clone().unwrap_or_else(plain_text),
            }),
        };

        let license = match &project.license {
            None => None,
            Some(LicenseSpec::Expression(expr)) => Some(License::Expression(expr.clone())),
            Some(LicenseSpec::Table { text: Some(text), .. }) => Some(License::Text(text.clone())),
            Some(LicenseSpec::Table {
                file: Some(file), ..
            }) => {
                let path = root.join(file);
                let text = std::fs::read_to_string(&path).map_err(|source| {
                    ConfigError::ReadError {
                        path: path.display().to_string(),
                        source,
                    }
                })?;
                Some(License::Text(text))
            }
            Some(LicenseSpec::Table { .. }) => None,
        };

        Ok(Self {
            record: ResolvedMetadata {
                name: project.name.clone(),
                version: version.version.clone(),
                description: project.description.clone(),
                readme,
                requires_python: project.requires_python.clone(),
                license,
                authors: project.authors.clone(),
                maintainers: project.maintainers.clone(),
                keywords: project.keywords.clone(),
                classifiers: project.classifiers.clone(),
                urls: project.urls.clone(),
                dependencies: project.dependencies.clone(),
                optional_dependencies: project.optional_dependencies.clone(),
                scripts: project.scripts.clone(),
                gui_scripts: project.gui_scripts.clone(),
                entry_points: project.entry_points.clone(),
            },
            touched: BTreeSet::new(),
        })
    }

    /// Current values, including changes made by earlier hooks.
    #[must_use]
    pub const fn current(&self) -> &ResolvedMetadata {
        &self.record
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.record.name
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.record.version
    }

    fn touch(&mut self, field: MetadataField) {
        self.touched.insert(field);
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.touch(MetadataField::Description);
        self.record.description = Some(description.into());
    }

    pub fn set_readme(&mut self, readme: Readme) {
        self.touch(MetadataField::Readme);
        self.record.readme = Some(readme);
    }

    pub fn set_requires_python(&mut self, specifier: impl Into<String>) {
        self.touch(MetadataField::RequiresPython);
        self.record.requires_python = Some(specifier.into());
    }

    pub fn set_license(&mut self, license: License) {
        self.touch(MetadataField::License);
        self.record.license = Some(license);
    }

    pub fn set_authors(&mut self, authors: Vec<Person>) {
        self.touch(MetadataField::Authors);
        self.record.authors = authors;
    }

    pub fn set_maintainers(&mut self, maintainers: Vec<Person>) {
        self.touch(MetadataField::Maintainers);
        self.record.maintainers = maintainers;
    }

    pub fn set_keywords(&mut self, keywords: Vec<String>) {
        self.touch(MetadataField::Keywords);
        self.record.keywords = keywords;
    }

    pub fn set_classifiers(&mut self, classifiers: Vec<String>) {
        self.touch(MetadataField::Classifiers);
        self.record.classifiers = classifiers;
    }

    pub fn set_urls(&mut self, urls: BTreeMap<String, String>) {
        self.touch(MetadataField::Urls);
        self.record.urls = urls;
    }

    pub fn set_dependencies(&mut self, dependencies: Vec<String>) {
        self.touch(MetadataField::Dependencies);
        self.record.dependencies = dependencies;
    }

    pub fn set_optional_dependencies(&mut self, groups: BTreeMap<String, Vec<String>>) {
        self.touch(MetadataField::OptionalDependencies);
        self.record.optional_dependencies = groups;
    }

    pub fn set_scripts(&mut self, scripts: BTreeMap<String, String>) {
        self.touch(MetadataField::Scripts);
        self.record.scripts = scripts;
    }

    pub fn set_gui_scripts(&mut self, scripts: BTreeMap<String, String>) {
        self.touch(MetadataField::GuiScripts);
        self.record.gui_scripts = scripts;
    }

    pub fn set_entry_points(&mut self, groups: BTreeMap<String, BTreeMap<String, String>>) {
        self.touch(MetadataField::EntryPoints);
        self.record.entry_points = groups;
    }

    /// Set a field from a TOML value shaped like its `[project]` form.
    ///
    /// # Errors
    ///
    /// Returns an error if the value has the wrong shape or `field` is
    /// `version`.
    pub fn set_value(&mut self, field: MetadataField, value: toml::Value) -> Result<()> {
        match field {
            MetadataField::Version => bail!("'version' is owned by the version source"),
            MetadataField::Description => self.set_description(value.try_into::<String>()?),
            MetadataField::Readme => {
                let readme = match value.try_into::<ReadmeValue>()? {
                    ReadmeValue::Text(content) => Readme {
                        content,
                        content_type: plain_text(),
                    },
                    ReadmeValue::Table { text, content_type } => Readme {
                        content: text,
                        content_type,
                    },
                };
                self.set_readme(readme);
            }
            MetadataField::RequiresPython => self.set_requires_python(value.try_into::<String>()?),
            MetadataField::License => {
                let license = match value.try_into::<LicenseValue>()? {
                    LicenseValue::Expression(expr) => License::Expression(expr),
                    LicenseValue::Table { text } => License::Text(text),
                };
                self.set_license(license);
            }
            MetadataField::Authors => self.set_authors(value.try_into()?),
            MetadataField::Maintainers => self.set_maintainers(value.try_into()?),
            MetadataField::Keywords => self.set_keywords(value.try_into()?),
            MetadataField::Classifiers => self.set_classifiers(value.try_into()?),
            MetadataField::Urls => self.set_urls(value.try_into()?),
            MetadataField::Dependencies => self.set_dependencies(value.try_into()?),
            MetadataField::OptionalDependencies => self.set_optional_dependencies(value.try_into()?),
            MetadataField::Scripts => self.set_scripts(value.try_into()?),
            MetadataField::GuiScripts => self.set_gui_scripts(value.try_into()?),
            MetadataField::EntryPoints => self.set_entry_points(value.try_into()?),
        }
        Ok(())
    }

    /// Fields touched since the last call.
    fn take_touched(&mut self) -> BTreeSet<MetadataField> {
        std::mem::take(&mut self.touched)
    }

    fn finish(self) -> ResolvedMetadata {
        self.record
    }
}

/// Inputs available to metadata hooks.
#[derive(Debug, Clone)]
pub struct MetadataContext<'a> {
    pub root: &'a Path,
    pub settings: &'a BuildSettings,
    pub version: &'a ResolvedVersion,
    pub log: LogContext,
}

/// Extension that fills dynamic metadata fields.
pub trait MetadataHook: Send + Sync {
    fn name(&self) -> &str;

    /// Update the draft. Runs once per invocation.
    ///
    /// # Errors
    ///
    /// Any error aborts the build with a hook error.
    fn update(&self, ctx: &MetadataContext<'_>, draft: &mut MetadataDraft) -> Result<()>;
}

/// Registry of metadata hooks.
pub type MetadataHookRegistry = Registry<dyn MetadataHook>;

impl MetadataHookRegistry {
    /// Empty metadata-hook registry.
    #[must_use]
    pub fn new() -> Self {
        Self::empty("metadata", "tool.packsmith.metadata.hooks")
    }

    /// Registry pre-filled with the built-in metadata hooks.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        builtin::register_all(&mut registry);
        registry
    }
}

impl Default for MetadataHookRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Fields given a static value in `[project]`.
fn static_fields(project: &ProjectTable) -> BTreeSet<MetadataField> {
    let present = |field: MetadataField| match field {
        MetadataField::Version => project.version.is_some(),
        MetadataField::Description => project.description.is_some(),
        MetadataField::Readme => project.readme.is_some(),
        MetadataField::RequiresPython => project.requires_python.is_some(),
        MetadataField::License => project.license.is_some(),
        MetadataField::Authors => !project.authors.is_empty(),
        MetadataField::Maintainers => !project.maintainers.is_empty(),
        MetadataField::Keywords => !project.keywords.is_empty(),
        MetadataField::Classifiers => !project.classifiers.is_empty(),
        MetadataField::Urls => !project.urls.is_empty(),
        MetadataField::Dependencies => !project.dependencies.is_empty(),
        MetadataField::OptionalDependencies => !project.optional_dependencies.is_empty(),
        MetadataField::Scripts => !project.scripts.is_empty(),
        MetadataField::GuiScripts => !project.gui_scripts.is_empty(),
        MetadataField::EntryPoints => !project.entry_points.is_empty(),
    };
    MetadataField::all()
        .iter()
        .copied()
        .filter(|field| present(*field))
        .collect()
}

/// Resolve the project's core metadata.
///
/// # Errors
///
/// Returns a configuration error if a dynamic field also has a static
/// value, a hook touches a static field, or a dynamic field stays unset; a
/// hook error if a hook fails.
pub fn resolve_metadata(
    descriptor: &ProjectDescriptor,
    version: &ResolvedVersion,
    hooks: &[Arc<dyn MetadataHook>],
    settings: &BuildSettings,
) -> PackResult<ResolvedMetadata> {
    let statics = static_fields(descriptor.project());
    if let Some(field) = descriptor
        .dynamic()
        .iter()
        .find(|f| **f != MetadataField::Version && statics.contains(*f))
    {
        return Err(ConfigError::InvalidValue {
            section: "project".to_string(),
            key: field.key().to_string(),
            message: "listed in 'dynamic' but also given a static value".to_string(),
        }
        .into());
    }

    let mut draft = MetadataDraft::from_project(descriptor.root(), descriptor.project(), version)?;

    for hook in hooks {
        let name = hook.name();
        let mut log = LogContext::default();
        log.set_hook(name);
        let ctx = MetadataContext {
            root: descriptor.root(),
            settings,
            version,
            log,
        };
        debug!(hook = %name, phase = "metadata", "Running hook");

        guarded(|| hook.update(&ctx, &mut draft)).map_err(|message| {
            HookError::Metadata(HookFailure {
                hook: name.to_string(),
                phase: HookPhase::Metadata,
                message,
            })
        })?;

        if let Some(field) = draft
            .take_touched()
            .into_iter()
            .find(|f| !descriptor.is_dynamic(*f))
        {
            return Err(ConfigError::StaticFieldOverridden {
                field: field.key().to_string(),
                hook: name.to_string(),
            }
            .into());
        }
    }

    let record = draft.finish();
    if let Some(field) = descriptor.dynamic().iter().find(|f| !record.is_set(**f)) {
        return Err(ConfigError::UnresolvedMetadataField {
            field: field.key().to_string(),
        }
        .into());
    }

    info!(name = %record.name, version = %record.version, hooks = hooks.len(), "Resolved metadata");
    Ok(record)
}
