// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Built-in metadata hooks.
//!
//! ```text
//! fields        description = "..." , keywords = [...]      literal values
//! env           description = "DESC_VAR"                    value from captured env
//! readme        path = "README.md", content-type = "..."    file contents
//! requirements  files = ["requirements.txt"]                requirement lines
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use serde::Deserialize;
use tracing::debug;

use crate::config::types::{HookSpec, MetadataField};
use crate::error::Result;
use crate::hooks::registry::hook_config;

use super::{MetadataContext, MetadataDraft, MetadataHook, MetadataHookRegistry, Readme};

/// Adds every built-in metadata hook to `registry`.
pub fn register_all(registry: &mut MetadataHookRegistry) {
    registry.register(FieldsHook::NAME, |spec| {
        let hook: Arc<dyn MetadataHook> = Arc::new(FieldsHook::from_spec(spec)?);
        Ok(hook)
    });
    registry.register(EnvHook::NAME, |spec| {
        let hook: Arc<dyn MetadataHook> = Arc::new(EnvHook::from_spec(spec)?);
        Ok(hook)
    });
    registry.register(ReadmeHook::NAME, |spec| {
        let hook: Arc<dyn MetadataHook> = Arc::new(ReadmeHook {
            config: hook_config(spec)?,
        });
        Ok(hook)
    });
    registry.register(RequirementsHook::NAME, |spec| {
        let hook: Arc<dyn MetadataHook> = Arc::new(RequirementsHook {
            config: hook_config(spec)?,
        });
        Ok(hook)
    });
}

/// Parse every configuration key as a metadata field name.
fn keyed_by_field(spec: &HookSpec) -> Result<Vec<(MetadataField, toml::Value)>> {
    spec.config
        .iter()
        .map(|(key, value)| {
            let field = key
                .parse::<MetadataField>()
                .map_err(|_| anyhow::anyhow!("'{key}' is not a metadata field"))?;
            Ok((field, value.clone()))
        })
        .collect()
}

/// Sets fields to literal values from the hook configuration.
#[derive(Debug, Clone)]
pub struct FieldsHook {
    values: Vec<(MetadataField, toml::Value)>,
}

impl FieldsHook {
    pub const NAME: &'static str = "fields";

    /// # Errors
    ///
    /// Returns an error if a key is not a metadata field.
    pub fn from_spec(spec: &HookSpec) -> Result<Self> {
        Ok(Self {
            values: keyed_by_field(spec)?,
        })
    }
}

impl MetadataHook for FieldsHook {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn update(&self, _ctx: &MetadataContext<'_>, draft: &mut MetadataDraft) -> Result<()> {
        for (field, value) in &self.values {
            draft
                .set_value(*field, value.clone())
                .with_context(|| format!("invalid value for '{field}'"))?;
        }
        Ok(())
    }
}

/// Sets fields from variables of the captured environment.
///
/// Absent variables leave the field untouched. List-valued fields are split
/// on commas.
#[derive(Debug, Clone)]
pub struct EnvHook {
    variables: Vec<(MetadataField, String)>,
}

impl EnvHook {
    pub const NAME: &'static str = "env";

    /// # Errors
    ///
    /// Returns an error if a key is not a metadata field or a value is not a
    /// variable name.
    pub fn from_spec(spec: &HookSpec) -> Result<Self> {
        let variables = keyed_by_field(spec)?
            .into_iter()
            .map(|(field, value)| match value {
                toml::Value::String(name) => Ok((field, name)),
                other => anyhow::bail!("'{field}' must name a variable, got {}", other.type_str()),
            })
            .collect::<Result<_>>()?;
        Ok(Self { variables })
    }
}

const fn is_list_field(field: MetadataField) -> bool {
    matches!(
        field,
        MetadataField::Keywords | MetadataField::Classifiers | MetadataField::Dependencies
    )
}

impl MetadataHook for EnvHook {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn update(&self, ctx: &MetadataContext<'_>, draft: &mut MetadataDraft) -> Result<()> {
        for (field, variable) in &self.variables {
            let Some(raw) = ctx.settings.env(variable) else {
                debug!(%field, %variable, "Variable not set");
                continue;
            };
            let value = if is_list_field(*field) {
                toml::Value::Array(
                    raw.split(',')
                        .map(str::trim)
                        .filter(|item| !item.is_empty())
                        .map(|item| toml::Value::String(item.to_string()))
                        .collect(),
                )
            } else {
                toml::Value::String(raw.to_string())
            };
            draft
                .set_value(*field, value)
                .with_context(|| format!("invalid value for '{field}' from ${variable}"))?;
        }
        Ok(())
    }
}

/// Configuration keys of the `readme` hook.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ReadmeConfig {
    pub path: PathBuf,
    pub content_type: Option<String>,
}

/// Reads the long description from a file.
#[derive(Debug, Clone)]
pub struct ReadmeHook {
    config: ReadmeConfig,
}

impl ReadmeHook {
    pub const NAME: &'static str = "readme";
}

impl MetadataHook for ReadmeHook {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn update(&self, ctx: &MetadataContext<'_>, draft: &mut MetadataDraft) -> Result<()> {
        let readme = Readme::from_file(
            ctx.root,
            &self.config.path,
            self.config.content_type.as_deref(),
        )?;
        draft.set_readme(readme);
        Ok(())
    }
}

/// Configuration keys of the `requirements` hook.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct RequirementsConfig {
    pub files: Vec<PathBuf>,
    /// Optional-dependency groups, each read from its own files.
    pub optional: BTreeMap<String, Vec<PathBuf>>,
}

impl Default for RequirementsConfig {
    fn default() -> Self {
        Self {
            files: vec![PathBuf::from("requirements.txt")],
            optional: BTreeMap::new(),
        }
    }
}

/// Reads requirement lines from pip-style files.
#[derive(Debug, Clone)]
pub struct RequirementsHook {
    config: RequirementsConfig,
}

impl RequirementsHook {
    pub const NAME: &'static str = "requirements";
}

/// Requirement lines of `text`, without blanks, comments and option lines.
#[must_use]
pub fn parse_requirements(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.split_once(" #").map_or(line, |(req, _)| req).trim())
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('-'))
        .map(ToString::to_string)
        .collect()
}

fn read_requirements(root: &Path, files: &[PathBuf]) -> Result<Vec<String>> {
    let mut requirements = Vec::new();
    for file in files {
        let path = root.join(file);
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        requirements.extend(parse_requirements(&text));
    }
    Ok(requirements)
}

impl MetadataHook for RequirementsHook {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn update(&self, ctx: &MetadataContext<'_>, draft: &mut MetadataDraft) -> Result<()> {
        if !self.config.files.is_empty() {
            draft.set_dependencies(read_requirements(ctx.root, &self.config.files)?);
        }
        if !self.config.optional.is_empty() {
            let groups = self
                .config
                .optional
                .iter()
                .map(|(group, files)| Ok((group.clone(), read_requirements(ctx.root, files)?)))
                .collect::<Result<BTreeMap<_, _>>>()?;
            draft.set_optional_dependencies(groups);
        }
        Ok(())
    }
}
