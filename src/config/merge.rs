// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Target configuration merging.
//!
//! ```text
//! BuildTable.rules + TargetTable.rules --> field-by-field merge
//! BuildTable.hooks ++ TargetTable.hooks --> ordered hook list
//! ```
//!
//! Only explicitly set fields (`Some`) in the target replace shared values.

use crate::error::ConfigError;

use super::types::{BuildRules, BuildTable, FileRules, TargetConfig, TargetKind, TargetTable};

/// Merge target-specific rules over the shared build rules.
///
/// Only explicitly set fields (Some values) in the override take precedence.
pub(super) fn merge_rules(base: &BuildRules, override_rules: &BuildRules) -> BuildRules {
    BuildRules {
        include: override_rules
            .include
            .clone()
            .or_else(|| base.include.clone()),
        exclude: override_rules
            .exclude
            .clone()
            .or_else(|| base.exclude.clone()),
        only_include: override_rules
            .only_include
            .clone()
            .or_else(|| base.only_include.clone()),
        packages: override_rules
            .packages
            .clone()
            .or_else(|| base.packages.clone()),
        artifacts: override_rules
            .artifacts
            .clone()
            .or_else(|| base.artifacts.clone()),
        force_include: override_rules
            .force_include
            .clone()
            .or_else(|| base.force_include.clone()),
        ignore_vcs: override_rules.ignore_vcs.or(base.ignore_vcs),
        allow_empty: override_rules.allow_empty.or(base.allow_empty),
        reproducible: override_rules.reproducible.or(base.reproducible),
    }
}

/// Build the resolved configuration for one target.
///
/// # Errors
///
/// Returns `ConfigError::MissingKey` if the kind cannot be inferred from the
/// target name and is not declared.
pub(super) fn merge_target_config(
    name: &str,
    shared: &BuildTable,
    target: &TargetTable,
) -> Result<TargetConfig, ConfigError> {
    let kind = target
        .kind
        .or_else(|| TargetKind::from_target_name(name))
        .ok_or_else(|| ConfigError::MissingKey {
            section: format!("tool.packsmith.build.targets.{name}"),
            key: "kind".to_string(),
        })?;

    let rules = merge_rules(&shared.rules, &target.rules);
    let hooks = shared
        .hooks
        .iter()
        .chain(target.hooks.iter())
        .cloned()
        .collect();

    Ok(TargetConfig {
        name: name.to_string(),
        kind,
        rules: FileRules {
            include: rules.include.unwrap_or_default(),
            exclude: rules.exclude.unwrap_or_default(),
            only_include: rules.only_include.unwrap_or_default(),
            packages: rules.packages.unwrap_or_default(),
            artifacts: rules.artifacts.unwrap_or_default(),
            force_include: rules.force_include.unwrap_or_default(),
            ignore_vcs: rules.ignore_vcs.unwrap_or(false),
            allow_empty: rules.allow_empty.unwrap_or(false),
        },
        reproducible: rules.reproducible.unwrap_or(false),
        tag: target.tag.clone(),
        infer_tag: target.infer_tag.unwrap_or(false),
        hooks,
    })
}
