// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use serde::Deserialize;
use tracing::debug;

use crate::error::Result;
use crate::hooks::{BuildData, BuildHook, HookContext};
use crate::version::ResolvedVersion;

/// Configuration keys of the `build-info` hook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct BuildInfoConfig {
    pub tag: Option<String>,
    pub pure: Option<bool>,
    pub infer_tag: Option<bool>,
    pub dependencies: Vec<String>,
}

/// Applies build data declared directly in the descriptor.
#[derive(Debug, Clone)]
pub struct BuildInfoHook {
    config: BuildInfoConfig,
}

impl BuildInfoHook {
    pub const NAME: &'static str = "build-info";

    #[must_use]
    pub const fn new(config: BuildInfoConfig) -> Self {
        Self { config }
    }
}

impl BuildHook for BuildInfoHook {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn initialize(
        &self,
        ctx: &HookContext<'_>,
        _version: &ResolvedVersion,
        data: &mut BuildData,
    ) -> Result<()> {
        if let Some(tag) = &self.config.tag {
            data.set_tag(tag.clone());
        }
        if let Some(pure) = self.config.pure {
            data.set_pure(pure);
        }
        if let Some(infer) = self.config.infer_tag {
            data.set_infer_tag(infer);
        }
        for requirement in &self.config.dependencies {
            data.add_dependency(requirement.clone());
        }
        debug!(
            target = %ctx.target_name(),
            kind = %ctx.target_kind(),
            ?data,
            "Applied build info"
        );
        Ok(())
    }
}
