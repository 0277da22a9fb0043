// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use anyhow::{Context, bail};
use serde::Deserialize;
use tracing::info;

use crate::config::types::ForceInclude;
use crate::error::Result;
use crate::hooks::{BuildData, BuildHook, HookContext};
use crate::utility::fs::path::normalize_archive_path;
use crate::version::ResolvedVersion;

const DEFAULT_TEMPLATE: &str = "__version__ = \"{version}\"\n";

/// Configuration keys of the `version-file` hook.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct VersionFileConfig {
    /// Archive path of the generated file.
    pub path: String,
    #[serde(default = "default_template")]
    pub template: String,
}

fn default_template() -> String {
    DEFAULT_TEMPLATE.to_string()
}

/// Writes the resolved version into a generated module.
///
/// The file is rendered into the target's work directory and force-included
/// at `path`, so the source tree is never modified.
#[derive(Debug, Clone)]
pub struct VersionFileHook {
    config: VersionFileConfig,
}

impl VersionFileHook {
    pub const NAME: &'static str = "version-file";

    #[must_use]
    pub const fn new(config: VersionFileConfig) -> Self {
        Self { config }
    }

    /// Replaces `{version}` in the template.
    #[must_use]
    pub fn render(&self, version: &str) -> String {
        self.config.template.replace("{version}", version)
    }
}

impl BuildHook for VersionFileHook {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn initialize(
        &self,
        ctx: &HookContext<'_>,
        version: &ResolvedVersion,
        data: &mut BuildData,
    ) -> Result<()> {
        let Some(archive_path) = normalize_archive_path(&self.config.path) else {
            bail!("path '{}' must be relative to the archive root", self.config.path);
        };

        let file = ctx.work_dir().join(Self::NAME).join(&archive_path);
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        std::fs::write(&file, self.render(&version.version))
            .with_context(|| format!("failed to write {}", file.display()))?;

        info!(
            "{}wrote version {} to {archive_path}",
            ctx.log().prefix(),
            version.version
        );
        data.add_force_include(ForceInclude::new(file, archive_path));
        Ok(())
    }
}
