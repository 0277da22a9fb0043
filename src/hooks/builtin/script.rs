// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Build-script hook.
//!
//! ```text
//! scripts = ["scripts/build-binaries.sh", "scripts/build-binaries.py"]
//!   first existing file wins
//!   .sh  --> bash <script>
//!   .py  --> python3 <script>
//!   else --> <script>
//!   cwd = project root, env = captured snapshot + PACKSMITH_TARGET/VERSION/WORK_DIR
//!   stdout lines --> info, stderr lines --> warn
//!   exit != 0   --> hook failure
//! ```

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, bail};
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::types::ForceInclude;
use crate::error::Result;
use crate::hooks::{BuildData, BuildHook, HookContext};
use crate::version::ResolvedVersion;

const DEFAULT_SCRIPTS: &[&str] = &["scripts/build-binaries.sh", "scripts/build-binaries.py"];

/// Configuration keys of the `script` hook.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ScriptConfig {
    /// Candidate scripts relative to the project root; the first that exists runs.
    pub scripts: Vec<PathBuf>,
    /// Fail when none of the scripts exists.
    pub required: bool,
    /// Extra arguments passed to the script.
    pub args: Vec<String>,
    /// Files produced by the script, force-included after a successful run.
    pub artifacts: Vec<ForceInclude>,
    /// Override the wheel's pure flag after a successful run.
    pub pure: Option<bool>,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            scripts: DEFAULT_SCRIPTS.iter().map(PathBuf::from).collect(),
            required: false,
            args: Vec::new(),
            artifacts: Vec::new(),
            pure: None,
        }
    }
}

/// Runs a project build script during initialize.
#[derive(Debug, Clone)]
pub struct ScriptHook {
    config: ScriptConfig,
}

impl ScriptHook {
    pub const NAME: &'static str = "script";

    #[must_use]
    pub const fn new(config: ScriptConfig) -> Self {
        Self { config }
    }

    /// First configured script that exists under `root`.
    #[must_use]
    pub fn find_script(&self, root: &Path) -> Option<PathBuf> {
        self.config
            .scripts
            .iter()
            .map(|script| root.join(script))
            .find(|path| path.is_file())
    }

    /// Build the command for `script`, locating interpreters on the
    /// captured `PATH`.
    fn command(ctx: &HookContext<'_>, script: &Path) -> Result<Command> {
        let interpreter = match script.extension().and_then(|e| e.to_str()) {
            Some("sh") => Some("bash"),
            Some("py") => Some("python3"),
            _ => None,
        };

        let mut command = match interpreter {
            Some(name) => {
                let search_path: Option<OsString> = ctx.settings().env("PATH").map(OsString::from);
                let program = which::which_in(name, search_path, ctx.root())
                    .with_context(|| format!("'{name}' not found on PATH"))?;
                let mut command = Command::new(program);
                command.arg(script);
                command
            }
            None => Command::new(script),
        };

        command
            .current_dir(ctx.root())
            .env_clear()
            .envs(&ctx.settings().environment)
            .env("PACKSMITH_TARGET", ctx.target_name())
            .env("PACKSMITH_WORK_DIR", ctx.work_dir());
        Ok(command)
    }
}

impl BuildHook for ScriptHook {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn initialize(
        &self,
        ctx: &HookContext<'_>,
        version: &ResolvedVersion,
        data: &mut BuildData,
    ) -> Result<()> {
        let prefix = ctx.log().prefix();
        let Some(script) = self.find_script(ctx.root()) else {
            if self.config.required {
                bail!("none of the configured build scripts exists");
            }
            info!("{prefix}no build script found, skipping");
            return Ok(());
        };

        info!("{prefix}running {}", script.display());
        let output = Self::command(ctx, &script)?
            .args(&self.config.args)
            .env("PACKSMITH_VERSION", &version.version)
            .output()
            .with_context(|| format!("failed to spawn {}", script.display()))?;

        for line in String::from_utf8_lossy(&output.stdout).lines() {
            info!("{prefix}{line}");
        }
        for line in String::from_utf8_lossy(&output.stderr).lines() {
            warn!("{prefix}{line}");
        }

        if !output.status.success() {
            bail!(
                "{} exited with {}",
                script.display(),
                output
                    .status
                    .code()
                    .map_or_else(|| "a signal".to_string(), |code| format!("code {code}"))
            );
        }

        for artifact in &self.config.artifacts {
            data.add_force_include(artifact.clone());
        }
        if let Some(pure) = self.config.pure {
            data.set_pure(pure);
        }
        Ok(())
    }
}
