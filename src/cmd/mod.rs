// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Command implementations.
//!
//! ```text
//! CLI args --> load_settings --> ProjectDescriptor::load
//!                                      |
//!                   build / targets / metadata handlers
//!                                      |
//!                              exit code (u8)
//! ```

pub mod build;
pub mod metadata;
pub mod targets;


use std::collections::BTreeMap;
use std::path::Path;

use crate::cli::build::BuildArgs;
use crate::cli::global::GlobalOptions;
use crate::config::BuildSettings;
use crate::config::loader::SettingsLoader;
use crate::error::{ConfigError, ErrorCategory, PackError, Result};

/// Settings file looked up in the project root.
pub const SETTINGS_FILE: &str = "packsmith.toml";

/// Snapshot of the process environment, skipping non-UTF-8 entries.
#[must_use]
pub fn environment_snapshot() -> BTreeMap<String, String> {
    std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect()
}

/// Loads engine settings once for the invocation.
///
/// Command-line flags override every other source.
///
/// # Errors
///
/// Returns an error if a settings file is missing or malformed, or if an
/// environment value cannot be parsed.
pub fn load_settings(
    root: &Path,
    global: &GlobalOptions,
    args: Option<&BuildArgs>,
    environment: BTreeMap<String, String>,
) -> Result<BuildSettings> {
    let mut loader = SettingsLoader::new().add_toml_file_optional(root.join(SETTINGS_FILE));
    for file in &global.configs {
        loader = loader.add_toml_file(file);
    }
    loader = loader.with_environment(environment);

    if let Some(args) = args {
        if args.hooks_only {
            loader = loader.set("hooks_only", true)?;
        }
        if args.no_hooks {
            loader = loader.set("no_hooks", true)?;
        }
        if !args.enable_hooks.is_empty() {
            loader = loader.set("enable_hooks", args.enable_hooks.clone())?;
        }
        if !args.disable_hooks.is_empty() {
            loader = loader.set("disable_hooks", args.disable_hooks.clone())?;
        }
        if let Some(output) = &args.output {
            // Relative to the working directory, not the project root.
            let output = std::path::absolute(output)?;
            loader = loader.set("location", output.display().to_string())?;
        }
    }

    tracing::debug!(files = ?loader.loaded_files(), "Loading settings");
    loader.build()
}

/// Maps a command error to the process exit code.
#[must_use]
pub fn exit_code_for(error: &anyhow::Error) -> u8 {
    if let Some(e) = error.downcast_ref::<PackError>() {
        return e.category().exit_code();
    }
    if error.downcast_ref::<ConfigError>().is_some()
        || error.downcast_ref::<config::ConfigError>().is_some()
    {
        return ErrorCategory::Configuration.exit_code();
    }
    1
}
