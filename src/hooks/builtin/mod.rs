// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Built-in build hooks.
//!
//! | Name | Hook |
//! |------|------|
//! | `script` | [`ScriptHook`]: run a build script, force-include its outputs |
//! | `version-file` | [`VersionFileHook`]: render the version into a module |
//! | `build-info` | [`BuildInfoHook`]: build data straight from configuration |

mod build_info;
mod script;
mod version_file;

use std::sync::Arc;

use super::BuildHook;
use super::registry::{HookRegistry, hook_config};

pub use build_info::{BuildInfoConfig, BuildInfoHook};
pub use script::{ScriptConfig, ScriptHook};
pub use version_file::{VersionFileConfig, VersionFileHook};

/// Adds every built-in hook to `registry`.
pub fn register_all(registry: &mut HookRegistry) {
    registry.register(ScriptHook::NAME, |spec| {
        let hook: Arc<dyn BuildHook> = Arc::new(ScriptHook::new(hook_config(spec)?));
        Ok(hook)
    });
    registry.register(VersionFileHook::NAME, |spec| {
        let hook: Arc<dyn BuildHook> = Arc::new(VersionFileHook::new(hook_config(spec)?));
        Ok(hook)
    });
    registry.register(BuildInfoHook::NAME, |spec| {
        let hook: Arc<dyn BuildHook> = Arc::new(BuildInfoHook::new(hook_config(spec)?));
        Ok(hook)
    });
}
