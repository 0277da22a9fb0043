// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Per-invocation engine settings.
//!
//! ```text
//! PACKSMITH_NO_HOOKS=1            → no_hooks = true
//! PACKSMITH_ENABLE_HOOKS=a,b      → enable_hooks = ["a", "b"]
//! PACKSMITH_LOCATION=/tmp/out     → location = "/tmp/out"
//! SOURCE_DATE_EPOCH=1700000000    → source_date_epoch = 1700000000
//! ```
//!
//! Settings are built once at invocation start together with a snapshot of
//! the process environment. No later stage reads the process environment.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Engine settings shared read-only by every target of one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSettings {
    /// Disable every hook not explicitly enabled.
    pub no_hooks: bool,
    /// Run the hook lifecycle without building or writing archives.
    pub hooks_only: bool,
    /// Hooks enabled regardless of `no_hooks` and `enable-by-default`.
    pub enable_hooks: Vec<String>,
    /// Hooks disabled unconditionally.
    pub disable_hooks: Vec<String>,
    /// Output directory override.
    pub location: Option<PathBuf>,
    /// Fixed timestamp for archive members.
    pub source_date_epoch: Option<i64>,
    /// Interpreter tag reported by the build environment.
    pub python_tag: Option<String>,
    /// ABI tag reported by the build environment.
    pub abi_tag: Option<String>,
    /// Platform tag reported by the build environment.
    pub platform_tag: Option<String>,
    /// Environment captured at invocation start.
    #[serde(skip)]
    pub environment: BTreeMap<String, String>,
}

impl BuildSettings {
    /// Decide whether a hook runs for this invocation.
    ///
    /// ```text
    /// disable_hooks ∋ name → off
    /// enable_hooks ∋ name  → on
    /// no_hooks             → off
    /// otherwise            → enable-by-default
    /// ```
    #[must_use]
    pub fn is_hook_enabled(&self, name: &str, enable_by_default: bool) -> bool {
        if self.disable_hooks.iter().any(|h| h == name) {
            return false;
        }
        if self.enable_hooks.iter().any(|h| h == name) {
            return true;
        }
        !self.no_hooks && enable_by_default
    }

    /// Look up a variable in the captured environment.
    #[must_use]
    pub fn env(&self, key: &str) -> Option<&str> {
        self.environment.get(key).map(String::as_str)
    }

    /// Output directory: `location` when set, else the descriptor default.
    ///
    /// A relative `location` is resolved against `root`.
    #[must_use]
    pub fn output_dir(&self, root: &Path, descriptor_default: &Path) -> PathBuf {
        self.location.as_ref().map_or_else(
            || descriptor_default.to_path_buf(),
            |location| root.join(location),
        )
    }
}
