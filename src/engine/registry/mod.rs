// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Target selection for one invocation.
//!
//! ```text
//! input ["wheel", "s*"]
//!   exact name:  "wheel" --> [wheel]
//!   glob:        "s*"    --> [sdist, source]
//!   dedupe + preserve order
//! no input --> every declared target
//! ```

use std::collections::BTreeSet;

use wax::{Glob, Program};

use crate::config::ProjectDescriptor;
use crate::error::ConfigError;

/// Declared targets, looked up by name or glob.
#[derive(Debug, Clone, Default)]
pub struct TargetRegistry {
    target_names: BTreeSet<String>,
}

impl TargetRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every target of `descriptor`.
    #[must_use]
    pub fn from_descriptor(descriptor: &ProjectDescriptor) -> Self {
        let mut registry = Self::new();
        registry.register_all(descriptor.target_names());
        registry
    }

    pub fn register(&mut self, name: impl Into<String>) {
        self.target_names.insert(name.into());
    }

    pub fn register_all(&mut self, names: impl IntoIterator<Item = impl Into<String>>) {
        for name in names {
            self.target_names.insert(name.into());
        }
    }

    #[must_use]
    pub const fn all_targets(&self) -> &BTreeSet<String> {
        &self.target_names
    }

    /// Target names matching `pattern`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the pattern is not a valid glob.
    pub fn match_pattern(&self, pattern: &str) -> Result<Vec<String>, ConfigError> {
        if self.target_names.contains(pattern) {
            return Ok(vec![pattern.to_string()]);
        }

        let glob = Glob::new(pattern).map_err(|e| ConfigError::InvalidValue {
            section: "cli".to_string(),
            key: "target".to_string(),
            message: format!("invalid target pattern '{pattern}': {e}"),
        })?;

        Ok(self
            .target_names
            .iter()
            .filter(|name| glob.is_match(name.as_str()))
            .cloned()
            .collect())
    }

    /// Resolve requested names and globs to declared target names.
    ///
    /// An empty request selects every target.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownTarget` for a request matching nothing and
    /// `ConfigError::InvalidValue` for an invalid glob.
    pub fn resolve(&self, specs: &[String]) -> Result<Vec<String>, ConfigError> {
        if specs.is_empty() {
            return Ok(self.target_names.iter().cloned().collect());
        }

        let mut result = Vec::new();
        let mut seen = BTreeSet::new();
        for pattern in specs {
            let matches = self.match_pattern(pattern)?;
            if matches.is_empty() {
                return Err(ConfigError::UnknownTarget(pattern.clone()));
            }
            for name in matches {
                if seen.insert(name.clone()) {
                    result.push(name);
                }
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests;
