// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Glob pattern sets for file selection.
//!
//! ```text
//! "*.pyc"        --> "**/*.pyc"     (no '/': any depth)
//! "/setup.py"    --> "setup.py"     (leading '/': anchored at the root)
//! "tests/"       --> "tests"        (trailing '/': directory)
//! "src/**"       --> "src/**"
//!
//! match(path) = any glob matches path or one of its parent directories
//! ```

use wax::{Glob, Program};

use crate::error::SelectionError;
use crate::utility::fs::path::ancestors;

/// Compiled selection patterns.
#[derive(Debug, Default)]
pub struct PatternSet {
    globs: Vec<(String, Glob<'static>)>,
}

/// Rewrite a selection pattern into its wax form.
fn translate(pattern: &str) -> Option<String> {
    let trimmed = pattern.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    Some(match trimmed.strip_prefix('/') {
        Some(anchored) => anchored.to_string(),
        None if trimmed.contains('/') => trimmed.to_string(),
        None => format!("**/{trimmed}"),
    })
}

impl PatternSet {
    /// Compile a list of patterns.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError::InvalidPattern` if any pattern is not a valid
    /// glob.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, SelectionError> {
        let mut globs = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let Some(translated) = translate(pattern) else {
                continue;
            };
            let glob = Glob::new(&translated)
                .map_err(|e| SelectionError::InvalidPattern {
                    pattern: pattern.to_string(),
                    message: e.to_string(),
                })?
                .into_owned();
            globs.push((pattern.to_string(), glob));
        }
        Ok(Self { globs })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.globs.is_empty()
    }

    /// Returns the original patterns.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.globs.iter().map(|(p, _)| p.as_str())
    }

    /// Whether `path` (`/`-separated, root-relative) or any parent directory
    /// of it matches.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        self.matches_exact(path) || ancestors(path).any(|dir| self.matches_exact(dir))
    }

    /// Whether `path` itself matches, ignoring parent directories.
    #[must_use]
    pub fn matches_exact(&self, path: &str) -> bool {
        self.globs.iter().any(|(_, glob)| glob.is_match(path))
    }
}
