// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! VCS ignore rules.
//!
//! ```text
//! repo/.gitignore            \
//! repo/project/.gitignore     } one matcher per directory, deepest first
//! repo/project/sub/.gitignore/
//! repo/.git/info/exclude     -- consulted last
//! ```
//!
//! The first matcher with an opinion (ignore or whitelist) decides.

use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use tracing::{debug, warn};

use crate::git::{GitQuery, GixBackend};

/// Answers whether a project path is ignored by version control.
pub trait IgnoreOracle: Send + Sync {
    /// `rel` is relative to the project root.
    fn is_ignored(&self, rel: &Path, is_dir: bool) -> bool;
}

/// Oracle that ignores nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIgnore;

impl IgnoreOracle for NoIgnore {
    fn is_ignored(&self, _rel: &Path, _is_dir: bool) -> bool {
        false
    }
}

/// Oracle backed by `.gitignore` files and `.git/info/exclude`.
#[derive(Debug)]
pub struct GitignoreOracle {
    root: PathBuf,
    /// Per-directory matchers, deepest directory first.
    matchers: Vec<(PathBuf, Gitignore)>,
    exclude: Option<Gitignore>,
}

fn build_matcher(dir: &Path, file: &Path) -> Option<Gitignore> {
    let mut builder = GitignoreBuilder::new(dir);
    if let Some(e) = builder.add(file) {
        warn!(path = %file.display(), error = %e, "Malformed ignore file");
    }
    match builder.build() {
        Ok(gitignore) if !gitignore.is_empty() => Some(gitignore),
        Ok(_) => None,
        Err(e) => {
            warn!(path = %file.display(), error = %e, "Failed to compile ignore file");
            None
        }
    }
}

impl GitignoreOracle {
    /// Collect ignore rules for `root`.
    ///
    /// `files` are the root-relative files found by the tree walk; every
    /// `.gitignore` among them is loaded. When `root` sits inside a larger
    /// work tree, `.gitignore` files between it and the work tree root are
    /// loaded too.
    #[must_use]
    pub fn discover(root: &Path, files: &[PathBuf]) -> Self {
        let mut ignore_files: Vec<(PathBuf, PathBuf)> = files
            .iter()
            .filter(|rel| rel.file_name().is_some_and(|name| name == ".gitignore"))
            .map(|rel| {
                let file = root.join(rel);
                let dir = file.parent().map_or_else(|| root.to_path_buf(), Path::to_path_buf);
                (dir, file)
            })
            .collect();

        let workdir = GixBackend::workdir(root).ok();
        let vcs_root = workdir.clone().unwrap_or_else(|| root.to_path_buf());

        if let Some(workdir) = &workdir {
            let mut dir = root.parent();
            while let Some(current) = dir {
                if !current.starts_with(workdir) {
                    break;
                }
                let candidate = current.join(".gitignore");
                if candidate.is_file() {
                    ignore_files.push((current.to_path_buf(), candidate));
                }
                dir = current.parent();
            }
        }

        let mut matchers: Vec<(PathBuf, Gitignore)> = ignore_files
            .into_iter()
            .filter_map(|(dir, file)| build_matcher(&dir, &file).map(|m| (dir, m)))
            .collect();
        matchers.sort_by(|a, b| {
            b.0.components()
                .count()
                .cmp(&a.0.components().count())
                .then_with(|| a.0.cmp(&b.0))
        });

        let exclude_file = vcs_root.join(".git").join("info").join("exclude");
        let exclude = exclude_file
            .is_file()
            .then(|| build_matcher(&vcs_root, &exclude_file))
            .flatten();

        debug!(
            root = %root.display(),
            matchers = matchers.len(),
            has_exclude = exclude.is_some(),
            "Loaded VCS ignore rules"
        );

        Self {
            root: root.to_path_buf(),
            matchers,
            exclude,
        }
    }

    /// Number of loaded per-directory matchers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.matchers.len() + usize::from(self.exclude.is_some())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl IgnoreOracle for GitignoreOracle {
    fn is_ignored(&self, rel: &Path, is_dir: bool) -> bool {
        let abs = self.root.join(rel);
        for (dir, matcher) in &self.matchers {
            if !abs.starts_with(dir) {
                continue;
            }
            let matched = matcher.matched_path_or_any_parents(&abs, is_dir);
            if matched.is_ignore() {
                return true;
            }
            if matched.is_whitelist() {
                return false;
            }
        }
        self.exclude.as_ref().is_some_and(|exclude| {
            abs.starts_with(exclude.path())
                && exclude.matched_path_or_any_parents(&abs, is_dir).is_ignore()
        })
    }
}
