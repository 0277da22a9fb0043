// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Git backend abstraction layer.
//!
//! ```text
//! GitQuery (read)      --> GixBackend   (pure Rust gix)
//! describe (read, CLI) --> ShellBackend (git describe)
//! ```

use crate::error::GitError;
use std::path::{Path, PathBuf};

use super::describe::Describe;

// --- Query Trait (Read-only operations) ---

/// Read-only git query operations.
pub trait GitQuery {
    /// Check if path is inside a git work tree.
    fn is_git_repo(path: &Path) -> bool;

    /// Work tree root of the repository containing `path`.
    ///
    /// # Errors
    ///
    /// Returns `GitError::RepoNotFound` if discovery fails or the repository
    /// is bare.
    fn workdir(path: &Path) -> Result<PathBuf, GitError>;
}

// --- GixBackend Implementation (Pure Rust) ---

/// Pure Rust git backend using gix.
pub struct GixBackend;

fn discover(path: &Path) -> Result<gix::Repository, GitError> {
    gix::discover(path).map_err(|_| GitError::RepoNotFound {
        path: path.display().to_string(),
    })
}

impl GitQuery for GixBackend {
    fn is_git_repo(path: &Path) -> bool {
        gix::discover(path).is_ok()
    }

    fn workdir(path: &Path) -> Result<PathBuf, GitError> {
        let repo = discover(path)?;
        repo.workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| GitError::RepoNotFound {
                path: path.display().to_string(),
            })
    }
}

// --- ShellBackend Implementation (Git CLI) ---

/// Shell-based git backend using the git CLI.
///
/// Used for `git describe`, which gix does not expose with `--dirty`
/// semantics.
pub struct ShellBackend;

impl ShellBackend {
    /// Execute a git command. Sets `GCM_INTERACTIVE=never`, `GIT_TERMINAL_PROMPT=0`
    /// and `LC_ALL=C`; error classification matches untranslated messages.
    pub(crate) fn git_command(args: &[&str], cwd: &Path) -> Result<String, GitError> {
        use std::process::Command;

        let command = format!("git {}", args.join(" "));
        let output = Command::new("git")
            .args(args)
            .current_dir(cwd)
            .env("LC_ALL", "C")
            .env("GCM_INTERACTIVE", "never")
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()
            .map_err(|e| GitError::CommandFailed {
                command: command.clone(),
                message: format!("failed to execute git: {e}"),
            })?;

        if !output.status.success() {
            return Err(GitError::CommandFailed {
                command,
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Describe `HEAD` relative to the nearest reachable tag.
    ///
    /// # Errors
    ///
    /// Returns `GitError::NoTags` when no tag is reachable (or there are no
    /// commits yet), and `GitError::CommandFailed` for other git failures.
    pub fn describe(path: &Path) -> Result<Describe, GitError> {
        match Self::git_command(&["describe", "--tags", "--long", "--dirty"], path) {
            Ok(output) => Describe::parse(&output),
            Err(GitError::CommandFailed { message, .. }) if is_no_tags(&message) => {
                Err(GitError::NoTags {
                    path: path.display().to_string(),
                })
            }
            Err(e) => Err(e),
        }
    }
}

fn is_no_tags(stderr: &str) -> bool {
    stderr.contains("No names found")
        || stderr.contains("No tags can describe")
        || stderr.contains("cannot describe anything")
        || stderr.contains("Not a valid object name")
}

#[cfg(test)]
mod tests;
