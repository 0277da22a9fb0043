// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Parsing of `git describe --tags --long --dirty` output.
//!
//! ```text
//! v1.2.3-0-g1a2b3c4         tag=v1.2.3 distance=0 hash=1a2b3c4
//! release-2-7-gdeadbee-dirty tag=release-2 distance=7 dirty
//! ```

use crate::error::GitError;

/// Position of `HEAD` relative to the nearest tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Describe {
    pub tag: String,
    pub distance: u64,
    pub hash: String,
    pub dirty: bool,
}

impl Describe {
    /// Parse long describe output.
    ///
    /// # Errors
    ///
    /// Returns `GitError::UnexpectedDescribe` if the output does not have the
    /// `<tag>-<n>-g<hash>[-dirty]` shape.
    pub fn parse(output: &str) -> Result<Self, GitError> {
        let unexpected = || GitError::UnexpectedDescribe(output.to_string());
        let trimmed = output.trim();
        let (body, dirty) = trimmed
            .strip_suffix("-dirty")
            .map_or((trimmed, false), |body| (body, true));

        let mut parts = body.rsplitn(3, '-');
        let hash = parts
            .next()
            .and_then(|h| h.strip_prefix('g'))
            .filter(|h| !h.is_empty() && h.bytes().all(|b| b.is_ascii_hexdigit()))
            .ok_or_else(unexpected)?;
        let distance = parts
            .next()
            .and_then(|d| d.parse().ok())
            .ok_or_else(unexpected)?;
        let tag = parts.next().filter(|t| !t.is_empty()).ok_or_else(unexpected)?;

        Ok(Self {
            tag: tag.to_string(),
            distance,
            hash: hash.to_string(),
            dirty,
        })
    }

    /// True when `HEAD` is exactly the tag and the worktree is clean.
    #[must_use]
    pub const fn is_exact(&self) -> bool {
        self.distance == 0 && !self.dirty
    }
}
