// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Archive path helpers.

use std::path::{Component, Path};

/// Convert a root-relative filesystem path to a `/`-separated archive path.
#[must_use]
pub fn to_archive_path(rel: &Path) -> String {
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Normalize a user-supplied archive path.
///
/// Leading `/` and `./` segments are dropped, `\` is treated as a separator.
/// Returns `None` for empty paths and paths that escape the archive root.
#[must_use]
pub fn normalize_archive_path(raw: &str) -> Option<String> {
    let mut parts = Vec::new();
    for part in raw.split(['/', '\\']) {
        match part {
            "" | "." => {}
            ".." => return None,
            other => parts.push(other),
        }
    }
    (!parts.is_empty()).then(|| parts.join("/"))
}

/// Parent directories of an archive path, nearest last.
///
/// `a/b/c.py` yields `a` and `a/b`.
pub fn ancestors(archive_path: &str) -> impl Iterator<Item = &str> {
    archive_path
        .match_indices('/')
        .map(move |(i, _)| &archive_path[..i])
}
