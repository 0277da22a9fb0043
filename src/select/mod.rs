// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! File selection.
//!
//! ```text
//! parallel_walk(root)              skip .git/.hg/.svn + output dir
//!        |
//!        v
//! only-include? ----yes----> matches ------------------+
//!        | no                                          |
//!        v                                             |
//! include ∪ packages ∪ artifacts (or discovery)        |
//!        |                                             |
//!        v                                             |
//! − exclude                                            |
//!        |                                             |
//!        +<--------------------------------------------+
//!        v
//! − VCS-ignored (artifacts re-admitted)   unless ignore-vcs
//!        |
//!        v
//! empty? --> EmptySelection unless allow-empty
//!        |
//!        v
//! overlay force-include (later entries win)
//!        |
//!        v
//! FileSelection  BTreeMap<archive path, SelectedFile>
//! ```
//!
//! Patterns are evaluated against `/`-separated paths relative to the
//! project root.

pub mod ignore;
pub mod pattern;


use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, trace};

use crate::config::types::{ForceInclude, TargetConfig, TargetKind};
use crate::error::SelectionError;
use crate::utility::fs::path::{normalize_archive_path, to_archive_path};
use crate::utility::fs::walk::{WalkOptions, WalkResult, parallel_walk};

pub use self::ignore::{GitignoreOracle, IgnoreOracle, NoIgnore};
pub use self::pattern::PatternSet;

/// Why a file is part of the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionOrigin {
    OnlyInclude,
    Include,
    Package,
    Artifact,
    Discovered,
    ForceInclude,
}

/// A selected source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedFile {
    /// Absolute source path.
    pub source: PathBuf,
    pub origin: SelectionOrigin,
}

/// Ordered mapping from archive paths to source files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileSelection {
    entries: BTreeMap<String, SelectedFile>,
}

impl FileSelection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get(&self, archive_path: &str) -> Option<&SelectedFile> {
        self.entries.get(archive_path)
    }

    /// Entries in lexicographic archive-path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SelectedFile)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Archive paths in lexicographic order.
    pub fn archive_paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Add a pattern-selected file.
    ///
    /// The same source may be claimed repeatedly; the first origin is kept.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError::ArchivePathCollision` if a different source
    /// already occupies the archive path.
    pub fn claim(
        &mut self,
        archive_path: String,
        source: PathBuf,
        origin: SelectionOrigin,
    ) -> Result<(), SelectionError> {
        match self.entries.entry(archive_path) {
            Entry::Vacant(slot) => {
                slot.insert(SelectedFile { source, origin });
                Ok(())
            }
            Entry::Occupied(slot) if slot.get().source == source => Ok(()),
            Entry::Occupied(slot) => Err(SelectionError::ArchivePathCollision {
                archive_path: slot.key().clone(),
                first: slot.get().source.display().to_string(),
                second: source.display().to_string(),
            }),
        }
    }

    /// Keep only entries for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &SelectedFile) -> bool) {
        self.entries.retain(|k, v| keep(k, v));
    }

    /// Overlay explicit mappings in order; later entries win.
    ///
    /// Relative sources are resolved against `root`; directories expand
    /// recursively under the destination path.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError::PathNotFound` if a source does not exist,
    /// `SelectionError::InvalidPattern` if a destination escapes the archive
    /// and `SelectionError::Walk` if a source directory cannot be fully read.
    pub fn overlay_force_include(
        &mut self,
        root: &Path,
        entries: &[ForceInclude],
    ) -> Result<(), SelectionError> {
        for entry in entries {
            let source = root.join(&entry.source);
            if !source.exists() {
                return Err(SelectionError::PathNotFound {
                    path: source.display().to_string(),
                });
            }
            let dest = normalize_archive_path(&entry.path).ok_or_else(|| {
                SelectionError::InvalidPattern {
                    pattern: entry.path.clone(),
                    message: "force-include path must stay inside the archive".to_string(),
                }
            })?;

            if source.is_dir() {
                let walked = parallel_walk(&source, &WalkOptions::default())?;
                check_walk(&source, &walked)?;
                for rel in walked.into_files() {
                    let archive_path = format!("{dest}/{}", to_archive_path(&rel));
                    self.force(archive_path, source.join(rel));
                }
            } else {
                self.force(dest, source);
            }
        }
        Ok(())
    }

    fn force(&mut self, archive_path: String, source: PathBuf) {
        trace!(%archive_path, source = %source.display(), "Force-included");
        self.entries.insert(
            archive_path,
            SelectedFile {
                source,
                origin: SelectionOrigin::ForceInclude,
            },
        );
    }
}

/// Project-level inputs to selection.
#[derive(Debug, Clone, Copy)]
pub struct SelectionContext<'a> {
    /// Project root (absolute).
    pub root: &'a Path,
    /// Importable package name used for wheel discovery.
    pub package_name: &'a str,
    /// Output directory, skipped when inside the root.
    pub output_dir: Option<&'a Path>,
}

/// Candidate files from the walk, as `(archive-style relative path, absolute path)`.
struct Tree {
    files: Vec<(String, PathBuf)>,
}

impl Tree {
    fn under<'t>(&'t self, dir: &str) -> impl Iterator<Item = &'t (String, PathBuf)> {
        self.files.iter().filter(move |(rel, _)| {
            rel.strip_prefix(dir)
                .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    fn contains(&self, rel: &str) -> bool {
        self.files.iter().any(|(r, _)| r == rel)
    }
}

/// Discover the importable package of a wheel target.
///
/// Returns the matching package directory or module file, relative to the root.
fn discover_package(tree: &Tree, package_name: &str) -> Option<String> {
    [
        format!("src/{package_name}"),
        package_name.to_string(),
    ]
    .into_iter()
    .find(|dir| tree.contains(&format!("{dir}/__init__.py")))
    .or_else(|| {
        [
            format!("src/{package_name}.py"),
            format!("{package_name}.py"),
        ]
        .into_iter()
        .find(|module| tree.contains(module))
    })
}

/// Archive path of `rel` when `package` is shipped with its parent stripped.
fn package_archive_path(package: &str, rel: &str) -> String {
    match package.rsplit_once('/') {
        Some((parent, _)) => rel
            .strip_prefix(parent)
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(rel)
            .to_string(),
        None => rel.to_string(),
    }
}

/// Select the files of one target.
///
/// # Errors
///
/// Returns a `SelectionError` if a pattern is invalid, the walk fails, two
/// sources claim one archive path, nothing is selected (unless
/// `allow-empty`), or a force-include source is missing.
pub fn select(
    target: &TargetConfig,
    ctx: &SelectionContext<'_>,
    oracle: &dyn IgnoreOracle,
) -> Result<FileSelection, SelectionError> {
    let rules = &target.rules;
    let root = ctx.root;

    let skip_paths = ctx
        .output_dir
        .and_then(|dir| output_dir_under_root(root, dir))
        .map(|dir| vec![dir])
        .unwrap_or_default();
    let walked = parallel_walk(root, &WalkOptions::builder().with_skip_paths(skip_paths).build())?;
    check_walk(root, &walked)?;
    let tree = Tree {
        files: walked
            .into_files()
            .into_iter()
            .map(|rel| (to_archive_path(&rel), root.join(rel)))
            .collect(),
    };

    let artifacts = PatternSet::new(&rules.artifacts)?;
    let mut selection = FileSelection::new();

    if rules.only_include.is_empty() {
        let include = PatternSet::new(&rules.include)?;
        let exclude = PatternSet::new(&rules.exclude)?;
        let packages: Vec<String> = rules
            .packages
            .iter()
            .filter_map(|p| normalize_archive_path(p))
            .collect();

        // One candidate per source file, keyed by its root-relative path.
        let mut candidates: BTreeMap<&String, Candidate<'_>> = BTreeMap::new();

        for (rel, abs) in &tree.files {
            if include.matches(rel) {
                candidates.insert(rel, Candidate::new(rel.clone(), abs, SelectionOrigin::Include));
            }
        }

        let strip_parents = target.kind == TargetKind::Wheel;
        for package in &packages {
            for (rel, abs) in tree.under(package) {
                let archive = if strip_parents {
                    package_archive_path(package, rel)
                } else {
                    rel.clone()
                };
                match candidates.entry(rel) {
                    Entry::Occupied(mut slot) if slot.get().origin == SelectionOrigin::Include => {
                        slot.insert(Candidate::new(archive, abs, SelectionOrigin::Package));
                    }
                    Entry::Occupied(_) => {}
                    Entry::Vacant(slot) => {
                        slot.insert(Candidate::new(archive, abs, SelectionOrigin::Package));
                    }
                }
            }
        }

        if include.is_empty() && packages.is_empty() {
            match target.kind {
                TargetKind::Sdist => {
                    for (rel, abs) in &tree.files {
                        candidates.insert(
                            rel,
                            Candidate::new(rel.clone(), abs, SelectionOrigin::Discovered),
                        );
                    }
                }
                TargetKind::Wheel => {
                    if let Some(found) = discover_package(&tree, ctx.package_name) {
                        debug!(target = %target.name, package = %found, "Discovered package");
                        let module = tree.files.iter().filter(|(rel, _)| rel == &found);
                        for (rel, abs) in tree.under(&found).chain(module) {
                            candidates.insert(
                                rel,
                                Candidate::new(
                                    package_archive_path(&found, rel),
                                    abs,
                                    SelectionOrigin::Discovered,
                                ),
                            );
                        }
                    }
                }
            }
        }

        if !artifacts.is_empty() {
            for (rel, abs) in &tree.files {
                if artifacts.matches(rel) {
                    candidates
                        .entry(rel)
                        .or_insert_with(|| Candidate::new(rel.clone(), abs, SelectionOrigin::Artifact));
                }
            }
        }

        for (rel, candidate) in candidates {
            if exclude.matches(rel) {
                trace!(path = %rel, "Excluded");
                continue;
            }
            selection.claim(candidate.archive_path, candidate.source.clone(), candidate.origin)?;
        }
    } else {
        let only = PatternSet::new(&rules.only_include)?;
        for (rel, abs) in &tree.files {
            if only.matches(rel) {
                selection.claim(rel.clone(), abs.clone(), SelectionOrigin::OnlyInclude)?;
            }
        }
    }

    if !rules.ignore_vcs {
        selection.retain(|_, file| {
            let rel = relative_to(root, &file.source);
            artifacts.matches(&rel) || !oracle.is_ignored(Path::new(&rel), false)
        });
    }

    if selection.is_empty() && !rules.allow_empty {
        return Err(SelectionError::EmptySelection {
            target: target.name.clone(),
        });
    }

    selection.overlay_force_include(root, &rules.force_include)?;

    debug!(target = %target.name, files = selection.len(), "Selected files");
    Ok(selection)
}

/// A source file with the archive path it will be claimed under.
struct Candidate<'t> {
    archive_path: String,
    source: &'t PathBuf,
    origin: SelectionOrigin,
}

impl<'t> Candidate<'t> {
    const fn new(archive_path: String, source: &'t PathBuf, origin: SelectionOrigin) -> Self {
        Self {
            archive_path,
            source,
            origin,
        }
    }
}

/// The output directory expressed under `root`, when it lies strictly inside it.
///
/// Both sides are resolved to real paths first, so a relative root and an
/// absolute output directory still compare equal. The output directory may
/// not exist yet; another target can create it while this one walks.
fn output_dir_under_root(root: &Path, dir: &Path) -> Option<PathBuf> {
    let canonical_root = root.canonicalize().ok()?;
    let canonical_dir = resolve_existing_prefix(dir)?;
    let rel = canonical_dir.strip_prefix(&canonical_root).ok()?;
    (!rel.as_os_str().is_empty()).then(|| root.join(rel))
}

/// Canonicalize the longest existing ancestor of `path` and re-append the rest.
fn resolve_existing_prefix(path: &Path) -> Option<PathBuf> {
    let absolute = std::path::absolute(path).ok()?;
    let mut existing = absolute.as_path();
    let mut missing = Vec::new();
    loop {
        if let Ok(canonical) = existing.canonicalize() {
            return Some(missing.iter().rev().fold(canonical, |acc, part| acc.join(part)));
        }
        missing.push(existing.file_name()?);
        existing = existing.parent()?;
    }
}

fn check_walk(root: &Path, walked: &WalkResult) -> Result<(), SelectionError> {
    walked.errors().first().map_or(Ok(()), |first| {
        Err(SelectionError::Walk {
            root: root.display().to_string(),
            message: first.clone(),
        })
    })
}

fn relative_to(root: &Path, source: &Path) -> String {
    source
        .strip_prefix(root)
        .map_or_else(|_| to_archive_path(source), to_archive_path)
}
