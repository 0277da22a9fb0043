// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::error::SelectionError;
use bon::Builder;
use flume::bounded;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

/// VCS metadata directories never descended into.
pub const VCS_DIRS: &[&str] = &[".git", ".hg", ".svn"];

/// Options for parallel project-tree traversal.
///
/// The walker's own filters (hidden files, ignore files) are always off;
/// VCS-ignore rules are applied later by the selector.
#[derive(Debug, Clone, Builder)]
pub struct WalkOptions {
    /// Follow symbolic links
    #[builder(setters(name = with_follow_links), default = false)]
    follow_links: bool,
    /// Number of threads (None = auto-detect based on CPU count)
    #[builder(setters(name = with_threads))]
    threads: Option<usize>,
    /// Skip directories matching these names (exact match)
    #[builder(setters(name = with_skip_dirs), default = VCS_DIRS.iter().map(ToString::to_string).collect())]
    skip_dirs: Vec<String>,
    /// Skip these absolute paths and everything below them
    #[builder(setters(name = with_skip_paths), default)]
    skip_paths: Vec<PathBuf>,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl WalkOptions {
    /// Returns whether to follow symbolic links.
    #[must_use]
    pub const fn follow_links(&self) -> bool {
        self.follow_links
    }

    /// Returns the number of threads (None = auto-detect).
    #[must_use]
    pub const fn threads(&self) -> Option<usize> {
        self.threads
    }

    /// Returns the skip directories list.
    #[must_use]
    pub fn skip_dirs(&self) -> &[String] {
        &self.skip_dirs
    }

    /// Returns the skipped absolute paths.
    #[must_use]
    pub fn skip_paths(&self) -> &[PathBuf] {
        &self.skip_paths
    }
}

/// Regular files found under a root, relative and sorted.
#[derive(Debug)]
pub struct WalkResult {
    files: Vec<PathBuf>,
    errors: Vec<String>,
}

impl WalkResult {
    /// Returns root-relative file paths in lexicographic order.
    #[must_use]
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Consumes the result, returning the files.
    #[must_use]
    pub fn into_files(self) -> Vec<PathBuf> {
        self.files
    }

    /// Returns the errors encountered.
    #[must_use]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }
}

/// Builds a `WalkBuilder` with the given options, using `filter_entry` for directory skipping.
pub(super) fn build_walker(root: &Path, options: &WalkOptions) -> WalkBuilder {
    let mut builder = WalkBuilder::new(root);

    builder.follow_links(options.follow_links());
    builder.standard_filters(false);

    if let Some(threads) = options.threads() {
        builder.threads(threads);
    }

    // Evaluated before descending, so skipped trees are never read.
    let skip_dirs: Arc<Vec<String>> = Arc::new(options.skip_dirs().to_vec());
    let skip_paths: Arc<Vec<PathBuf>> = Arc::new(options.skip_paths().to_vec());
    builder.filter_entry(move |entry| {
        if entry.depth() == 0 {
            return true;
        }
        if entry.file_type().is_some_and(|ft| ft.is_dir())
            && let Some(name) = entry.file_name().to_str()
            && skip_dirs.iter().any(|skip| skip == name)
        {
            return false;
        }
        !skip_paths.iter().any(|skip| entry.path().starts_with(skip))
    });

    builder
}

/// Collects every regular file under `root` using `ignore::WalkParallel`.
///
/// Results flow through a bounded flume channel drained by a collector
/// thread while the walk is running.
///
/// # Errors
///
/// Returns `SelectionError::Walk` if the root does not exist.
pub fn parallel_walk<P: AsRef<Path>>(
    root: P,
    options: &WalkOptions,
) -> Result<WalkResult, SelectionError> {
    let root = root.as_ref();

    if !root.is_dir() {
        return Err(SelectionError::Walk {
            root: root.display().to_string(),
            message: "root directory does not exist".to_string(),
        });
    }

    let (file_tx, file_rx) = bounded::<PathBuf>(1000);
    let (err_tx, err_rx) = bounded::<String>(64);
    let root_path = root.to_path_buf();

    let builder = build_walker(root, options);
    let parallel = builder.build_parallel();

    let (mut files, errors) = std::thread::scope(|scope| {
        let files = scope.spawn(move || file_rx.iter().collect::<Vec<_>>());
        let errors = scope.spawn(move || err_rx.iter().collect::<Vec<_>>());

        parallel.run(|| {
            let file_tx = file_tx.clone();
            let err_tx = err_tx.clone();
            let root_path = root_path.clone();

            Box::new(move |entry_result| {
                match entry_result {
                    Ok(entry) => {
                        let is_file = entry.file_type().is_some_and(|ft| {
                            ft.is_file() || (ft.is_symlink() && entry.path().is_file())
                        });
                        if is_file && let Ok(rel) = entry.path().strip_prefix(&root_path) {
                            let _ = file_tx.send(rel.to_path_buf());
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "walk error");
                        let _ = err_tx.send(e.to_string());
                    }
                }
                ignore::WalkState::Continue
            })
        });

        // Drop senders to signal completion
        drop(file_tx);
        drop(err_tx);

        (
            files.join().unwrap_or_default(),
            errors.join().unwrap_or_default(),
        )
    });

    files.sort();
    Ok(WalkResult { files, errors })
}
