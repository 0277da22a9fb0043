// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Error handling module.
//!
//! ```text
//!                 PackError (~24 bytes)
//!                        |
//!   +--------+--------+--+-----+-------+------+---------+
//!   |        |        |        |       |      |         |
//!   v        v        v        v       v      v         v
//! Config  Version  Selection  Hook   Build   Io    Cancelled
//!  Box      Box      Box      Box     Box    Box    Box<str>
//!
//! Categories (exit codes):
//!   Configuration (2)  Config, Version
//!   Selection     (3)  EmptySelection, PathNotFound, Collision
//!   Hook          (4)  initialize / finalize / metadata failures
//!   Build         (5)  archive serialization
//!   Io            (6)  output directory, permissions, disk
//!   Cancelled   (130)
//! ```

use std::path::PathBuf;

use thiserror::Error;

use crate::hooks::BuildData;

/// Convenience alias for `anyhow::Result`.
pub type Result<T> = anyhow::Result<T>;

/// Result type using [`PackError`].
pub type PackResult<T> = std::result::Result<T, PackError>;

/// Top-level engine error type.
///
/// All sub-errors are boxed to keep this enum at ~24 bytes on the stack.
#[derive(Debug, Error)]
pub enum PackError {
    /// Malformed descriptor or unresolvable metadata.
    #[error("configuration error: {0}")]
    Config(#[from] Box<ConfigError>),

    /// Version source could not produce a valid version.
    #[error("configuration error: {0}")]
    Version(#[from] Box<VersionError>),

    /// File selection failed.
    #[error("selection error: {0}")]
    Selection(#[from] Box<SelectionError>),

    /// A build or metadata hook failed.
    #[error("hook error: {0}")]
    Hook(#[from] Box<HookError>),

    /// Archive serialization failed.
    #[error("build error: {0}")]
    Build(#[from] Box<BuildError>),

    /// Output directory or file could not be written.
    #[error("io error: {0}")]
    Io(#[from] Box<IoError>),

    /// Target build was cancelled at a stage boundary.
    #[error("build of target '{0}' was cancelled")]
    Cancelled(Box<str>),
}

impl PackError {
    /// Create a [`PackError::Cancelled`] for the given target.
    pub fn cancelled(target: impl Into<String>) -> Self {
        Self::Cancelled(target.into().into_boxed_str())
    }

    /// Returns the failure category used for reporting and exit codes.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(_) | Self::Version(_) => ErrorCategory::Configuration,
            Self::Selection(_) => ErrorCategory::Selection,
            Self::Hook(_) => ErrorCategory::Hook,
            Self::Build(_) => ErrorCategory::Build,
            Self::Io(_) => ErrorCategory::Io,
            Self::Cancelled(_) => ErrorCategory::Cancelled,
        }
    }

    /// Returns the hook error if this is a hook failure.
    #[must_use]
    pub fn as_hook_error(&self) -> Option<&HookError> {
        match self {
            Self::Hook(e) => Some(e),
            _ => None,
        }
    }
}

// --- From implementations for boxing ---

/// Macro to generate `From` implementations that box the source error.
macro_rules! impl_from_boxed {
    ($($error:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$error> for PackError {
                fn from(err: $error) -> Self {
                    PackError::$variant(Box::new(err))
                }
            }
        )+
    };
}

impl_from_boxed! {
    ConfigError => Config,
    VersionError => Version,
    SelectionError => Selection,
    HookError => Hook,
    BuildError => Build,
    IoError => Io,
}

/// Failure category surfaced to the host process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Configuration,
    Selection,
    Hook,
    Build,
    Io,
    Cancelled,
}

impl ErrorCategory {
    /// Returns the category name used in reports.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Configuration => "ConfigurationError",
            Self::Selection => "SelectionError",
            Self::Hook => "HookError",
            Self::Build => "BuildError",
            Self::Io => "IOError",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Returns the process exit code for this category.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Configuration => 2,
            Self::Selection => 3,
            Self::Hook => 4,
            Self::Build => 5,
            Self::Io => 6,
            Self::Cancelled => 130,
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Config Errors ---

/// Descriptor and metadata configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the descriptor file.
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the descriptor or settings file.
    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },

    /// Missing required configuration key.
    #[error("missing required config key '{key}' in section '[{section}]'")]
    MissingKey { section: String, key: String },

    /// Invalid configuration value.
    #[error("invalid value for '{key}' in section '[{section}]': {message}")]
    InvalidValue {
        section: String,
        key: String,
        message: String,
    },

    /// Descriptor file not found.
    #[error("config file not found: {0}")]
    NotFound(String),

    /// A hook name has no registered implementation.
    #[error("unknown {kind} hook '{name}'")]
    UnknownHook { kind: &'static str, name: String },

    /// A requested target is not declared.
    #[error("unknown build target '{0}'")]
    UnknownTarget(String),

    /// A declared-dynamic field was never set by any metadata hook.
    #[error("dynamic metadata field '{field}' was not resolved by any metadata hook")]
    UnresolvedMetadataField { field: String },

    /// A metadata hook modified a field that is not declared dynamic.
    #[error("metadata field '{field}' is not declared dynamic but was modified by hook '{hook}'")]
    StaticFieldOverridden { field: String, hook: String },
}

// --- Version Errors ---

/// Version resolution errors.
#[derive(Debug, Error)]
pub enum VersionError {
    /// The source ran but found no version.
    #[error("version not found ({source_name}): {detail}")]
    NotFound {
        source_name: &'static str,
        detail: String,
    },

    /// The source itself failed.
    #[error("version source '{source_name}' failed: {message}")]
    Source {
        source_name: &'static str,
        message: String,
    },

    /// Failed to read a file referenced by the version source.
    #[error("failed to read version file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The produced version does not normalize.
    #[error("invalid version '{version}': {message}")]
    Invalid { version: String, message: String },
}

// --- Git Errors ---

/// Git query errors.
#[derive(Debug, Error)]
pub enum GitError {
    /// Path is not inside a git work tree.
    #[error("repository not found: {path}")]
    RepoNotFound { path: String },

    /// Git command execution failed.
    #[error("git command failed: {command} - {message}")]
    CommandFailed { command: String, message: String },

    /// No tag is reachable from HEAD.
    #[error("no tags reachable from HEAD in {path}")]
    NoTags { path: String },

    /// `git describe` produced output that could not be parsed.
    #[error("unexpected describe output: '{0}'")]
    UnexpectedDescribe(String),
}

// --- Selection Errors ---

/// File selection errors.
#[derive(Debug, Error)]
pub enum SelectionError {
    /// No files matched and empty selections are not allowed.
    #[error("no files selected for target '{target}'")]
    EmptySelection { target: String },

    /// A force-include source does not exist.
    #[error("force-include source not found: {path}")]
    PathNotFound { path: String },

    /// Two pattern-selected sources map to the same archive path.
    #[error("archive path '{archive_path}' is claimed by both '{first}' and '{second}'")]
    ArchivePathCollision {
        archive_path: String,
        first: String,
        second: String,
    },

    /// A selection pattern is not a valid glob.
    #[error("invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// The project tree could not be traversed.
    #[error("failed to walk '{root}': {message}")]
    Walk { root: String, message: String },
}

// --- Hook Errors ---

/// Lifecycle phase in which a hook ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPhase {
    Initialize,
    Finalize,
    Metadata,
}

impl HookPhase {
    /// Returns the display name for this phase.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::Finalize => "finalize",
            Self::Metadata => "metadata",
        }
    }
}

impl std::fmt::Display for HookPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A single hook failure with its attribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookFailure {
    pub hook: String,
    pub phase: HookPhase,
    pub message: String,
}

impl std::fmt::Display for HookFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "hook '{}' failed during {}: {}",
            self.hook, self.phase, self.message
        )
    }
}

/// Hook execution errors.
#[derive(Debug, Error)]
pub enum HookError {
    /// An initialize step failed; later hooks and the builder were skipped.
    ///
    /// `contributions` holds the build data as left by the hooks that ran
    /// before (and including) the failing one.
    #[error("{failure}")]
    Initialize {
        failure: HookFailure,
        contributions: Box<BuildData>,
    },

    /// One or more finalize steps failed; all finalize steps were attempted.
    #[error("{} finalize step(s) failed: {}", failures.len(), join_failures(failures))]
    Finalize { failures: Vec<HookFailure> },

    /// A metadata hook failed.
    #[error("{0}")]
    Metadata(HookFailure),
}

impl HookError {
    /// Returns the name of the first hook implicated in this error.
    #[must_use]
    pub fn hook_name(&self) -> Option<&str> {
        match self {
            Self::Initialize { failure, .. } | Self::Metadata(failure) => Some(&failure.hook),
            Self::Finalize { failures } => failures.first().map(|f| f.hook.as_str()),
        }
    }

    /// Build data contributed before an initialize failure.
    #[must_use]
    pub fn contributions(&self) -> Option<&BuildData> {
        match self {
            Self::Initialize { contributions, .. } => Some(&**contributions),
            Self::Finalize { .. } | Self::Metadata(_) => None,
        }
    }
}

fn join_failures(failures: &[HookFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// --- Build Errors ---

/// Archive serialization errors.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A selected file could not be read.
    #[error("failed to read '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The archive container could not be written.
    #[error("failed to write {format} archive: {message}")]
    Archive {
        format: &'static str,
        message: String,
    },

    /// No compatibility tag could be determined.
    #[error("cannot determine wheel tag: {0}")]
    Tag(String),

    /// The target pipeline panicked or could not be joined.
    #[error("target '{target}' aborted: {message}")]
    Aborted { target: String, message: String },
}

// --- I/O Errors ---

/// Output directory and artifact write errors.
#[derive(Debug, Error)]
pub enum IoError {
    /// The output directory could not be created.
    #[error("failed to create output directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The temporary artifact could not be written.
    #[error("failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The temporary artifact could not be moved into place.
    #[error("failed to move artifact into place at '{path}': {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
