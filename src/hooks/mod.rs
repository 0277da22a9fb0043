// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Build hooks.
//!
//! # Architecture
//!
//! ```text
//! HookRegistry (name -> factory)
//!      |  resolve(specs, settings)       enablement filter
//!      v
//! Vec<Arc<dyn BuildHook>>  (declaration order: shared, then target)
//!      |
//!      v
//! HookOrchestrator
//!   Idle -> Initializing(i) -> Ready -> Finalizing(i) -> Done
//!              |                            |
//!              +--------> Failed <----------+
//!
//! initialize(ctx, version, &mut BuildData)
//!        BuildData::freeze() --> FrozenBuildData --> Builder
//! finalize(ctx, version, &FrozenBuildData, Option<&Path>)
//! ```
//!
//! # Key Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`BuildHook`] | Extension point run around each target build |
//! | [`BuildData`] | Contributions hooks make during initialize |
//! | [`FrozenBuildData`] | Read-only view handed to the builder and finalize |
//! | [`HookContext`] | Per-invocation inputs for a hook |
//! | [`HookOrchestrator`] | Lifecycle state machine for one target |
//! | [`HookRegistry`] | Static mapping from hook names to factories |
//!
//! # `BuildData` semantics
//!
//! `set_*` methods are last-writer-wins; `add_*` methods append. Hooks see
//! the contributions of every hook that ran before them.

pub mod builtin;
pub mod orchestrator;
pub mod registry;


use std::collections::BTreeMap;
use std::ops::Deref;
use std::path::Path;

use anyhow::bail;
use serde::{Serialize, Serializer};

use crate::config::BuildSettings;
use crate::config::types::{ForceInclude, TargetConfig, TargetKind};
use crate::error::Result;
use crate::logging::LogContext;
use crate::utility::fs::path::normalize_archive_path;
use crate::version::ResolvedVersion;

pub use orchestrator::{HookOrchestrator, LifecycleState, TraceEntry};
pub use registry::{HookRegistry, Registry};

/// Build contributions collected from hooks for one target build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildData {
    tag: Option<String>,
    infer_tag: bool,
    pure: bool,
    dependencies: Vec<String>,
    force_include: Vec<ForceInclude>,
    #[serde(serialize_with = "serialize_file_names")]
    extra_metadata: BTreeMap<String, Vec<u8>>,
}

fn serialize_file_names<S: Serializer>(
    files: &BTreeMap<String, Vec<u8>>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_seq(files.keys())
}

impl Default for BuildData {
    fn default() -> Self {
        Self {
            tag: None,
            infer_tag: false,
            pure: true,
            dependencies: Vec::new(),
            force_include: Vec::new(),
            extra_metadata: BTreeMap::new(),
        }
    }
}

impl BuildData {
    /// Initial build data for a target, seeded from its configuration.
    #[must_use]
    pub fn for_target(target: &TargetConfig) -> Self {
        Self {
            infer_tag: target.infer_tag,
            ..Self::default()
        }
    }

    /// Request an explicit wheel tag.
    pub fn set_tag(&mut self, tag: impl Into<String>) {
        self.tag = Some(tag.into());
    }

    pub fn set_infer_tag(&mut self, infer: bool) {
        self.infer_tag = infer;
    }

    /// Declare whether the wheel contains only platform-independent code.
    pub fn set_pure(&mut self, pure: bool) {
        self.pure = pure;
    }

    /// Append a requirement to the distribution's dependencies.
    pub fn add_dependency(&mut self, requirement: impl Into<String>) {
        self.dependencies.push(requirement.into());
    }

    /// Append a force-include mapping applied on top of the file selection.
    pub fn add_force_include(&mut self, entry: ForceInclude) {
        self.force_include.push(entry);
    }

    /// Add a file shipped under `<dist-info>/extra_metadata/`.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is not a relative archive path.
    pub fn add_extra_metadata(&mut self, name: &str, contents: impl Into<Vec<u8>>) -> Result<()> {
        let Some(name) = normalize_archive_path(name) else {
            bail!("invalid extra metadata file name '{name}'");
        };
        self.extra_metadata.insert(name, contents.into());
        Ok(())
    }

    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    #[must_use]
    pub const fn infer_tag(&self) -> bool {
        self.infer_tag
    }

    #[must_use]
    pub const fn pure(&self) -> bool {
        self.pure
    }

    #[must_use]
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    #[must_use]
    pub fn force_include(&self) -> &[ForceInclude] {
        &self.force_include
    }

    /// Extra metadata files in name order.
    pub fn extra_metadata(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.extra_metadata
            .iter()
            .map(|(name, bytes)| (name.as_str(), bytes.as_slice()))
    }

    /// End the initialize phase.
    #[must_use]
    pub fn freeze(self) -> FrozenBuildData {
        FrozenBuildData(self)
    }
}

/// Read-only build data, produced by [`BuildData::freeze`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FrozenBuildData(BuildData);

impl Deref for FrozenBuildData {
    type Target = BuildData;

    fn deref(&self) -> &BuildData {
        &self.0
    }
}

/// Inputs available to a hook while it runs.
#[derive(Debug, Clone)]
pub struct HookContext<'a> {
    root: &'a Path,
    target: &'a TargetConfig,
    work_dir: &'a Path,
    settings: &'a BuildSettings,
    log: LogContext,
}

impl<'a> HookContext<'a> {
    #[must_use]
    pub fn new(
        root: &'a Path,
        target: &'a TargetConfig,
        work_dir: &'a Path,
        settings: &'a BuildSettings,
    ) -> Self {
        Self {
            root,
            target,
            work_dir,
            settings,
            log: LogContext::with_target(target.name.clone()),
        }
    }

    /// Same context, attributed to `hook`.
    #[must_use]
    pub fn for_hook(&self, hook: &str) -> Self {
        let mut ctx = self.clone();
        ctx.log.set_hook(hook);
        ctx
    }

    /// Project root.
    #[must_use]
    pub const fn root(&self) -> &'a Path {
        self.root
    }

    #[must_use]
    pub fn target_name(&self) -> &'a str {
        &self.target.name
    }

    #[must_use]
    pub const fn target_kind(&self) -> TargetKind {
        self.target.kind
    }

    /// Scratch directory private to this target build.
    #[must_use]
    pub const fn work_dir(&self) -> &'a Path {
        self.work_dir
    }

    #[must_use]
    pub const fn settings(&self) -> &'a BuildSettings {
        self.settings
    }

    #[must_use]
    pub const fn log(&self) -> &LogContext {
        &self.log
    }
}

/// A build-time extension run around one target build.
///
/// Hooks are instantiated once per invocation from their declaration and may
/// run for several targets concurrently, so implementations keep no
/// per-target state.
pub trait BuildHook: Send + Sync {
    /// Name used for enablement and error attribution.
    fn name(&self) -> &str;

    /// Contribute build data before the archive is built.
    ///
    /// # Errors
    ///
    /// A failure aborts the target: later hooks and the builder are skipped.
    fn initialize(
        &self,
        _ctx: &HookContext<'_>,
        _version: &ResolvedVersion,
        _data: &mut BuildData,
    ) -> Result<()> {
        Ok(())
    }

    /// Observe the finished build. `artifact` is `None` in hooks-only mode.
    ///
    /// # Errors
    ///
    /// Failures are collected; every other finalize step still runs.
    fn finalize(
        &self,
        _ctx: &HookContext<'_>,
        _version: &ResolvedVersion,
        _data: &FrozenBuildData,
        _artifact: Option<&Path>,
    ) -> Result<()> {
        Ok(())
    }
}
