// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Build engine.
//!
//! # Pipeline
//!
//! ```text
//! ProjectContext::prepare (once per invocation)
//!   descriptor + settings --> version --> metadata hooks --> ResolvedMetadata
//!
//! run_target (per target, strictly sequential)
//!   [select] --> [initialize] --> [build] --> [write] --> [finalize]
//!       ^ cancellation is checked before every stage
//!
//! BuildManager (per invocation)
//!   targets run concurrently on the blocking pool, bounded by a semaphore
//! ```
//!
//! # Key Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`ProjectContext`] | Read-only state shared by every target |
//! | [`TargetOutcome`] | Result of one successful target build |
//! | [`BuildManager`] | Concurrent execution of several targets |
//! | [`TargetRegistry`] | Target name and glob resolution |

pub mod manager;
pub mod registry;

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::artifact::{Artifact, write_artifact};
use crate::builder::{BuildInput, BuildTimestamp, TagEnvironment, builder_for};
use crate::config::types::{TargetConfig, TargetKind};
use crate::config::{BuildSettings, ProjectDescriptor};
use crate::error::{ConfigError, IoError, PackError, PackResult};
use crate::hooks::{BuildData, FrozenBuildData, HookContext, HookOrchestrator, HookRegistry};
use crate::metadata::{MetadataHookRegistry, ResolvedMetadata, resolve_metadata};
use crate::select::{GitignoreOracle, IgnoreOracle, NoIgnore, SelectionContext, select};
use crate::utility::fs::walk::{WalkOptions, parallel_walk};
use crate::version::{ResolvedVersion, VersionContext, resolve_version};

pub use manager::{BuildManager, TargetReport};
pub use registry::TargetRegistry;

/// Pipeline stage of a target build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Select,
    Initialize,
    Build,
    Write,
    Finalize,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Select => "select",
            Self::Initialize => "initialize",
            Self::Build => "build",
            Self::Write => "write",
            Self::Finalize => "finalize",
        })
    }
}

/// State shared read-only by every target of one invocation.
pub struct ProjectContext {
    descriptor: ProjectDescriptor,
    settings: BuildSettings,
    version: ResolvedVersion,
    metadata: ResolvedMetadata,
    hooks: HookRegistry,
    oracle: Box<dyn IgnoreOracle>,
    tags: TagEnvironment,
    output_dir: PathBuf,
}

impl std::fmt::Debug for ProjectContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectContext")
            .field("project", &self.descriptor.name())
            .field("version", &self.version.version)
            .field("output_dir", &self.output_dir)
            .finish_non_exhaustive()
    }
}

impl ProjectContext {
    /// Resolve the version and metadata of a project.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the version cannot be resolved, a
    /// metadata hook is unknown or misconfigured, or a dynamic field stays
    /// unresolved; a hook error if a metadata hook fails.
    pub fn prepare(
        descriptor: ProjectDescriptor,
        settings: BuildSettings,
        hooks: HookRegistry,
        metadata_hooks: &MetadataHookRegistry,
    ) -> PackResult<Self> {
        let root = descriptor.root().to_path_buf();
        let version = resolve_version(
            descriptor.version_source(),
            &VersionContext {
                root: &root,
                settings: &settings,
            },
        )?;
        let resolved_hooks = metadata_hooks.resolve(descriptor.metadata_hooks(), &settings)?;
        let metadata = resolve_metadata(&descriptor, &version, &resolved_hooks, &settings)?;

        let oracle = ignore_oracle(&descriptor)?;
        let tags = TagEnvironment::from_settings(&settings);
        let output_dir = settings.output_dir(&root, descriptor.output_dir());
        info!(
            project = %descriptor.name(),
            version = %version,
            output = %output_dir.display(),
            "Project prepared"
        );
        Ok(Self {
            descriptor,
            settings,
            version,
            metadata,
            hooks,
            oracle,
            tags,
            output_dir,
        })
    }

    #[must_use]
    pub const fn descriptor(&self) -> &ProjectDescriptor {
        &self.descriptor
    }

    #[must_use]
    pub const fn settings(&self) -> &BuildSettings {
        &self.settings
    }

    #[must_use]
    pub const fn version(&self) -> &ResolvedVersion {
        &self.version
    }

    #[must_use]
    pub const fn metadata(&self) -> &ResolvedMetadata {
        &self.metadata
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn root(&self) -> &Path {
        self.descriptor.root()
    }
}

/// VCS ignore rules, loaded only when some target filters by them.
fn ignore_oracle(descriptor: &ProjectDescriptor) -> PackResult<Box<dyn IgnoreOracle>> {
    if descriptor.targets().all(|t| t.rules.ignore_vcs) {
        return Ok(Box::new(NoIgnore));
    }
    let walked = parallel_walk(descriptor.root(), &WalkOptions::default())?;
    Ok(Box::new(GitignoreOracle::discover(
        descriptor.root(),
        walked.files(),
    )))
}

/// A successfully built target.
#[derive(Debug, Clone, Serialize)]
pub struct TargetOutcome {
    pub target: String,
    pub kind: TargetKind,
    /// `None` in hooks-only mode.
    pub artifact: Option<Artifact>,
    pub files: usize,
    pub build_data: FrozenBuildData,
    /// Executed hook steps, e.g. `version-file:initialize:ok`.
    pub hooks: Vec<String>,
}

fn checkpoint(cancel: &CancellationToken, target: &str, stage: Stage) -> PackResult<()> {
    if cancel.is_cancelled() {
        info!(%target, %stage, "Cancelled before stage");
        return Err(PackError::cancelled(target));
    }
    debug!(%target, %stage, "Entering stage");
    Ok(())
}

/// Build one target through every stage.
///
/// Runs on the calling thread and blocks.
///
/// # Errors
///
/// Returns the error of the first failing stage, or `PackError::Cancelled`
/// when `cancel` fired before a stage started. A finalize failure is
/// reported after the artifact was written; the artifact stays in place.
pub fn run_target(
    project: &ProjectContext,
    target_name: &str,
    cancel: &CancellationToken,
) -> PackResult<TargetOutcome> {
    let target = project
        .descriptor
        .target(target_name)
        .ok_or_else(|| ConfigError::UnknownTarget(target_name.to_string()))?;
    let root = project.root();
    let settings = &project.settings;

    checkpoint(cancel, target_name, Stage::Select)?;
    let hooks = project.hooks.resolve(&target.hooks, settings)?;
    let package_name = project.descriptor.dist_name();
    let mut selection = select(
        target,
        &SelectionContext {
            root,
            package_name: &package_name,
            output_dir: Some(&project.output_dir),
        },
        project.oracle.as_ref(),
    )?;
    info!(target = %target_name, files = selection.len(), "Files selected");

    checkpoint(cancel, target_name, Stage::Initialize)?;
    let work_dir = scratch_dir(target)?;
    let hook_ctx = HookContext::new(root, target, work_dir.path(), settings);
    let mut orchestrator = HookOrchestrator::new(hooks);
    let data = orchestrator.initialize(&hook_ctx, &project.version, BuildData::for_target(target))?;
    selection.overlay_force_include(root, data.force_include())?;

    let artifact = if settings.hooks_only {
        info!(target = %target_name, "Hooks-only mode, skipping build");
        None
    } else {
        checkpoint(cancel, target_name, Stage::Build)?;
        let built = builder_for(target.kind).build(&BuildInput {
            descriptor: &project.descriptor,
            target,
            metadata: &project.metadata,
            selection: &selection,
            build_data: &data,
            timestamp: BuildTimestamp::resolve(settings, target.reproducible),
            tags: &project.tags,
        })?;

        checkpoint(cancel, target_name, Stage::Write)?;
        Some(write_artifact(&project.output_dir, &built.file_name, &built.bytes)?)
    };

    checkpoint(cancel, target_name, Stage::Finalize)?;
    orchestrator.finalize(
        &hook_ctx,
        &project.version,
        &data,
        artifact.as_ref().map(|a| a.path.as_path()),
    )?;

    Ok(TargetOutcome {
        target: target_name.to_string(),
        kind: target.kind,
        artifact,
        files: selection.len(),
        hooks: orchestrator.trace().iter().map(ToString::to_string).collect(),
        build_data: data,
    })
}

/// Private scratch directory for one target build, removed on drop.
fn scratch_dir(target: &TargetConfig) -> PackResult<tempfile::TempDir> {
    tempfile::Builder::new()
        .prefix(&format!("packsmith-{}-", target.name))
        .tempdir()
        .map_err(|source| {
            IoError::CreateDir {
                path: std::env::temp_dir(),
                source,
            }
            .into()
        })
}
