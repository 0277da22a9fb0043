// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Metadata command implementation.

use serde::Serialize;

use crate::cli::global::GlobalOptions;
use crate::cmd::{environment_snapshot, load_settings};
use crate::config::{BuildSettings, ProjectDescriptor};
use crate::error::{PackError, PackResult, Result};
use crate::metadata::{MetadataHookRegistry, ResolvedMetadata, resolve_metadata};
use crate::version::{ResolvedVersion, VersionContext, resolve_version};

#[derive(Serialize)]
struct MetadataReport {
    version: ResolvedVersion,
    metadata: ResolvedMetadata,
}

fn resolve(descriptor: &ProjectDescriptor, settings: &BuildSettings) -> PackResult<MetadataReport> {
    let version = resolve_version(
        descriptor.version_source(),
        &VersionContext {
            root: descriptor.root(),
            settings,
        },
    )?;
    let hooks =
        MetadataHookRegistry::with_builtins().resolve(descriptor.metadata_hooks(), settings)?;
    let metadata = resolve_metadata(descriptor, &version, &hooks, settings)?;
    Ok(MetadataReport { version, metadata })
}

/// Prints the resolved version and core metadata as JSON.
///
/// Runs the version source and metadata hooks but no build hooks.
///
/// # Errors
///
/// Returns an error if settings, version or metadata cannot be resolved.
pub fn run_metadata_command(global: &GlobalOptions) -> Result<u8> {
    let root = global.project_root();
    let settings = load_settings(&root, global, None, environment_snapshot())?;
    let descriptor = ProjectDescriptor::load(&root).map_err(PackError::from)?;
    let report = resolve(&descriptor, &settings)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(0)
}
