// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Build command implementation.

use std::fmt::Write as _;
use std::sync::Arc;

use crate::cli::build::BuildArgs;
use crate::cli::global::GlobalOptions;
use crate::cmd::{environment_snapshot, load_settings};
use crate::config::ProjectDescriptor;
use crate::engine::manager::ReportSummary;
use crate::engine::{BuildManager, ProjectContext, TargetRegistry, TargetReport};
use crate::error::{HookError, PackError, Result};
use crate::hooks::{BuildData, HookRegistry};
use crate::metadata::MetadataHookRegistry;

/// Main handler for build command.
///
/// Returns the exit code of the first failed target, or 0.
///
/// # Errors
///
/// Returns an error if settings, descriptor, version or metadata cannot be
/// resolved, or if a requested target is unknown.
pub async fn run_build_command(args: &BuildArgs, global: &GlobalOptions) -> Result<u8> {
    let root = global.project_root();
    let settings = load_settings(&root, global, Some(args), environment_snapshot())?;
    let descriptor = ProjectDescriptor::load(&root).map_err(PackError::from)?;

    let targets = TargetRegistry::from_descriptor(&descriptor)
        .resolve(&args.targets)
        .map_err(PackError::from)?;
    tracing::info!(targets = ?targets, "Resolved targets to build");

    let project = ProjectContext::prepare(
        descriptor,
        settings,
        HookRegistry::with_builtins(),
        &MetadataHookRegistry::with_builtins(),
    )?;
    let manager = BuildManager::new(Arc::new(project));

    let cancel_token = manager.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Received Ctrl+C, cancelling remaining stages...");
            cancel_token.cancel();
        }
    });

    let reports = manager.run(&targets).await;

    if global.json {
        let summaries: Vec<ReportSummary<'_>> = reports.iter().map(ReportSummary::from).collect();
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        for report in &reports {
            let line = render_report(report);
            if report.is_success() {
                println!("{line}");
            } else {
                eprintln!("{line}");
            }
        }
    }

    Ok(exit_code(&reports))
}

/// Exit code of the first failed report, or 0.
#[must_use]
pub fn exit_code(reports: &[TargetReport]) -> u8 {
    reports
        .iter()
        .find_map(|r| r.result.as_ref().err())
        .map_or(0, |e| e.category().exit_code())
}

/// One human-readable line per target.
#[must_use]
pub fn render_report(report: &TargetReport) -> String {
    let mut out = String::new();
    match &report.result {
        Ok(outcome) => match &outcome.artifact {
            Some(artifact) => {
                let _ = write!(
                    out,
                    "built {}: {} ({} bytes, sha256 {})",
                    report.target,
                    artifact.path.display(),
                    artifact.size,
                    artifact.sha256
                );
            }
            None => {
                let _ = write!(
                    out,
                    "ran hooks for {}: {}",
                    report.target,
                    outcome.hooks.join(", ")
                );
            }
        },
        Err(e) => {
            let _ = write!(out, "failed {} [{}", report.target, e.category());
            if let Some(hook) = e.as_hook_error().and_then(HookError::hook_name) {
                let _ = write!(out, ", hook '{hook}'");
            }
            let _ = write!(out, "]: {e}");
            if let Some(data) = e.as_hook_error().and_then(HookError::contributions) {
                let _ = write!(out, " (contributed before failure: {})", describe_contributions(data));
            }
        }
    }
    out
}

/// Non-default build data fields, `none` when nothing was contributed.
fn describe_contributions(data: &BuildData) -> String {
    let mut parts = Vec::new();
    if !data.dependencies().is_empty() {
        parts.push(format!("dependencies {}", data.dependencies().join(", ")));
    }
    if let Some(tag) = data.tag() {
        parts.push(format!("tag {tag}"));
    }
    if !data.pure() {
        parts.push("impure".to_string());
    }
    if !data.force_include().is_empty() {
        let mappings: Vec<String> = data
            .force_include()
            .iter()
            .map(|entry| format!("{} -> {}", entry.source.display(), entry.path))
            .collect();
        parts.push(format!("force-include {}", mappings.join(", ")));
    }
    let extra: Vec<&str> = data.extra_metadata().map(|(name, _)| name).collect();
    if !extra.is_empty() {
        parts.push(format!("extra metadata {}", extra.join(", ")));
    }
    if parts.is_empty() {
        "none".to_string()
    } else {
        parts.join("; ")
    }
}
