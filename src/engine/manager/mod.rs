// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Concurrent execution of target pipelines.
//!
//! ```text
//! BuildManager::new(Arc<ProjectContext>)
//!   .with_concurrency(n)  .cancel_token()
//!   .run(&targets).await
//!       per target: permit --> spawn_blocking(run_target) --> TargetReport
//!       reports are returned in request order
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::error::{BuildError, HookError, PackError, PackResult};
use crate::hooks::BuildData;

use super::{ProjectContext, TargetOutcome, run_target};

/// Outcome of one requested target.
#[derive(Debug)]
pub struct TargetReport {
    pub target: String,
    pub result: PackResult<TargetOutcome>,
}

impl TargetReport {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Serializable summary of a report.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ReportSummary<'a> {
    Ok(&'a TargetOutcome),
    Failed {
        target: &'a str,
        category: &'static str,
        hook: Option<&'a str>,
        error: String,
        /// Build data gathered by the hooks that ran before an initialize failure.
        #[serde(skip_serializing_if = "Option::is_none")]
        contributions: Option<&'a BuildData>,
    },
}

impl<'a> From<&'a TargetReport> for ReportSummary<'a> {
    fn from(report: &'a TargetReport) -> Self {
        match &report.result {
            Ok(outcome) => Self::Ok(outcome),
            Err(e) => Self::Failed {
                target: &report.target,
                category: e.category().as_str(),
                hook: e.as_hook_error().and_then(HookError::hook_name),
                error: e.to_string(),
                contributions: e.as_hook_error().and_then(HookError::contributions),
            },
        }
    }
}

/// Runs target pipelines concurrently.
///
/// Targets share only the [`ProjectContext`]; a failing target never affects
/// its siblings.
pub struct BuildManager {
    project: Arc<ProjectContext>,
    cancel_token: CancellationToken,
    concurrency_semaphore: Arc<Semaphore>,
}

impl BuildManager {
    /// Creates a manager limited to the number of CPU cores.
    #[must_use]
    pub fn new(project: Arc<ProjectContext>) -> Self {
        let max_concurrent = std::thread::available_parallelism()
            .map(std::num::NonZeroUsize::get)
            .unwrap_or(4);
        Self::with_concurrency(project, max_concurrent)
    }

    #[must_use]
    pub fn with_concurrency(project: Arc<ProjectContext>, max_concurrent: usize) -> Self {
        Self {
            project,
            cancel_token: CancellationToken::new(),
            concurrency_semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Token shared with every running pipeline.
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Requests cancellation; pipelines stop at their next stage boundary.
    pub fn interrupt_all(&self) {
        info!("Interrupting all targets");
        self.cancel_token.cancel();
    }

    #[must_use]
    pub const fn project(&self) -> &Arc<ProjectContext> {
        &self.project
    }

    /// Build every target in `targets`.
    ///
    /// Reports come back in the order of `targets`.
    pub async fn run(&self, targets: &[String]) -> Vec<TargetReport> {
        info!(target_count = targets.len(), "Starting build");
        let mut set = JoinSet::new();
        let mut task_targets = HashMap::new();

        for (index, name) in targets.iter().enumerate() {
            let permit = match Arc::clone(&self.concurrency_semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    error!(target = %name, error = %e, "Concurrency limiter closed");
                    break;
                }
            };
            let project = Arc::clone(&self.project);
            let cancel = self.cancel_token.clone();
            let owned = name.clone();
            let handle = set.spawn_blocking(move || {
                let _permit = permit;
                (index, run_target(&project, &owned, &cancel))
            });
            task_targets.insert(handle.id(), index);
        }

        let mut results: Vec<Option<PackResult<TargetOutcome>>> =
            targets.iter().map(|_| None).collect();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, result)) => results[index] = Some(result),
                Err(e) => {
                    if let Some(&index) = task_targets.get(&e.id()) {
                        error!(target = %targets[index], error = %e, "Target pipeline panicked");
                        results[index] = Some(Err(BuildError::Aborted {
                            target: targets[index].clone(),
                            message: e.to_string(),
                        }
                        .into()));
                    }
                }
            }
        }

        let reports: Vec<TargetReport> = targets
            .iter()
            .zip(results)
            .map(|(target, result)| TargetReport {
                target: target.clone(),
                result: result.unwrap_or_else(|| Err(PackError::cancelled(target.as_str()))),
            })
            .collect();

        for report in &reports {
            match &report.result {
                Ok(outcome) => info!(
                    target = %report.target,
                    artifact = ?outcome.artifact.as_ref().map(|a| a.path.display().to_string()),
                    "Target built"
                ),
                Err(e) => error!(
                    target = %report.target,
                    category = %e.category(),
                    error = %e,
                    "Target failed"
                ),
            }
        }
        reports
    }
}
