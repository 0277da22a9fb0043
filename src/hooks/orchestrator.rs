// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Hook lifecycle for one target build.
//!
//! ```text
//!        initialize()                      finalize()
//! Idle ---------------> Initializing(0..n) ---> Ready ---------> Finalizing(0..n) ---> Done
//!                         | hook i fails                           | any step failed
//!                         v                                        v
//!                       Failed  (hooks i+1.. skipped)            Failed (all steps ran)
//! ```

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{HookError, HookFailure, HookPhase, Result};
use crate::version::ResolvedVersion;

use super::{BuildData, BuildHook, FrozenBuildData, HookContext};

/// Lifecycle position of a target build's hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    /// Running the initialize step of the hook at this index.
    Initializing(usize),
    Ready,
    /// Running the finalize step of the hook at this index.
    Finalizing(usize),
    Done,
    Failed,
}

/// One executed hook step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    pub hook: String,
    pub phase: HookPhase,
    pub succeeded: bool,
}

impl std::fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let outcome = if self.succeeded { "ok" } else { "failed" };
        write!(f, "{}:{}:{outcome}", self.hook, self.phase)
    }
}

/// Runs a fixed, ordered list of hooks through the lifecycle.
pub struct HookOrchestrator {
    hooks: Vec<Arc<dyn BuildHook>>,
    state: LifecycleState,
    trace: Vec<TraceEntry>,
}

impl std::fmt::Debug for HookOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookOrchestrator")
            .field("hooks", &self.hook_names().collect::<Vec<_>>())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Runs one hook step, turning a panic into an ordinary failure.
pub(crate) fn guarded(step: impl FnOnce() -> Result<()>) -> std::result::Result<(), String> {
    match catch_unwind(AssertUnwindSafe(step)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(format!("{e:#}")),
        Err(payload) => {
            let detail = payload
                .downcast_ref::<&str>()
                .map(ToString::to_string)
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(format!("hook panicked: {detail}"))
        }
    }
}

impl HookOrchestrator {
    #[must_use]
    pub fn new(hooks: Vec<Arc<dyn BuildHook>>) -> Self {
        Self {
            hooks,
            state: LifecycleState::Idle,
            trace: Vec::new(),
        }
    }

    #[must_use]
    pub const fn state(&self) -> LifecycleState {
        self.state
    }

    /// Steps executed so far, in order.
    #[must_use]
    pub fn trace(&self) -> &[TraceEntry] {
        &self.trace
    }

    pub fn hook_names(&self) -> impl Iterator<Item = &str> {
        self.hooks.iter().map(|h| h.name())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    fn out_of_order(&mut self, phase: HookPhase) -> HookFailure {
        let failure = HookFailure {
            hook: "lifecycle".to_string(),
            phase,
            message: format!("{phase} requested in state {:?}", self.state),
        };
        self.state = LifecycleState::Failed;
        failure
    }

    /// Run every initialize step in order and freeze the result.
    ///
    /// # Errors
    ///
    /// Returns `HookError::Initialize` naming the first failing hook; the
    /// error carries the build data as the preceding hooks left it.
    pub fn initialize(
        &mut self,
        ctx: &HookContext<'_>,
        version: &ResolvedVersion,
        mut data: BuildData,
    ) -> std::result::Result<FrozenBuildData, HookError> {
        if self.state != LifecycleState::Idle {
            return Err(HookError::Initialize {
                failure: self.out_of_order(HookPhase::Initialize),
                contributions: Box::new(data),
            });
        }

        for (index, hook) in self.hooks.iter().enumerate() {
            self.state = LifecycleState::Initializing(index);
            let name = hook.name();
            let hook_ctx = ctx.for_hook(name);
            debug!(target = %ctx.target_name(), hook = %name, phase = "initialize", "Running hook");

            let outcome = guarded(|| hook.initialize(&hook_ctx, version, &mut data));
            self.trace.push(TraceEntry {
                hook: name.to_string(),
                phase: HookPhase::Initialize,
                succeeded: outcome.is_ok(),
            });

            if let Err(message) = outcome {
                warn!(target = %ctx.target_name(), hook = %name, phase = "initialize", error = %message, "Hook failed");
                self.state = LifecycleState::Failed;
                return Err(HookError::Initialize {
                    failure: HookFailure {
                        hook: name.to_string(),
                        phase: HookPhase::Initialize,
                        message,
                    },
                    contributions: Box::new(data),
                });
            }
        }

        self.state = LifecycleState::Ready;
        Ok(data.freeze())
    }

    /// Run every finalize step in order, collecting failures.
    ///
    /// # Errors
    ///
    /// Returns `HookError::Finalize` with every failure once all steps ran.
    pub fn finalize(
        &mut self,
        ctx: &HookContext<'_>,
        version: &ResolvedVersion,
        data: &FrozenBuildData,
        artifact: Option<&Path>,
    ) -> std::result::Result<(), HookError> {
        if self.state != LifecycleState::Ready {
            return Err(HookError::Finalize {
                failures: vec![self.out_of_order(HookPhase::Finalize)],
            });
        }

        let mut failures = Vec::new();
        for (index, hook) in self.hooks.iter().enumerate() {
            self.state = LifecycleState::Finalizing(index);
            let name = hook.name();
            let hook_ctx = ctx.for_hook(name);
            debug!(target = %ctx.target_name(), hook = %name, phase = "finalize", "Running hook");

            let outcome = guarded(|| hook.finalize(&hook_ctx, version, data, artifact));
            self.trace.push(TraceEntry {
                hook: name.to_string(),
                phase: HookPhase::Finalize,
                succeeded: outcome.is_ok(),
            });

            if let Err(message) = outcome {
                warn!(target = %ctx.target_name(), hook = %name, phase = "finalize", error = %message, "Hook failed");
                failures.push(HookFailure {
                    hook: name.to_string(),
                    phase: HookPhase::Finalize,
                    message,
                });
            }
        }

        if failures.is_empty() {
            self.state = LifecycleState::Done;
            Ok(())
        } else {
            self.state = LifecycleState::Failed;
            Err(HookError::Finalize { failures })
        }
    }
}
