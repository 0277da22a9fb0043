// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Targets command implementation.

use crate::cli::global::GlobalOptions;
use crate::config::ProjectDescriptor;
use crate::error::{PackError, Result};

/// Lists declared targets with their archive kind.
///
/// # Errors
///
/// Returns an error if the descriptor cannot be loaded.
pub fn run_targets_command(global: &GlobalOptions) -> Result<u8> {
    let descriptor = ProjectDescriptor::load(global.project_root()).map_err(PackError::from)?;

    if global.json {
        let targets: Vec<_> = descriptor
            .targets()
            .map(|t| serde_json::json!({ "name": t.name, "kind": t.kind }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&targets)?);
    } else {
        for target in descriptor.targets() {
            println!("{} ({})", target.name, target.kind);
        }
    }
    Ok(0)
}
