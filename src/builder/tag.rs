// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Wheel compatibility tags.
//!
//! Precedence, first match wins:
//!
//! ```text
//! 1. tag set by a build hook
//! 2. `tag` of the target
//! 3. inferred from the build environment   (infer-tag = true)
//! 4. py3-none-any                           (pure)
//! 5. py3-none-<platform>                    (not pure)
//! ```

use crate::config::BuildSettings;
use crate::config::types::TargetConfig;
use crate::error::BuildError;
use crate::hooks::BuildData;

/// Interpreter, ABI and platform of the build environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagEnvironment {
    pub python: String,
    pub abi: String,
    pub platform: String,
}

impl Default for TagEnvironment {
    fn default() -> Self {
        Self {
            python: "py3".to_string(),
            abi: "none".to_string(),
            platform: host_platform(),
        }
    }
}

impl TagEnvironment {
    /// Host defaults overridden by tags passed in settings.
    #[must_use]
    pub fn from_settings(settings: &BuildSettings) -> Self {
        let host = Self::default();
        Self {
            python: settings.python_tag.clone().unwrap_or(host.python),
            abi: settings.abi_tag.clone().unwrap_or(host.abi),
            platform: settings.platform_tag.clone().unwrap_or(host.platform),
        }
    }

    #[must_use]
    pub fn inferred(&self) -> String {
        format!("{}-{}-{}", self.python, self.abi, self.platform)
    }
}

/// Platform tag of the running host, e.g. `linux_x86_64`.
#[must_use]
pub fn host_platform() -> String {
    let arch = std::env::consts::ARCH;
    match std::env::consts::OS {
        "windows" => match arch {
            "x86_64" => "win_amd64".to_string(),
            "aarch64" => "win_arm64".to_string(),
            _ => "win32".to_string(),
        },
        "macos" => format!("macosx_11_0_{arch}"),
        os => format!("{os}_{arch}").replace(['-', '.'], "_"),
    }
}

/// Determine the compatibility tag of a wheel.
///
/// # Errors
///
/// Returns `BuildError::Tag` if the chosen tag is not of the form
/// `python-abi-platform`.
pub fn resolve_tag(
    data: &BuildData,
    target: &TargetConfig,
    env: &TagEnvironment,
) -> Result<String, BuildError> {
    let tag = if let Some(tag) = data.tag() {
        tag.to_string()
    } else if let Some(tag) = &target.tag {
        tag.clone()
    } else if data.infer_tag() {
        env.inferred()
    } else if data.pure() {
        "py3-none-any".to_string()
    } else {
        format!("py3-none-{}", env.platform)
    };
    validate(&tag)?;
    Ok(tag)
}

fn validate(tag: &str) -> Result<(), BuildError> {
    let parts: Vec<&str> = tag.split('-').collect();
    if parts.len() != 3 || parts.iter().any(|part| part.is_empty()) {
        return Err(BuildError::Tag(format!(
            "'{tag}' is not of the form python-abi-platform"
        )));
    }
    Ok(())
}

/// Expand a compressed tag set into individual tags.
///
/// `py2.py3-none-any` yields `py2-none-any` and `py3-none-any`.
#[must_use]
pub fn expand(tag: &str) -> Vec<String> {
    let mut parts = tag.splitn(3, '-');
    let (Some(python), Some(abi), Some(platform)) = (parts.next(), parts.next(), parts.next())
    else {
        return vec![tag.to_string()];
    };
    let mut tags = Vec::new();
    for py in python.split('.') {
        for ab in abi.split('.') {
            for plat in platform.split('.') {
                tags.push(format!("{py}-{ab}-{plat}"));
            }
        }
    }
    tags
}
