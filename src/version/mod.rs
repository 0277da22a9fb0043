// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Version resolution.
//!
//! ```text
//! VersionSourceConfig --source_for()--> Box<dyn VersionSource>
//!                                            |
//!                                       raw_version()
//!                                            |
//!                                   pep440::normalize()
//!                                            |
//!                                            v
//!                               ResolvedVersion { version, provenance }
//! ```
//!
//! Exactly one source is active per project. Resolution runs once per
//! invocation, before metadata resolution, and the result is shared by all
//! targets.

pub mod expr;
pub mod pep440;

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::BuildSettings;
use crate::config::types::VersionSourceConfig;
use crate::error::{GitError, VersionError};
use crate::git::{GitQuery, GixBackend, ShellBackend};

/// Pattern used by the `regex` source when none is configured.
pub const DEFAULT_VERSION_PATTERN: &str =
    r#"(?im)^\s*(?:__version__|VERSION)\s*(?::\s*str\s*)?=\s*['"]v?(?P<version>[^'"]+)['"]"#;

/// Where a resolved version came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "kebab-case")]
pub enum VersionProvenance {
    Static,
    Regex { path: PathBuf },
    Code { path: PathBuf, expression: String },
    Env { variable: String, defaulted: bool },
    Vcs {
        tag: Option<String>,
        distance: u64,
        dirty: bool,
    },
}

/// A normalized version plus its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedVersion {
    pub version: String,
    pub provenance: VersionProvenance,
}

impl std::fmt::Display for ResolvedVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.version)
    }
}

/// Inputs available to version sources.
#[derive(Debug, Clone, Copy)]
pub struct VersionContext<'a> {
    pub root: &'a Path,
    pub settings: &'a BuildSettings,
}

/// A raw, not yet normalized, version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawVersion {
    pub value: String,
    pub provenance: VersionProvenance,
}

/// A pluggable version source.
pub trait VersionSource: Send + Sync {
    /// Source name used in errors.
    fn name(&self) -> &'static str;

    /// Produce the raw version string.
    ///
    /// # Errors
    ///
    /// Returns `VersionError::NotFound` when the source ran but found nothing
    /// and `VersionError::Source` when the source itself failed.
    fn raw_version(&self, ctx: &VersionContext<'_>) -> Result<RawVersion, VersionError>;
}

/// Literal version.
#[derive(Debug, Clone)]
pub struct StaticSource {
    pub version: String,
}

impl VersionSource for StaticSource {
    fn name(&self) -> &'static str {
        "static"
    }

    fn raw_version(&self, _ctx: &VersionContext<'_>) -> Result<RawVersion, VersionError> {
        Ok(RawVersion {
            value: self.version.clone(),
            provenance: VersionProvenance::Static,
        })
    }
}

/// Regex capture from a text file.
#[derive(Debug, Clone)]
pub struct RegexSource {
    pub path: PathBuf,
    pub pattern: Option<String>,
}

fn read_source_file(root: &Path, path: &Path) -> Result<String, VersionError> {
    let full = root.join(path);
    std::fs::read_to_string(&full).map_err(|source| VersionError::Read {
        path: full.display().to_string(),
        source,
    })
}

impl VersionSource for RegexSource {
    fn name(&self) -> &'static str {
        "regex"
    }

    fn raw_version(&self, ctx: &VersionContext<'_>) -> Result<RawVersion, VersionError> {
        let text = read_source_file(ctx.root, &self.path)?;
        let pattern = self.pattern.as_deref().unwrap_or(DEFAULT_VERSION_PATTERN);
        let re = Regex::new(pattern).map_err(|e| VersionError::Source {
            source_name: "regex",
            message: format!("invalid pattern: {e}"),
        })?;

        let value = re
            .captures(&text)
            .and_then(|caps| caps.name("version").or_else(|| caps.get(1)))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| VersionError::NotFound {
                source_name: "regex",
                detail: format!("no match for pattern in '{}'", self.path.display()),
            })?;

        Ok(RawVersion {
            value,
            provenance: VersionProvenance::Regex {
                path: self.path.clone(),
            },
        })
    }
}

/// Expression evaluated against a module-like file.
#[derive(Debug, Clone)]
pub struct CodeSource {
    pub path: PathBuf,
    pub expression: String,
}

impl VersionSource for CodeSource {
    fn name(&self) -> &'static str {
        "code"
    }

    fn raw_version(&self, ctx: &VersionContext<'_>) -> Result<RawVersion, VersionError> {
        let text = read_source_file(ctx.root, &self.path)?;
        let value = expr::evaluate_version(&text, &self.expression)?;
        Ok(RawVersion {
            value,
            provenance: VersionProvenance::Code {
                path: self.path.clone(),
                expression: self.expression.clone(),
            },
        })
    }
}

/// Environment variable from the invocation snapshot.
#[derive(Debug, Clone)]
pub struct EnvSource {
    pub variable: String,
    pub default: Option<String>,
}

impl VersionSource for EnvSource {
    fn name(&self) -> &'static str {
        "env"
    }

    fn raw_version(&self, ctx: &VersionContext<'_>) -> Result<RawVersion, VersionError> {
        let (value, defaulted) = match ctx.settings.env(&self.variable) {
            Some(value) if !value.is_empty() => (value.to_string(), false),
            _ => (
                self.default.clone().ok_or_else(|| VersionError::NotFound {
                    source_name: "env",
                    detail: format!("environment variable '{}' is not set", self.variable),
                })?,
                true,
            ),
        };
        Ok(RawVersion {
            value,
            provenance: VersionProvenance::Env {
                variable: self.variable.clone(),
                defaulted,
            },
        })
    }
}

/// Nearest reachable git tag.
#[derive(Debug, Clone, Default)]
pub struct VcsSource {
    pub tag_pattern: Option<String>,
    pub fallback_version: Option<String>,
}

fn default_tag_pattern() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:[\w.-]*?[-_/])?[vV]?(?P<version>\d.*)$").ok())
        .as_ref()
}

impl VcsSource {
    fn vcs_error(message: impl Into<String>) -> VersionError {
        VersionError::Source {
            source_name: "vcs",
            message: message.into(),
        }
    }

    fn version_from_tag(&self, tag: &str) -> Result<String, VersionError> {
        let custom = self
            .tag_pattern
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|e| Self::vcs_error(format!("invalid tag-pattern: {e}")))?;
        let re = custom
            .as_ref()
            .or_else(|| default_tag_pattern())
            .ok_or_else(|| Self::vcs_error("tag pattern unavailable"))?;

        re.captures(tag)
            .and_then(|caps| {
                caps.name("version")
                    .or_else(|| caps.get(1))
                    .or_else(|| caps.get(0))
            })
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| Self::vcs_error(format!("tag '{tag}' does not match the tag pattern")))
    }
}

impl VersionSource for VcsSource {
    fn name(&self) -> &'static str {
        "vcs"
    }

    fn raw_version(&self, ctx: &VersionContext<'_>) -> Result<RawVersion, VersionError> {
        if !GixBackend::is_git_repo(ctx.root) {
            return Err(Self::vcs_error(format!(
                "'{}' is not inside a git repository",
                ctx.root.display()
            )));
        }

        let describe = match ShellBackend::describe(ctx.root) {
            Ok(describe) => describe,
            Err(GitError::NoTags { .. }) => {
                let fallback = self.fallback_version.clone().ok_or_else(|| {
                    Self::vcs_error("no tag is reachable from HEAD and no fallback-version is set")
                })?;
                info!(version = %fallback, "No reachable tag, using fallback version");
                return Ok(RawVersion {
                    value: fallback,
                    provenance: VersionProvenance::Vcs {
                        tag: None,
                        distance: 0,
                        dirty: false,
                    },
                });
            }
            Err(e) => return Err(Self::vcs_error(e.to_string())),
        };

        let tag_version = pep440::Version::parse(&self.version_from_tag(&describe.tag)?)?;
        let value = if describe.is_exact() {
            tag_version.to_string()
        } else {
            let mut local = vec![format!("g{}", describe.hash)];
            if describe.dirty {
                local.push("dirty".to_string());
            }
            tag_version
                .next_dev(describe.distance)?
                .with_local(local)
                .to_string()
        };
        debug!(tag = %describe.tag, distance = describe.distance, dirty = describe.dirty, %value, "Described HEAD");

        Ok(RawVersion {
            value,
            provenance: VersionProvenance::Vcs {
                tag: Some(describe.tag),
                distance: describe.distance,
                dirty: describe.dirty,
            },
        })
    }
}

/// Instantiate the source declared by the descriptor.
#[must_use]
pub fn source_for(config: &VersionSourceConfig) -> Box<dyn VersionSource> {
    match config {
        VersionSourceConfig::Static { version } => Box::new(StaticSource {
            version: version.clone(),
        }),
        VersionSourceConfig::Regex { path, pattern } => Box::new(RegexSource {
            path: path.clone(),
            pattern: pattern.clone(),
        }),
        VersionSourceConfig::Code { path, expression } => Box::new(CodeSource {
            path: path.clone(),
            expression: expression.clone(),
        }),
        VersionSourceConfig::Env { variable, default } => Box::new(EnvSource {
            variable: variable.clone(),
            default: default.clone(),
        }),
        VersionSourceConfig::Vcs {
            tag_pattern,
            fallback_version,
        } => Box::new(VcsSource {
            tag_pattern: tag_pattern.clone(),
            fallback_version: fallback_version.clone(),
        }),
    }
}

/// Resolve and normalize the project version.
///
/// # Errors
///
/// Returns a `VersionError` if the source fails or the version does not
/// normalize.
pub fn resolve_version(
    config: &VersionSourceConfig,
    ctx: &VersionContext<'_>,
) -> Result<ResolvedVersion, VersionError> {
    resolve_with(source_for(config).as_ref(), ctx)
}

/// Resolve using an explicit source.
///
/// # Errors
///
/// Returns a `VersionError` if the source fails or the version does not
/// normalize.
pub fn resolve_with(
    source: &dyn VersionSource,
    ctx: &VersionContext<'_>,
) -> Result<ResolvedVersion, VersionError> {
    let raw = source.raw_version(ctx)?;
    let version = pep440::normalize(&raw.value)?;
    info!(source = source.name(), raw = %raw.value, %version, "Resolved version");
    Ok(ResolvedVersion {
        version,
        provenance: raw.provenance,
    })
}
