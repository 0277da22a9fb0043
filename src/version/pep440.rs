// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! PEP 440 version parsing and canonical normalization.
//!
//! ```text
//! [N!]N(.N)*[{a|b|rc}N][.postN][.devN][+local]
//!
//! " v1.0-ALPHA.2_r3-dev "  →  "1.0a2.post3.dev0"
//! "1.0-1"                  →  "1.0.post1"
//! "1.0+Ubuntu_1-2"         →  "1.0+ubuntu.1.2"
//! ```

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::VersionError;

const VERSION_PATTERN: &str = r"(?ix)
    ^\s*
    v?
    (?:(?P<epoch>[0-9]+)!)?
    (?P<release>[0-9]+(?:\.[0-9]+)*)
    (?P<pre>
        [-_.]?
        (?P<pre_l>alpha|a|beta|b|preview|pre|c|rc)
        [-_.]?
        (?P<pre_n>[0-9]+)?
    )?
    (?P<post>
        (?:-(?P<post_n1>[0-9]+))
        |
        (?:
            [-_.]?
            (?P<post_l>post|rev|r)
            [-_.]?
            (?P<post_n2>[0-9]+)?
        )
    )?
    (?P<dev>
        [-_.]?
        dev
        [-_.]?
        (?P<dev_n>[0-9]+)?
    )?
    (?:\+(?P<local>[a-z0-9]+(?:[-_.][a-z0-9]+)*))?
    \s*$
";

/// Pre-release phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PreRelease {
    Alpha(u64),
    Beta(u64),
    Candidate(u64),
}

impl PreRelease {
    fn from_label(label: &str, n: u64) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "a" | "alpha" => Self::Alpha(n),
            "b" | "beta" => Self::Beta(n),
            _ => Self::Candidate(n),
        }
    }

    /// The next pre-release number, or `None` on overflow.
    #[must_use]
    pub fn bumped(self) -> Option<Self> {
        Some(match self {
            Self::Alpha(n) => Self::Alpha(n.checked_add(1)?),
            Self::Beta(n) => Self::Beta(n.checked_add(1)?),
            Self::Candidate(n) => Self::Candidate(n.checked_add(1)?),
        })
    }
}

/// A parsed PEP 440 version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub epoch: u64,
    pub release: Vec<u64>,
    pub pre: Option<PreRelease>,
    pub post: Option<u64>,
    pub dev: Option<u64>,
    pub local: Vec<String>,
}

fn pattern() -> Result<&'static Regex, VersionError> {
    static RE: OnceLock<Result<Regex, String>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(VERSION_PATTERN).map_err(|e| e.to_string()))
        .as_ref()
        .map_err(|message| VersionError::Invalid {
            version: String::new(),
            message: message.clone(),
        })
}

fn component(raw: &str, version: &str) -> Result<u64, VersionError> {
    raw.parse().map_err(|_| VersionError::Invalid {
        version: version.to_string(),
        message: format!("component '{raw}' is too large"),
    })
}

fn number(raw: Option<regex::Match<'_>>, version: &str) -> Result<u64, VersionError> {
    raw.map_or(Ok(0), |m| component(m.as_str(), version))
}

impl Version {
    /// Parse any PEP 440 spelling of a version.
    ///
    /// # Errors
    ///
    /// Returns `VersionError::Invalid` if the string is not a valid version.
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let caps = pattern()?
            .captures(input)
            .ok_or_else(|| VersionError::Invalid {
                version: input.to_string(),
                message: "not a valid PEP 440 version".to_string(),
            })?;

        let epoch = number(caps.name("epoch"), input)?;
        let release = caps
            .name("release")
            .map(|m| m.as_str())
            .unwrap_or_default()
            .split('.')
            .map(|part| component(part, input))
            .collect::<Result<Vec<_>, _>>()?;

        let pre = match caps.name("pre_l") {
            Some(label) => Some(PreRelease::from_label(
                label.as_str(),
                number(caps.name("pre_n"), input)?,
            )),
            None => None,
        };

        let post = if caps.name("post").is_some() {
            Some(number(caps.name("post_n1").or_else(|| caps.name("post_n2")), input)?)
        } else {
            None
        };

        let dev = if caps.name("dev").is_some() {
            Some(number(caps.name("dev_n"), input)?)
        } else {
            None
        };

        let local = caps
            .name("local")
            .map(|m| {
                m.as_str()
                    .split(['-', '_', '.'])
                    .map(normalize_local_part)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            epoch,
            release,
            pre,
            post,
            dev,
            local,
        })
    }

    /// Next version for an untagged commit: bump the pre-release number when
    /// present, otherwise the last release component (padded to three).
    ///
    /// # Errors
    ///
    /// Returns `VersionError::Invalid` if the bumped component overflows.
    pub fn next_dev(&self, distance: u64) -> Result<Self, VersionError> {
        let mut next = Self {
            epoch: self.epoch,
            release: self.release.clone(),
            pre: self.pre,
            post: None,
            dev: Some(distance),
            local: Vec::new(),
        };
        let overflow = || VersionError::Invalid {
            version: self.to_string(),
            message: "version component is too large to increment".to_string(),
        };
        if let Some(pre) = self.pre {
            next.pre = Some(pre.bumped().ok_or_else(overflow)?);
        } else {
            next.release.resize(next.release.len().max(3), 0);
            if let Some(last) = next.release.last_mut() {
                *last = last.checked_add(1).ok_or_else(overflow)?;
            }
        }
        Ok(next)
    }

    /// Replace the local segment.
    #[must_use]
    pub fn with_local(mut self, parts: impl IntoIterator<Item = String>) -> Self {
        self.local = parts.into_iter().collect();
        self
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch != 0 {
            write!(f, "{}!", self.epoch)?;
        }
        let release: Vec<String> = self.release.iter().map(ToString::to_string).collect();
        f.write_str(&release.join("."))?;
        match self.pre {
            Some(PreRelease::Alpha(n)) => write!(f, "a{n}")?,
            Some(PreRelease::Beta(n)) => write!(f, "b{n}")?,
            Some(PreRelease::Candidate(n)) => write!(f, "rc{n}")?,
            None => {}
        }
        if let Some(n) = self.post {
            write!(f, ".post{n}")?;
        }
        if let Some(n) = self.dev {
            write!(f, ".dev{n}")?;
        }
        if !self.local.is_empty() {
            write!(f, "+{}", self.local.join("."))?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Numeric local parts lose leading zeros; others are lower-cased.
fn normalize_local_part(part: &str) -> String {
    if part.bytes().all(|b| b.is_ascii_digit()) {
        let trimmed = part.trim_start_matches('0');
        if trimmed.is_empty() {
            "0".to_string()
        } else {
            trimmed.to_string()
        }
    } else {
        part.to_ascii_lowercase()
    }
}

/// Normalize a version string to its canonical PEP 440 form.
///
/// # Errors
///
/// Returns `VersionError::Invalid` if the string is not a valid version.
pub fn normalize(input: &str) -> Result<String, VersionError> {
    Version::parse(input).map(|v| v.to_string())
}
