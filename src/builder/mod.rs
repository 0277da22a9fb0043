// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Archive builders.
//!
//! ```text
//! BuildInput { descriptor, target, metadata, selection, build data, timestamp, tags }
//!      |
//!      +-- kind = wheel --> WheelBuilder --> <dist>-<ver>-<tag>.whl   (zip, deflate)
//!      |                      selected files, <dist>-<ver>.dist-info/{METADATA,WHEEL,
//!      |                      entry_points.txt, extra_metadata/*, RECORD}
//!      |
//!      +-- kind = sdist --> SdistBuilder --> <dist>-<ver>.tar.gz      (GNU tar, gzip)
//!                             <dist>-<ver>/{selected files, pyproject.toml, PKG-INFO}
//! ```
//!
//! Builders produce the archive in memory; writing it out is the artifact
//! writer's job. Equal inputs give byte-identical archives.

pub mod sdist;
pub mod tag;
pub mod wheel;


use std::path::Path;

use chrono::{DateTime, Datelike, Timelike, Utc};

use crate::config::types::{TargetConfig, TargetKind};
use crate::config::{BuildSettings, ProjectDescriptor};
use crate::error::BuildError;
use crate::hooks::FrozenBuildData;
use crate::metadata::ResolvedMetadata;
use crate::select::FileSelection;

pub use sdist::SdistBuilder;
pub use tag::TagEnvironment;
pub use wheel::WheelBuilder;

/// Timestamp stamped on every archive member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BuildTimestamp(i64);

impl BuildTimestamp {
    /// 1980-01-01T00:00:00Z, the earliest time a zip entry can carry.
    pub const ZIP_EPOCH: i64 = 315_532_800;

    #[must_use]
    pub const fn from_seconds(seconds: i64) -> Self {
        Self(seconds)
    }

    /// `SOURCE_DATE_EPOCH` if set, else the zip epoch for reproducible
    /// targets, else now.
    #[must_use]
    pub fn resolve(settings: &BuildSettings, reproducible: bool) -> Self {
        match settings.source_date_epoch {
            Some(epoch) => Self(epoch),
            None if reproducible => Self(Self::ZIP_EPOCH),
            None => Self(Utc::now().timestamp()),
        }
    }

    #[must_use]
    pub const fn seconds(&self) -> i64 {
        self.0
    }

    /// Modification time for zip entries, clamped to the representable range.
    #[must_use]
    pub fn zip_datetime(&self) -> zip::DateTime {
        let time = DateTime::<Utc>::from_timestamp(self.0.max(Self::ZIP_EPOCH), 0)
            .unwrap_or_default()
            .naive_utc();
        let year = u16::try_from(time.year().clamp(1980, 2107)).unwrap_or(1980);
        // Fields below are in range by construction of NaiveDateTime.
        let [month, day, hour, minute, second] = [
            time.month(),
            time.day(),
            time.hour(),
            time.minute(),
            time.second(),
        ]
        .map(|v| u8::try_from(v).unwrap_or(0));
        zip::DateTime::from_date_and_time(year, month, day, hour, minute, second)
            .unwrap_or_default()
    }

    /// Modification time for tar headers.
    #[must_use]
    pub fn tar_mtime(&self) -> u64 {
        u64::try_from(self.0).unwrap_or(0)
    }

    /// Modification time for the gzip header.
    #[must_use]
    pub fn gzip_mtime(&self) -> u32 {
        u32::try_from(self.0).unwrap_or(0)
    }
}

/// Everything a builder needs for one target.
#[derive(Debug, Clone, Copy)]
pub struct BuildInput<'a> {
    pub descriptor: &'a ProjectDescriptor,
    pub target: &'a TargetConfig,
    pub metadata: &'a ResolvedMetadata,
    pub selection: &'a FileSelection,
    pub build_data: &'a FrozenBuildData,
    pub timestamp: BuildTimestamp,
    pub tags: &'a TagEnvironment,
}

impl BuildInput<'_> {
    /// Version as used in archive file names.
    #[must_use]
    pub fn file_version(&self) -> String {
        self.metadata.version.replace('-', "_")
    }
}

/// A finished in-memory archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltArchive {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Serializes a target into one archive.
pub trait ArchiveBuilder: Send + Sync {
    fn kind(&self) -> TargetKind;

    /// Build the archive.
    ///
    /// # Errors
    ///
    /// Returns `BuildError::ReadFile` if a selected file cannot be read and
    /// `BuildError::Archive` if serialization fails.
    fn build(&self, input: &BuildInput<'_>) -> Result<BuiltArchive, BuildError>;
}

/// Builder for a target kind.
#[must_use]
pub fn builder_for(kind: TargetKind) -> Box<dyn ArchiveBuilder> {
    match kind {
        TargetKind::Wheel => Box::new(WheelBuilder),
        TargetKind::Sdist => Box::new(SdistBuilder),
    }
}

/// Contents and permission bits of a selected file.
pub(crate) fn read_member(source: &Path) -> Result<(Vec<u8>, u32), BuildError> {
    let read_error = |source_err| BuildError::ReadFile {
        path: source.to_path_buf(),
        source: source_err,
    };
    let bytes = std::fs::read(source).map_err(read_error)?;
    let metadata = std::fs::metadata(source).map_err(read_error)?;
    Ok((bytes, file_mode(&metadata)))
}

#[cfg(unix)]
fn file_mode(metadata: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    if metadata.permissions().mode() & 0o111 == 0 {
        0o644
    } else {
        0o755
    }
}

#[cfg(not(unix))]
const fn file_mode(_metadata: &std::fs::Metadata) -> u32 {
    0o644
}
