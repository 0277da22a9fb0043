// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Source distribution (tar.gz) builder.

use std::collections::BTreeMap;

use flate2::{Compression, GzBuilder};
use tar::{EntryType, Header};
use tracing::debug;

use crate::config::types::TargetKind;
use crate::error::BuildError;
use crate::metadata::render::core_metadata;

use super::{ArchiveBuilder, BuildInput, BuiltArchive, read_member};

const FORMAT: &str = "sdist";

fn archive_error(e: impl std::fmt::Display) -> BuildError {
    BuildError::Archive {
        format: FORMAT,
        message: e.to_string(),
    }
}

/// Builds `<dist>-<ver>.tar.gz`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SdistBuilder;

impl ArchiveBuilder for SdistBuilder {
    fn kind(&self) -> TargetKind {
        TargetKind::Sdist
    }

    fn build(&self, input: &BuildInput<'_>) -> Result<BuiltArchive, BuildError> {
        let stem = format!("{}-{}", input.descriptor.dist_name(), input.file_version());

        let mut members: BTreeMap<String, (Vec<u8>, u32)> = BTreeMap::new();
        for (archive_path, file) in input.selection.iter() {
            members.insert(archive_path.to_string(), read_member(&file.source)?);
        }
        // Descriptor and PKG-INFO replace any selected file of the same name.
        members.insert(
            "pyproject.toml".to_string(),
            (input.descriptor.text().as_bytes().to_vec(), 0o644),
        );
        let pkg_info = core_metadata(input.metadata, input.build_data.dependencies());
        members.insert("PKG-INFO".to_string(), (pkg_info.into_bytes(), 0o644));

        let encoder = GzBuilder::new()
            .mtime(input.timestamp.gzip_mtime())
            .write(Vec::new(), Compression::default());
        let mut tar = tar::Builder::new(encoder);
        let mtime = input.timestamp.tar_mtime();

        for (path, (bytes, mode)) in &members {
            let mut header = Header::new_gnu();
            header.set_entry_type(EntryType::Regular);
            header.set_size(bytes.len() as u64);
            header.set_mode(*mode);
            header.set_mtime(mtime);
            header.set_uid(0);
            header.set_gid(0);
            header.set_username("").map_err(archive_error)?;
            header.set_groupname("").map_err(archive_error)?;
            tar.append_data(&mut header, format!("{stem}/{path}"), bytes.as_slice())
                .map_err(archive_error)?;
        }

        let bytes = tar
            .into_inner()
            .map_err(archive_error)?
            .finish()
            .map_err(archive_error)?;
        let file_name = format!("{stem}.tar.gz");
        debug!(
            target = %input.target.name,
            file = %file_name,
            files = members.len(),
            size = bytes.len(),
            "Sdist built"
        );
        Ok(BuiltArchive { file_name, bytes })
    }
}
