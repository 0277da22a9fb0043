// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Wheel (zip) builder.

use std::fmt::Write as _;
use std::io::{Cursor, Write};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};
use tracing::debug;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::config::types::TargetKind;
use crate::error::BuildError;
use crate::metadata::render::{core_metadata, entry_points};

use super::tag::{expand, resolve_tag};
use super::{ArchiveBuilder, BuildInput, BuiltArchive, read_member};

const FORMAT: &str = "wheel";

fn archive_error(e: impl std::fmt::Display) -> BuildError {
    BuildError::Archive {
        format: FORMAT,
        message: e.to_string(),
    }
}

/// Zip writer that records every member for `RECORD`.
struct RecordingZip {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
    record: String,
}

impl RecordingZip {
    fn new(options: SimpleFileOptions) -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            options,
            record: String::new(),
        }
    }

    fn add(&mut self, path: &str, bytes: &[u8], mode: u32) -> Result<(), BuildError> {
        self.zip
            .start_file(path, self.options.unix_permissions(mode))
            .map_err(archive_error)?;
        self.zip.write_all(bytes).map_err(archive_error)?;

        let digest = URL_SAFE_NO_PAD.encode(Sha256::digest(bytes));
        let _ = writeln!(self.record, "{},sha256={digest},{}", csv_field(path), bytes.len());
        Ok(())
    }

    fn finish(mut self, record_path: &str) -> Result<Vec<u8>, BuildError> {
        let mut record = std::mem::take(&mut self.record);
        let _ = writeln!(record, "{},,", csv_field(record_path));
        self.zip
            .start_file(record_path, self.options.unix_permissions(0o644))
            .map_err(archive_error)?;
        self.zip.write_all(record.as_bytes()).map_err(archive_error)?;
        Ok(self.zip.finish().map_err(archive_error)?.into_inner())
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Render the `WHEEL` file.
#[must_use]
pub fn wheel_file(tag: &str, pure: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Wheel-Version: 1.0");
    let _ = writeln!(out, "Generator: packsmith {}", env!("CARGO_PKG_VERSION"));
    let _ = writeln!(out, "Root-Is-Purelib: {pure}");
    for tag in expand(tag) {
        let _ = writeln!(out, "Tag: {tag}");
    }
    out
}

/// Builds `<dist>-<ver>-<tag>.whl`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WheelBuilder;

impl ArchiveBuilder for WheelBuilder {
    fn kind(&self) -> TargetKind {
        TargetKind::Wheel
    }

    fn build(&self, input: &BuildInput<'_>) -> Result<BuiltArchive, BuildError> {
        let data = input.build_data;
        let tag = resolve_tag(data, input.target, input.tags)?;
        let stem = format!("{}-{}", input.descriptor.dist_name(), input.file_version());
        let dist_info = format!("{stem}.dist-info");

        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .last_modified_time(input.timestamp.zip_datetime());
        let mut zip = RecordingZip::new(options);

        for (archive_path, file) in input.selection.iter() {
            let (bytes, mode) = read_member(&file.source)?;
            zip.add(archive_path, &bytes, mode)?;
        }

        let metadata = core_metadata(input.metadata, data.dependencies());
        zip.add(&format!("{dist_info}/METADATA"), metadata.as_bytes(), 0o644)?;
        zip.add(
            &format!("{dist_info}/WHEEL"),
            wheel_file(&tag, data.pure()).as_bytes(),
            0o644,
        )?;
        if let Some(entry_points) = entry_points(input.metadata) {
            zip.add(
                &format!("{dist_info}/entry_points.txt"),
                entry_points.as_bytes(),
                0o644,
            )?;
        }
        for (name, contents) in data.extra_metadata() {
            zip.add(&format!("{dist_info}/extra_metadata/{name}"), contents, 0o644)?;
        }

        let bytes = zip.finish(&format!("{dist_info}/RECORD"))?;
        let file_name = format!("{stem}-{tag}.whl");
        debug!(
            target = %input.target.name,
            file = %file_name,
            files = input.selection.len(),
            size = bytes.len(),
            "Wheel built"
        );
        Ok(BuiltArchive { file_name, bytes })
    }
}
