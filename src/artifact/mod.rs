// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Atomic artifact writer.
//!
//! ```text
//! bytes --> <output>/.tmpXXXXXX --> fsync --> rename --> <output>/<file name>
//! ```
//!
//! A failed write never leaves a file at the final path.

#[cfg(test)]
mod tests;

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::error::IoError;

/// An archive written to the output directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub path: PathBuf,
    pub size: u64,
    /// Hex-encoded SHA-256 of the contents.
    pub sha256: String,
}

/// Write `bytes` to `output_dir/file_name` atomically.
///
/// An existing file of the same name is replaced.
///
/// # Errors
///
/// Returns `IoError::CreateDir` if the directory cannot be created,
/// `IoError::Write` if the temporary file cannot be written and
/// `IoError::Persist` if it cannot be renamed into place.
pub fn write_artifact(output_dir: &Path, file_name: &str, bytes: &[u8]) -> Result<Artifact, IoError> {
    std::fs::create_dir_all(output_dir).map_err(|source| IoError::CreateDir {
        path: output_dir.to_path_buf(),
        source,
    })?;
    let path = output_dir.join(file_name);

    let write_error = |source| IoError::Write {
        path: path.clone(),
        source,
    };
    let mut temp = tempfile::Builder::new()
        .prefix(".packsmith-")
        .suffix(".tmp")
        .tempfile_in(output_dir)
        .map_err(write_error)?;
    temp.write_all(bytes).map_err(write_error)?;
    temp.as_file().sync_all().map_err(write_error)?;
    temp.persist(&path).map_err(|e| IoError::Persist {
        path: path.clone(),
        source: e.error,
    })?;

    let artifact = Artifact {
        size: bytes.len() as u64,
        sha256: hex::encode(Sha256::digest(bytes)),
        path,
    };
    info!(
        path = %artifact.path.display(),
        size = artifact.size,
        sha256 = %artifact.sha256,
        "Artifact written"
    );
    Ok(artifact)
}
