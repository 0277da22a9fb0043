// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::write_artifact;
use crate::error::IoError;

fn entries(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_write_creates_directory_and_digest() {
    let temp = tempfile::tempdir().expect("failed to create temp dir");
    let out = temp.path().join("dist/nested");

    let artifact = write_artifact(&out, "demo-1.0.tar.gz", b"abc").unwrap();
    assert_eq!(artifact.path, out.join("demo-1.0.tar.gz"));
    assert_eq!(artifact.size, 3);
    insta::assert_snapshot!(artifact.sha256, @"ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
    assert_eq!(std::fs::read(&artifact.path).unwrap(), b"abc");
    assert_eq!(entries(&out), vec!["demo-1.0.tar.gz"]);
}

#[test]
fn test_write_replaces_existing_file() {
    let temp = tempfile::tempdir().expect("failed to create temp dir");
    write_artifact(temp.path(), "a.whl", b"old").unwrap();
    write_artifact(temp.path(), "a.whl", b"new contents").unwrap();

    assert_eq!(std::fs::read(temp.path().join("a.whl")).unwrap(), b"new contents");
    assert_eq!(entries(temp.path()), vec!["a.whl"]);
}

#[test]
fn test_output_dir_is_a_file() {
    let temp = tempfile::tempdir().expect("failed to create temp dir");
    let blocker = temp.path().join("dist");
    std::fs::write(&blocker, "not a directory").unwrap();

    let err = write_artifact(&blocker, "a.whl", b"x").unwrap_err();
    assert!(matches!(err, IoError::CreateDir { .. }));
    assert_eq!(entries(temp.path()), vec!["dist"]);
}
