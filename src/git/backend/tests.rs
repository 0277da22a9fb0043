// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::{GitQuery, GixBackend, ShellBackend};
use crate::error::GitError;
use std::path::Path;
use tempfile::TempDir;

fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("failed to create temp dir")
}

fn git(dir: &Path, args: &[&str]) {
    let mut full = vec![
        "-c",
        "user.name=packsmith",
        "-c",
        "user.email=packsmith@example.invalid",
        "-c",
        "commit.gpgsign=false",
        "-c",
        "tag.gpgsign=false",
    ];
    full.extend_from_slice(args);
    ShellBackend::git_command(&full, dir).expect("git command failed");
}

fn repo_with_commit() -> TempDir {
    let temp = temp_dir();
    git(temp.path(), &["init", "--quiet"]);
    std::fs::write(temp.path().join("a.txt"), "a").unwrap();
    git(temp.path(), &["add", "a.txt"]);
    git(temp.path(), &["commit", "--quiet", "-m", "init"]);
    temp
}

#[test]
fn test_gix_backend_is_git_repo() {
    let temp = temp_dir();
    assert!(!GixBackend::is_git_repo(temp.path()));

    gix::init(temp.path()).expect("failed to init repo");
    assert!(GixBackend::is_git_repo(temp.path()));
}

#[test]
fn test_workdir_of_nested_path() {
    let temp = repo_with_commit();
    let nested = temp.path().join("sub");
    std::fs::create_dir(&nested).unwrap();

    let workdir = GixBackend::workdir(&nested).unwrap();
    assert_eq!(
        workdir.canonicalize().unwrap(),
        temp.path().canonicalize().unwrap()
    );
}

#[test]
fn test_describe_without_tags() {
    let temp = repo_with_commit();
    let err = ShellBackend::describe(temp.path()).unwrap_err();
    assert!(matches!(err, GitError::NoTags { .. }));
}

#[test]
fn test_describe_after_tag_and_commit() {
    let temp = repo_with_commit();
    git(temp.path(), &["tag", "v0.3.0"]);

    let exact = ShellBackend::describe(temp.path()).unwrap();
    assert_eq!(exact.tag, "v0.3.0");
    assert!(exact.is_exact());

    std::fs::write(temp.path().join("b.txt"), "b").unwrap();
    git(temp.path(), &["add", "b.txt"]);
    git(temp.path(), &["commit", "--quiet", "-m", "second"]);
    std::fs::write(temp.path().join("a.txt"), "changed").unwrap();

    let ahead = ShellBackend::describe(temp.path()).unwrap();
    assert_eq!(ahead.distance, 1);
    assert!(ahead.dirty);
    let head = ShellBackend::git_command(&["rev-parse", "HEAD"], temp.path()).unwrap();
    assert!(head.starts_with(&ahead.hash));
}

#[cfg(unix)]
#[test]
fn test_git_runs_untranslated() {
    let temp = temp_dir();
    let locale = ShellBackend::git_command(
        &["-c", "alias.locale=!printf %s \"$LC_ALL\"", "locale"],
        temp.path(),
    )
    .unwrap();
    assert_eq!(locale, "C");
}
