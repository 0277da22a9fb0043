// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration tests for CLI parsing and command handlers.

use clap::Parser;
use packsmith::cli::{Cli, Command};
use packsmith::cmd::build::run_build_command;
use packsmith::cmd::exit_code_for;
use packsmith::cmd::metadata::run_metadata_command;
use packsmith::cmd::targets::run_targets_command;

// =============================================================================
// Parsing
// =============================================================================

#[test]
fn cli_no_command() {
    let cli = Cli::try_parse_from(["packsmith"]).unwrap();
    assert!(cli.command.is_none());
}

#[test]
fn cli_build_defaults() {
    let cli = Cli::try_parse_from(["packsmith", "build"]).unwrap();
    let Some(Command::Build(args)) = cli.command else {
        panic!("expected build command");
    };
    assert!(args.targets.is_empty());
    assert!(args.output.is_none());
    assert!(!args.hooks_only && !args.no_hooks);
}

#[test]
fn cli_global_options_after_subcommand() {
    let cli = Cli::try_parse_from([
        "packsmith",
        "build",
        "--log-level",
        "4",
        "--log-file",
        "build.log",
        "--config",
        "a.toml",
        "--config",
        "b.toml",
    ])
    .unwrap();
    assert_eq!(cli.global.log_level, Some(4));
    assert_eq!(cli.global.configs.len(), 2);
    assert!(cli.global.log_file.is_some());
}

#[test]
fn cli_unknown_subcommand_fails() {
    assert!(Cli::try_parse_from(["packsmith", "publish"]).is_err());
}

// =============================================================================
// Handlers
// =============================================================================

fn project() -> tempfile::TempDir {
    let temp = tempfile::tempdir().expect("failed to create temp dir");
    std::fs::write(
        temp.path().join("pyproject.toml"),
        r#"
[project]
name = "cli-demo"
version = "0.3.0"

[tool.packsmith.build.targets.wheel]

[[tool.packsmith.build.targets.wheel.hooks]]
name = "version-file"
path = "cli_demo/_version.py"
"#,
    )
    .unwrap();
    std::fs::create_dir_all(temp.path().join("cli_demo")).unwrap();
    std::fs::write(temp.path().join("cli_demo/__init__.py"), "").unwrap();
    temp
}

fn parse(root: &std::path::Path, args: &[&str]) -> Cli {
    let mut argv = vec!["packsmith", "--project", root.to_str().unwrap()];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).unwrap()
}

#[test]
fn cmd_targets_and_metadata() {
    let temp = project();
    let cli = parse(temp.path(), &["targets", "--json"]);
    assert_eq!(run_targets_command(&cli.global).unwrap(), 0);

    let cli = parse(temp.path(), &["metadata"]);
    assert_eq!(run_metadata_command(&cli.global).unwrap(), 0);
}

#[test]
fn cmd_targets_without_descriptor_is_configuration_error() {
    let temp = tempfile::tempdir().expect("failed to create temp dir");
    let cli = parse(temp.path(), &["targets"]);
    let err = run_targets_command(&cli.global).unwrap_err();
    assert_eq!(exit_code_for(&err), 2);
}

#[tokio::test]
async fn cmd_build_writes_to_output_dir() {
    let temp = project();
    let out = tempfile::tempdir().expect("failed to create temp dir");
    let cli = parse(
        temp.path(),
        &["build", "-o", out.path().to_str().unwrap(), "--json"],
    );
    let Some(Command::Build(args)) = &cli.command else {
        panic!("expected build command");
    };

    assert_eq!(run_build_command(args, &cli.global).await.unwrap(), 0);
    assert!(out.path().join("cli_demo-0.3.0-py3-none-any.whl").is_file());
    assert!(!temp.path().join("dist").exists());
}

#[tokio::test]
async fn cmd_build_hooks_only_writes_nothing() {
    let temp = project();
    let cli = parse(temp.path(), &["build", "--hooks-only"]);
    let Some(Command::Build(args)) = &cli.command else {
        panic!("expected build command");
    };

    assert_eq!(run_build_command(args, &cli.global).await.unwrap(), 0);
    assert!(!temp.path().join("dist").exists());
}

#[tokio::test]
async fn cmd_build_unknown_target() {
    let temp = project();
    let cli = parse(temp.path(), &["build", "-t", "exe"]);
    let Some(Command::Build(args)) = &cli.command else {
        panic!("expected build command");
    };

    let err = run_build_command(args, &cli.global).await.unwrap_err();
    assert_eq!(exit_code_for(&err), 2);
}
