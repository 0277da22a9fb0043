// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Build command arguments.
//!
//! ```text
//! -t wheel -t 's*'       targets by name or glob (default: all)
//! --no-hooks             disable hooks not named by --enable-hook
//! --disable-hook N       always wins over --enable-hook N
//! ```

use clap::ArgAction;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the `build` command.
#[derive(Debug, Clone, Default, Args)]
pub struct BuildArgs {
    /// Targets to build. Globs like 'wheel*' are supported.
    #[arg(short = 't', long = "target", value_name = "TARGET", action = ArgAction::Append)]
    pub targets: Vec<String>,

    /// Output directory, overrides tool.packsmith.build.directory.
    #[arg(short = 'o', long = "output", value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Runs the hook lifecycle without writing archives.
    #[arg(long = "hooks-only", action = ArgAction::SetTrue)]
    pub hooks_only: bool,

    /// Disables every hook not enabled with --enable-hook.
    #[arg(long = "no-hooks", action = ArgAction::SetTrue)]
    pub no_hooks: bool,

    /// Enables a hook by name. Can be specified multiple times.
    #[arg(long = "enable-hook", value_name = "NAME", action = ArgAction::Append)]
    pub enable_hooks: Vec<String>,

    /// Disables a hook by name. Can be specified multiple times.
    #[arg(long = "disable-hook", value_name = "NAME", action = ArgAction::Append)]
    pub disable_hooks: Vec<String>,
}
