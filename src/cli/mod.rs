// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Command-line interface using clap derive.
//!
//! # Command Structure
//!
//! ```text
//! packsmith [global options] <command>
//! build [-t TARGET]... [-o DIR] [--hooks-only] [--no-hooks]
//!       [--enable-hook N]... [--disable-hook N]...
//! targets
//! metadata
//! version
//! ```

pub mod build;
pub mod global;


use crate::cli::build::BuildArgs;
use crate::cli::global::GlobalOptions;
use clap::{Parser, Subcommand};

/// Pluggable package build engine.
#[derive(Debug, Parser)]
#[command(
    name = "packsmith",
    author,
    version,
    about = "Pluggable package build engine",
    long_about = "packsmith Copyright (C) 2026 Romeo Ahmed\n\
                  This program comes with ABSOLUTELY NO WARRANTY\n\
                  This is free software, and you are welcome to redistribute it\n\
                  under certain conditions; see LICENSE for details.\n\n\
                  Builds reproducible wheel and sdist archives from a\n\
                  pyproject.toml descriptor.\n\n\
                  Invoking `packsmith build` builds every declared target. Do\n\
                  `packsmith build -t <target>...` to build specific targets.",
    after_help = "SETTINGS:\n\n\
                  Engine settings are read once at startup, lowest priority first:\n\
                  defaults, `packsmith.toml` in the project root, files given with\n\
                  --config, PACKSMITH_* environment variables and SOURCE_DATE_EPOCH,\n\
                  then command-line flags.\n\n\
                  EXIT CODES:\n\n\
                  0 success, 2 configuration, 3 selection, 4 hook, 5 build,\n\
                  6 I/O, 130 cancelled."
)]
pub struct Cli {
    /// Global options shared by all commands
    #[command(flatten)]
    pub global: GlobalOptions,

    /// Command to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Shows the version.
    Version,

    /// Builds targets.
    Build(BuildArgs),

    /// Lists declared targets.
    Targets,

    /// Prints the resolved version and metadata as JSON.
    Metadata,
}

/// Parses command-line arguments.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

/// Parses command-line arguments from an iterator.
pub fn parse_from<I, T>(iter: I) -> Cli
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::parse_from(iter)
}
