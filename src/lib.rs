// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Library root.
//!
//! # Crate Architecture
//!
//! ```text
//!                        main.rs
//!                           |
//!                +----------+----------+
//!                v                     v
//!             cli (clap)          cmd (handlers)
//!                |          build / targets / metadata
//!                +----------+----------+
//!                           v
//!              ,---------------------------,
//!              |          config           |
//!              | pyproject.toml + settings |
//!              '--+-----------+--------+---'
//!                 |           |        |
//!                 v           v        v
//!             version     metadata   hooks
//!           static/regex   hooks   registry +
//!           code/env/vcs          orchestrator
//!                 |           |        |
//!                 +-----+-----+--------+
//!                       v
//!                    engine
//!             manager, registry, stages
//!                       |
//!          +------------+------------+
//!          v            v            v
//!       select       builder      artifact
//!    rules + VCS   wheel/sdist   atomic write
//!
//!   +-----------------------------------------+
//!   |  foundation   error, logging, utility   |
//!   |               git                       |
//!   +-----------------------------------------+
//! ```

pub mod artifact;
pub mod builder;
pub mod cli;
pub mod cmd;
pub mod config;
pub mod engine;
pub mod error;
pub mod git;
pub mod hooks;
pub mod logging;
pub mod metadata;
pub mod select;
pub mod utility;
pub mod version;
