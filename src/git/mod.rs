// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Git queries for version resolution and VCS-aware selection.
//!
//! ```text
//!      ,------------------,
//!      | backend (traits) |
//!      '--+----------+----'
//!         |          |
//!         v          v
//!    GixBackend  ShellBackend
//!    .is_repo    .describe --> Describe
//!    .workdir
//! ```
//!
//! **`GixBackend`**: pure Rust, no subprocess, read-only.
//! **`ShellBackend`**: git CLI for `describe`.

pub mod backend;
pub mod describe;


pub use backend::{GitQuery, GixBackend, ShellBackend};
pub use describe::Describe;
