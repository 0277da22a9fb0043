// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Filesystem utilities.
//!
//! ```text
//! walk:  parallel_walk()  ignore::WalkParallel (multi-core), sorted output
//!        WalkOptions      skip_dirs (.git/.hg/.svn), skip_paths (output dir)
//! path:  archive paths are '/'-separated and relative
//! ```

pub mod path;
pub mod walk;
