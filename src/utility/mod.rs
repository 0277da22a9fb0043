// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Utility modules.
//!
//! ```text
//! fs
//!   walk:   parallel_walk(), WalkOptions
//!   path:   to_archive_path(), is_safe_archive_path()
//! ```

pub mod fs;
