// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Core metadata and entry-point rendering.
//!
//! ```text
//! Metadata-Version: 2.3
//! Name / Version / Summary
//! Project-URL*  Author(-email)  Maintainer(-email)  License  Keywords
//! Classifier*  Requires-Python  Requires-Dist*  Provides-Extra*
//! Description-Content-Type
//! <blank line>
//! readme body
//! ```

use std::fmt::Write;

use crate::config::types::Person;

use super::{License, ResolvedMetadata};

/// Version of the core metadata format written.
pub const METADATA_VERSION: &str = "2.3";

/// Split people into `(names-only, formatted-with-email)` header values.
fn people(persons: &[Person]) -> (Vec<String>, Vec<String>) {
    let mut names = Vec::new();
    let mut emails = Vec::new();
    for person in persons {
        match (&person.name, &person.email) {
            (Some(name), Some(email)) => emails.push(format!("{name} <{email}>")),
            (None, Some(email)) => emails.push(email.clone()),
            (Some(name), None) => names.push(name.clone()),
            (None, None) => {}
        }
    }
    (names, emails)
}

/// Fold a multi-line header value into RFC 822 continuation lines.
///
/// Every line break becomes an indented continuation, so no value can start
/// a header of its own.
fn fold(value: &str) -> String {
    let value = value.trim_end();
    if !value.contains(['\n', '\r']) {
        return value.to_string();
    }
    value
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\n', "\n        ")
}

/// Attach an `extra` marker to a requirement.
fn with_extra(requirement: &str, extra: &str) -> String {
    match requirement.split_once(';') {
        Some((req, marker)) => format!(
            "{}; ({}) and extra == \"{extra}\"",
            req.trim_end(),
            marker.trim()
        ),
        None => format!("{requirement}; extra == \"{extra}\""),
    }
}

/// Render `METADATA` / `PKG-INFO`.
///
/// `extra_dependencies` are appended to `Requires-Dist` after the resolved
/// dependencies.
#[must_use]
pub fn core_metadata(meta: &ResolvedMetadata, extra_dependencies: &[String]) -> String {
    let mut out = String::new();
    let mut header = |key: &str, value: &str| {
        let _ = writeln!(out, "{key}: {}", fold(value));
    };

    header("Metadata-Version", METADATA_VERSION);
    header("Name", &meta.name);
    header("Version", &meta.version);
    if let Some(summary) = &meta.description {
        header("Summary", summary);
    }
    for (label, url) in &meta.urls {
        header("Project-URL", &format!("{label}, {url}"));
    }

    let (names, emails) = people(&meta.authors);
    if !names.is_empty() {
        header("Author", &names.join(", "));
    }
    if !emails.is_empty() {
        header("Author-email", &emails.join(", "));
    }
    let (names, emails) = people(&meta.maintainers);
    if !names.is_empty() {
        header("Maintainer", &names.join(", "));
    }
    if !emails.is_empty() {
        header("Maintainer-email", &emails.join(", "));
    }

    match &meta.license {
        Some(License::Expression(expr)) => header("License", expr),
        Some(License::Text(text)) => header("License", text),
        None => {}
    }
    if !meta.keywords.is_empty() {
        header("Keywords", &meta.keywords.join(","));
    }
    for classifier in &meta.classifiers {
        header("Classifier", classifier);
    }
    if let Some(requires) = &meta.requires_python {
        header("Requires-Python", requires);
    }
    for requirement in meta.dependencies.iter().chain(extra_dependencies) {
        header("Requires-Dist", requirement);
    }
    for (extra, requirements) in &meta.optional_dependencies {
        header("Provides-Extra", extra);
        for requirement in requirements {
            header("Requires-Dist", &with_extra(requirement, extra));
        }
    }

    if let Some(readme) = &meta.readme {
        header("Description-Content-Type", &readme.content_type);
        out.push('\n');
        out.push_str(&readme.content);
        if !readme.content.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}

/// Render `entry_points.txt`, or `None` when there are no entry points.
#[must_use]
pub fn entry_points(meta: &ResolvedMetadata) -> Option<String> {
    let groups = [
        ("console_scripts", &meta.scripts),
        ("gui_scripts", &meta.gui_scripts),
    ]
    .into_iter()
    .chain(meta.entry_points.iter().map(|(g, e)| (g.as_str(), e)))
    .filter(|(_, entries)| !entries.is_empty());

    let mut out = String::new();
    for (group, entries) in groups {
        if !out.is_empty() {
            out.push('\n');
        }
        let _ = writeln!(out, "[{group}]");
        for (name, target) in entries {
            let _ = writeln!(out, "{name} = {target}");
        }
    }
    (!out.is_empty()).then_some(out)
}
