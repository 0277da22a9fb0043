// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::TargetRegistry;
use crate::config::ProjectDescriptor;
use crate::error::ConfigError;

fn registry() -> TargetRegistry {
    let mut registry = TargetRegistry::new();
    registry.register_all(["wheel", "sdist", "source", "wheel-gpu"]);
    registry
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

#[test]
fn test_empty_request_selects_all() {
    let resolved = registry().resolve(&[]).unwrap();
    insta::assert_yaml_snapshot!(resolved, @r"
    - sdist
    - source
    - wheel
    - wheel-gpu
    ");
}

#[test]
fn test_exact_and_glob_preserve_order() {
    let resolved = registry()
        .resolve(&strings(&["wheel", "s*", "wheel*"]))
        .unwrap();
    assert_eq!(resolved, strings(&["wheel", "sdist", "source", "wheel-gpu"]));
}

#[test]
fn test_unknown_target() {
    let err = registry().resolve(&strings(&["docs"])).unwrap_err();
    assert!(matches!(err, ConfigError::UnknownTarget(ref name) if name == "docs"));
    insta::assert_snapshot!(err.to_string(), @"unknown build target 'docs'");
}

#[test]
fn test_invalid_glob() {
    let err = registry().resolve(&strings(&["w[heel"])).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { .. }));
}

#[test]
fn test_from_descriptor_uses_default_targets() {
    let temp = tempfile::tempdir().expect("failed to create temp dir");
    let descriptor =
        ProjectDescriptor::parse(temp.path(), "[project]\nname = \"demo\"\nversion = \"1\"\n")
            .unwrap();
    let registry = TargetRegistry::from_descriptor(&descriptor);
    assert_eq!(
        registry.all_targets().iter().collect::<Vec<_>>(),
        vec!["sdist", "wheel"]
    );
}
