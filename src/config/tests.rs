// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::types::{ForceInclude, MetadataField, TargetKind, VersionSourceConfig};
use super::{BuildSettings, ProjectDescriptor, SettingsLoader};
use crate::error::ConfigError;
use std::path::{Path, PathBuf};

const MINIMAL: &str = r#"
[project]
name = "Demo.Pkg"
version = "0.1.0"
"#;

fn parse(text: &str) -> Result<ProjectDescriptor, ConfigError> {
    ProjectDescriptor::parse("/project", text)
}

#[test]
fn test_minimal_descriptor_defaults() {
    let descriptor = parse(MINIMAL).unwrap();

    assert_eq!(descriptor.name(), "Demo.Pkg");
    assert_eq!(descriptor.normalized_name(), "demo-pkg");
    assert_eq!(descriptor.dist_name(), "demo_pkg");
    assert_eq!(
        descriptor.version_source(),
        &VersionSourceConfig::Static {
            version: "0.1.0".to_string()
        }
    );
    assert_eq!(
        descriptor.target_names().collect::<Vec<_>>(),
        vec!["sdist", "wheel"]
    );
    assert_eq!(descriptor.output_dir(), Path::new("/project/dist"));
    assert_eq!(descriptor.text(), MINIMAL);
}

#[test]
fn test_target_overrides_merge_field_by_field() {
    let descriptor = parse(
        r#"
[project]
name = "demo"
version = "1.0"

[tool.packsmith.build]
exclude = ["tests"]
include = ["src/**"]
reproducible = true
force-include = [{ source = "LICENSE", path = "demo/LICENSE" }]

[[tool.packsmith.build.hooks]]
name = "shared"

[tool.packsmith.build.targets.wheel]
exclude = []
tag = "py3-none-any"

[[tool.packsmith.build.targets.wheel.hooks]]
name = "extra"
flag = true

[tool.packsmith.build.targets.docs]
kind = "sdist"
"#,
    )
    .unwrap();

    let wheel = descriptor.target("wheel").unwrap();
    assert_eq!(wheel.kind, TargetKind::Wheel);
    assert!(wheel.rules.exclude.is_empty());
    assert_eq!(wheel.rules.include, vec!["src/**".to_string()]);
    assert_eq!(
        wheel.rules.force_include,
        vec![ForceInclude::new("LICENSE", "demo/LICENSE")]
    );
    assert!(wheel.reproducible);
    assert_eq!(wheel.tag.as_deref(), Some("py3-none-any"));
    assert_eq!(
        wheel.hooks.iter().map(|h| h.name.as_str()).collect::<Vec<_>>(),
        vec!["shared", "extra"]
    );
    assert_eq!(
        wheel.hooks[1].config.get("flag"),
        Some(&toml::Value::Boolean(true))
    );

    let docs = descriptor.target("docs").unwrap();
    assert_eq!(docs.kind, TargetKind::Sdist);
    assert_eq!(docs.rules.exclude, vec!["tests".to_string()]);
}

#[test]
fn test_target_without_kind_is_rejected() {
    let err = parse(
        r#"
[project]
name = "demo"
version = "1.0"

[tool.packsmith.build.targets.custom]
include = ["*.py"]
"#,
    )
    .unwrap_err();

    insta::assert_snapshot!(
        err.to_string(),
        @"missing required config key 'kind' in section '[tool.packsmith.build.targets.custom]'"
    );
}

#[test]
fn test_dynamic_version_requires_source() {
    let err = parse(
        r#"
[project]
name = "demo"
dynamic = ["version"]
"#,
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::MissingKey { ref key, .. } if key == "source"));
}

#[test]
fn test_dynamic_version_with_regex_source() {
    let descriptor = parse(
        r#"
[project]
name = "demo"
dynamic = ["version", "description"]

[tool.packsmith.version]
source = "regex"
path = "src/demo/__init__.py"
"#,
    )
    .unwrap();

    assert!(descriptor.is_dynamic(MetadataField::Version));
    assert!(descriptor.is_dynamic(MetadataField::Description));
    assert_eq!(
        descriptor.version_source(),
        &VersionSourceConfig::Regex {
            path: PathBuf::from("src/demo/__init__.py"),
            pattern: None,
        }
    );
}

#[test]
fn test_static_and_dynamic_version_conflict() {
    let err = parse(
        r#"
[project]
name = "demo"
version = "1.0"
dynamic = ["version"]
"#,
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "version"));
}

#[test]
fn test_name_cannot_be_dynamic() {
    let err = parse(
        r#"
[project]
name = "demo"
version = "1.0"
dynamic = ["name"]
"#,
    )
    .unwrap_err();
    insta::assert_snapshot!(
        err.to_string(),
        @"invalid value for 'dynamic' in section '[project]': 'name' cannot be declared dynamic"
    );
}

#[test]
fn test_invalid_project_name() {
    let err = parse("[project]\nname = \"-bad-\"\nversion = \"1\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "name"));
}

#[test]
fn test_malformed_toml_is_parse_error() {
    let err = parse("[project\nname = 1").unwrap_err();
    assert!(matches!(err, ConfigError::ParseError { .. }));
}

#[test]
fn test_load_missing_descriptor() {
    let dir = tempfile::tempdir().unwrap();
    let err = ProjectDescriptor::load(dir.path()).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound(_)));
}

#[cfg(unix)]
#[test]
fn test_load_resolves_relative_root() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("pyproject.toml"), MINIMAL).unwrap();
    let cwd = std::env::current_dir().unwrap();
    let mut relative = PathBuf::new();
    for _ in cwd.components().skip(1) {
        relative.push("..");
    }
    relative.push(dir.path().strip_prefix("/").unwrap());

    let descriptor = ProjectDescriptor::load(&relative).unwrap();
    assert!(descriptor.root().is_absolute());
    assert!(descriptor.output_dir().is_absolute());
    assert_eq!(
        descriptor.root().canonicalize().unwrap(),
        dir.path().canonicalize().unwrap()
    );
}

#[test]
fn test_load_keeps_text_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("pyproject.toml"), MINIMAL).unwrap();
    let descriptor = ProjectDescriptor::load(dir.path()).unwrap();
    assert_eq!(descriptor.text(), MINIMAL);
    assert_eq!(descriptor.root(), dir.path());
}

#[test]
fn test_settings_from_environment_snapshot() {
    let settings = SettingsLoader::new()
        .with_environment([
            ("PACKSMITH_NO_HOOKS", "true"),
            ("PACKSMITH_ENABLE_HOOKS", "script,version-file"),
            ("PACKSMITH_PLATFORM_TAG", "linux_x86_64"),
            ("SOURCE_DATE_EPOCH", "1700000000"),
            ("UNRELATED", "x"),
        ])
        .build()
        .unwrap();

    assert!(settings.no_hooks);
    assert!(!settings.hooks_only);
    assert_eq!(settings.enable_hooks, vec!["script", "version-file"]);
    assert_eq!(settings.platform_tag.as_deref(), Some("linux_x86_64"));
    assert_eq!(settings.source_date_epoch, Some(1_700_000_000));
    assert_eq!(settings.env("UNRELATED"), Some("x"));
}

#[test]
fn test_settings_overrides_win() {
    let settings = SettingsLoader::new()
        .with_environment([("PACKSMITH_HOOKS_ONLY", "false")])
        .set("hooks_only", true)
        .unwrap()
        .build()
        .unwrap();
    assert!(settings.hooks_only);
}

#[test]
fn test_settings_invalid_epoch() {
    let result = SettingsLoader::new()
        .with_environment([("SOURCE_DATE_EPOCH", "yesterday")])
        .build();
    assert!(result.is_err());
}

#[test]
fn test_settings_from_toml_string() {
    let settings = SettingsLoader::new()
        .add_toml_str("disable_hooks = [\"script\"]\nlocation = \"out\"\n")
        .build()
        .unwrap();
    assert_eq!(settings.disable_hooks, vec!["script"]);
    assert_eq!(
        settings.output_dir(Path::new("/p"), Path::new("/p/dist")),
        PathBuf::from("/p/out")
    );
}

#[test]
fn test_hook_enablement_rules() {
    let settings = BuildSettings {
        no_hooks: true,
        enable_hooks: vec!["a".into(), "b".into()],
        disable_hooks: vec!["b".into()],
        ..BuildSettings::default()
    };

    insta::assert_yaml_snapshot!(
        vec![
            ("a", settings.is_hook_enabled("a", false)),
            ("b", settings.is_hook_enabled("b", true)),
            ("c", settings.is_hook_enabled("c", true)),
        ],
        @r"
    - - a
      - true
    - - b
      - false
    - - c
      - false
    "
    );

    let defaults = BuildSettings::default();
    assert!(defaults.is_hook_enabled("c", true));
    assert!(!defaults.is_hook_enabled("c", false));
}
