// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use std::collections::BTreeMap;
use std::sync::Arc;

use super::builtin::parse_requirements;
use super::render::{core_metadata, entry_points};
use super::{
    License, MetadataContext, MetadataDraft, MetadataHook, MetadataHookRegistry, Readme,
    ResolvedMetadata, resolve_metadata,
};
use crate::config::types::{HookSpec, MetadataField};
use crate::config::{BuildSettings, ProjectDescriptor};
use crate::error::{ConfigError, ErrorCategory, HookError, PackError, Result};
use crate::version::{ResolvedVersion, VersionProvenance};

fn version(v: &str) -> ResolvedVersion {
    ResolvedVersion {
        version: v.to_string(),
        provenance: VersionProvenance::Static,
    }
}

fn project(descriptor: &str, files: &[(&str, &str)]) -> (tempfile::TempDir, ProjectDescriptor) {
    let temp = tempfile::tempdir().expect("failed to create temp dir");
    for (rel, content) in files {
        std::fs::write(temp.path().join(rel), content).unwrap();
    }
    let parsed = ProjectDescriptor::parse(temp.path(), descriptor).unwrap();
    (temp, parsed)
}

fn hooks(descriptor: &ProjectDescriptor, settings: &BuildSettings) -> Vec<Arc<dyn MetadataHook>> {
    MetadataHookRegistry::with_builtins()
        .resolve(descriptor.metadata_hooks(), settings)
        .unwrap()
}

#[test]
fn test_static_metadata_renders_core_metadata() {
    let (_temp, descriptor) = project(
        r#"
[project]
name = "Demo-Pkg"
version = "1.0"
description = "A demo"
readme = "README.md"
requires-python = ">=3.9"
license = "MIT"
authors = [{ name = "Ada", email = "ada@example.com" }, { name = "Bob" }]
keywords = ["a", "b"]
classifiers = ["Programming Language :: Python"]
urls = { Homepage = "https://example.com" }
dependencies = ["requests>=2"]
optional-dependencies = { test = ["pytest; python_version >= '3.9'"] }
"#,
        &[("README.md", "# Demo\n")],
    );
    let settings = BuildSettings::default();
    let meta = resolve_metadata(&descriptor, &version("1.0"), &[], &settings).unwrap();
    assert_eq!(meta.readme.as_ref().map(|r| r.content_type.as_str()), Some("text/markdown"));

    insta::assert_snapshot!(core_metadata(&meta, &["numpy".to_string()]), @r#"
    Metadata-Version: 2.3
    Name: Demo-Pkg
    Version: 1.0
    Summary: A demo
    Project-URL: Homepage, https://example.com
    Author: Bob
    Author-email: Ada <ada@example.com>
    License: MIT
    Keywords: a,b
    Classifier: Programming Language :: Python
    Requires-Python: >=3.9
    Requires-Dist: requests>=2
    Requires-Dist: numpy
    Provides-Extra: test
    Requires-Dist: pytest; (python_version >= '3.9') and extra == "test"
    Description-Content-Type: text/markdown

    # Demo
    "#);
}

#[test]
fn test_multiline_values_fold_into_continuation_lines() {
    let meta = ResolvedMetadata {
        name: "demo".to_string(),
        version: "1.0".to_string(),
        description: Some("first line\nRequires-Dist: evil\r\nthird".to_string()),
        license: Some(License::Text("MIT\nCopyright\n".to_string())),
        ..ResolvedMetadata::default()
    };
    let rendered = core_metadata(&meta, &[]);
    assert!(!rendered.lines().any(|line| line.starts_with("Requires-Dist")));
    assert_eq!(
        rendered,
        "Metadata-Version: 2.3\n\
         Name: demo\n\
         Version: 1.0\n\
         Summary: first line\n        Requires-Dist: evil\n        third\n\
         License: MIT\n        Copyright\n"
    );
}

#[test]
fn test_dynamic_field_set_by_fields_hook() {
    let (_temp, descriptor) = project(
        r#"
[project]
name = "demo"
version = "1.0"
dynamic = ["description", "keywords"]

[[tool.packsmith.metadata.hooks]]
name = "fields"
description = "first"
keywords = ["x"]

[[tool.packsmith.metadata.hooks]]
name = "fields"
description = "second"
"#,
        &[],
    );
    let settings = BuildSettings::default();
    let meta = resolve_metadata(
        &descriptor,
        &version("1.0"),
        &hooks(&descriptor, &settings),
        &settings,
    )
    .unwrap();
    assert_eq!(meta.description.as_deref(), Some("second"));
    assert_eq!(meta.keywords, vec!["x".to_string()]);
}

#[test]
fn test_unresolved_dynamic_field() {
    let (_temp, descriptor) = project(
        r#"
[project]
name = "demo"
version = "1.0"
dynamic = ["description"]
"#,
        &[],
    );
    let err = resolve_metadata(&descriptor, &version("1.0"), &[], &BuildSettings::default())
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Configuration);
    insta::assert_snapshot!(err.to_string(), @"configuration error: dynamic metadata field 'description' was not resolved by any metadata hook");
}

#[test]
fn test_empty_values_do_not_count_as_set() {
    let mut meta = ResolvedMetadata {
        requires_python: Some(String::new()),
        license: Some(License::Expression(" ".to_string())),
        readme: Some(Readme {
            content: String::new(),
            content_type: "text/plain".to_string(),
        }),
        ..ResolvedMetadata::default()
    };
    for field in [
        MetadataField::RequiresPython,
        MetadataField::License,
        MetadataField::Readme,
    ] {
        assert!(!meta.is_set(field), "{field:?} should be unset");
    }

    meta.requires_python = Some(">=3.9".to_string());
    meta.license = Some(License::Text("MIT".to_string()));
    meta.readme = Some(Readme {
        content: "# Demo".to_string(),
        content_type: "text/markdown".to_string(),
    });
    assert!(meta.is_set(MetadataField::RequiresPython));
    assert!(meta.is_set(MetadataField::License));
    assert!(meta.is_set(MetadataField::Readme));
}

#[test]
fn test_hook_cannot_override_static_field() {
    let (_temp, descriptor) = project(
        r#"
[project]
name = "demo"
version = "1.0"
keywords = ["static"]

[[tool.packsmith.metadata.hooks]]
name = "fields"
keywords = ["changed"]
"#,
        &[],
    );
    let settings = BuildSettings::default();
    let err = resolve_metadata(
        &descriptor,
        &version("1.0"),
        &hooks(&descriptor, &settings),
        &settings,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        PackError::Config(ref e) if matches!(**e, ConfigError::StaticFieldOverridden { ref field, ref hook } if field == "keywords" && hook == "fields")
    ));
}

#[test]
fn test_dynamic_field_with_static_value_is_rejected() {
    let (_temp, descriptor) = project(
        r#"
[project]
name = "demo"
version = "1.0"
description = "static"
dynamic = ["description"]
"#,
        &[],
    );
    let err = resolve_metadata(&descriptor, &version("1.0"), &[], &BuildSettings::default())
        .unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"configuration error: invalid value for 'description' in section '[project]': listed in 'dynamic' but also given a static value");
}

struct Failing;

impl MetadataHook for Failing {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn update(&self, _ctx: &MetadataContext<'_>, _draft: &mut MetadataDraft) -> Result<()> {
        anyhow::bail!("no metadata today")
    }
}

#[test]
fn test_metadata_hook_failure_is_attributed() {
    let (_temp, descriptor) = project("[project]\nname = \"demo\"\nversion = \"1.0\"\n", &[]);
    let hooks: Vec<Arc<dyn MetadataHook>> = vec![Arc::new(Failing)];
    let err = resolve_metadata(&descriptor, &version("1.0"), &hooks, &BuildSettings::default())
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Hook);
    assert_eq!(err.as_hook_error().and_then(HookError::hook_name), Some("failing"));
}

#[test]
fn test_env_readme_and_requirements_hooks() {
    let (_temp, descriptor) = project(
        r#"
[project]
name = "demo"
version = "1.0"
dynamic = ["classifiers", "readme", "dependencies", "optional-dependencies", "description"]

[[tool.packsmith.metadata.hooks]]
name = "env"
classifiers = "DEMO_CLASSIFIERS"
description = "DEMO_UNSET"

[[tool.packsmith.metadata.hooks]]
name = "readme"
path = "README.rst"

[[tool.packsmith.metadata.hooks]]
name = "requirements"
optional = { dev = ["dev.txt"] }

[[tool.packsmith.metadata.hooks]]
name = "fields"
description = "fallback"
"#,
        &[
            ("README.rst", "Demo\n====\n"),
            ("requirements.txt", "# pinned\nrequests>=2  # http\n\n-r other.txt\nattrs\n"),
            ("dev.txt", "pytest\n"),
        ],
    );
    let mut settings = BuildSettings::default();
    settings.environment.insert(
        "DEMO_CLASSIFIERS".to_string(),
        "Typing :: Typed, Framework :: Demo".to_string(),
    );

    let meta = resolve_metadata(
        &descriptor,
        &version("1.0"),
        &hooks(&descriptor, &settings),
        &settings,
    )
    .unwrap();
    assert_eq!(meta.classifiers, vec!["Typing :: Typed", "Framework :: Demo"]);
    assert_eq!(
        meta.readme,
        Some(Readme {
            content: "Demo\n====\n".to_string(),
            content_type: "text/x-rst".to_string(),
        })
    );
    assert_eq!(meta.dependencies, vec!["requests>=2", "attrs"]);
    assert_eq!(meta.optional_dependencies["dev"], vec!["pytest"]);
    assert_eq!(meta.description.as_deref(), Some("fallback"));
}

#[test]
fn test_parse_requirements() {
    let parsed = parse_requirements("a\n  # comment\n--index-url x\n-c constraints.txt\nb[extra] >= 1 # pin\n");
    assert_eq!(parsed, vec!["a", "b[extra] >= 1"]);
}

#[test]
fn test_unknown_metadata_hook_and_bad_field() {
    let registry = MetadataHookRegistry::with_builtins();
    let Err(err) = registry.instantiate(&HookSpec::new("nope")) else {
        panic!("an unknown metadata hook must not instantiate");
    };
    insta::assert_snapshot!(err.to_string(), @"unknown metadata hook 'nope'");

    let Err(err) = registry.instantiate(&HookSpec::new("fields").with("colour", "blue")) else {
        panic!("an unknown field must be rejected");
    };
    assert!(err.to_string().contains("'colour' is not a metadata field"));
}

#[test]
fn test_set_value_shapes() {
    let (_temp, descriptor) = project("[project]\nname = \"demo\"\nversion = \"1.0\"\n", &[]);
    let mut draft =
        MetadataDraft::from_project(descriptor.root(), descriptor.project(), &version("1.0")).unwrap();

    draft
        .set_value(MetadataField::License, toml::Value::String("Apache-2.0".into()))
        .unwrap();
    assert_eq!(
        draft.current().license,
        Some(License::Expression("Apache-2.0".to_string()))
    );
    assert!(draft
        .set_value(MetadataField::Version, toml::Value::String("2.0".into()))
        .is_err());
    assert!(draft
        .set_value(MetadataField::Keywords, toml::Value::Integer(3))
        .is_err());
    assert_eq!(draft.version(), "1.0");
}

#[test]
fn test_entry_points_rendering() {
    let mut meta = ResolvedMetadata::default();
    assert_eq!(entry_points(&meta), None);

    meta.scripts.insert("demo".to_string(), "demo.cli:main".to_string());
    meta.entry_points.insert(
        "demo.plugins".to_string(),
        BTreeMap::from([("b".to_string(), "demo.b:B".to_string())]),
    );
    insta::assert_snapshot!(entry_points(&meta).unwrap(), @r"
    [console_scripts]
    demo = demo.cli:main

    [demo.plugins]
    b = demo.b:B
    ");
}
