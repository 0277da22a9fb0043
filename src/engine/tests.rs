// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::{Arc, Mutex};

use proptest::prelude::*;
use tokio_util::sync::CancellationToken;

use super::{ProjectContext, Stage, run_target};
use crate::config::{BuildSettings, ProjectDescriptor};
use crate::error::{ConfigError, ErrorCategory, HookError, HookPhase, PackError, Result};
use crate::hooks::{BuildData, BuildHook, FrozenBuildData, HookContext, HookRegistry};
use crate::metadata::MetadataHookRegistry;
use crate::version::ResolvedVersion;

type Journal = Arc<Mutex<Vec<String>>>;

/// Hook that journals its calls and optionally fails in one phase.
struct Scripted {
    name: &'static str,
    journal: Journal,
    fail_in: Option<HookPhase>,
}

impl BuildHook for Scripted {
    fn name(&self) -> &str {
        self.name
    }

    fn initialize(
        &self,
        _ctx: &HookContext<'_>,
        _version: &ResolvedVersion,
        data: &mut BuildData,
    ) -> Result<()> {
        self.journal
            .lock()
            .unwrap()
            .push(format!("{}:initialize", self.name));
        data.add_dependency(format!("{}-dep", self.name));
        if self.fail_in == Some(HookPhase::Initialize) {
            anyhow::bail!("{} refused to initialize", self.name);
        }
        Ok(())
    }

    fn finalize(
        &self,
        _ctx: &HookContext<'_>,
        _version: &ResolvedVersion,
        _data: &FrozenBuildData,
        artifact: Option<&Path>,
    ) -> Result<()> {
        self.journal.lock().unwrap().push(format!(
            "{}:finalize:{}",
            self.name,
            artifact.is_some_and(Path::exists)
        ));
        if self.fail_in == Some(HookPhase::Finalize) {
            anyhow::bail!("{} cleanup failed", self.name);
        }
        Ok(())
    }
}

fn registry(journal: &Journal, failing: &[(&'static str, HookPhase)]) -> HookRegistry {
    let mut registry = HookRegistry::with_builtins();
    for name in ["h1", "h2", "h3"] {
        let fail_in = failing
            .iter()
            .find(|(hook, _)| *hook == name)
            .map(|(_, phase)| *phase);
        registry.register_instance(
            name,
            Arc::new(Scripted {
                name,
                journal: Arc::clone(journal),
                fail_in,
            }),
        );
    }
    registry
}

fn tree(files: &[(&str, &str)]) -> tempfile::TempDir {
    let temp = tempfile::tempdir().expect("failed to create temp dir");
    for (rel, content) in files {
        let path = temp.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }
    temp
}

fn settings() -> BuildSettings {
    BuildSettings {
        source_date_epoch: Some(1_700_000_000),
        ..BuildSettings::default()
    }
}

fn prepare(root: &Path, hooks: HookRegistry, settings: BuildSettings) -> ProjectContext {
    let descriptor = ProjectDescriptor::load(root).unwrap();
    ProjectContext::prepare(
        descriptor,
        settings,
        hooks,
        &MetadataHookRegistry::with_builtins(),
    )
    .unwrap()
}

fn zip_entry(path: &Path, name: &str) -> Option<String> {
    let bytes = std::fs::read(path).unwrap();
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut file = archive.by_name(name).ok()?;
    let mut content = String::new();
    file.read_to_string(&mut content).unwrap();
    Some(content)
}

fn zip_names(path: &Path) -> Vec<String> {
    let bytes = std::fs::read(path).unwrap();
    let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    archive.file_names().map(ToString::to_string).collect()
}

const HOOKED: &str = r#"
[project]
name = "demo"
version = "0.1"

[tool.packsmith.build]
include = ["demo/**"]

[[tool.packsmith.build.hooks]]
name = "h1"

[[tool.packsmith.build.hooks]]
name = "h2"

[[tool.packsmith.build.hooks]]
name = "h3"

[tool.packsmith.build.targets.wheel]
"#;

#[test]
fn test_regex_version_binary_target() {
    let temp = tree(&[
        (
            "pyproject.toml",
            r#"
[project]
name = "demo"
dynamic = ["version"]

[tool.packsmith.version]
source = "regex"
path = "src/demo/__init__.py"

[tool.packsmith.build.targets.binary]
include = ["src/**"]
"#,
        ),
        ("src/demo/__init__.py", "VERSION = \"1.2.3\"\n"),
        ("src/demo/core.py", "X = 1\n"),
        ("README.md", "# Demo\n"),
    ]);
    let project = prepare(temp.path(), HookRegistry::with_builtins(), settings());
    assert_eq!(project.version().version, "1.2.3");

    let outcome = run_target(&project, "binary", &CancellationToken::new()).unwrap();
    assert_eq!(outcome.files, 2);
    let artifact = outcome.artifact.unwrap();
    assert_eq!(
        artifact.path,
        temp.path().join("dist/demo-1.2.3-py3-none-any.whl")
    );

    let names = zip_names(&artifact.path);
    assert!(names.contains(&"src/demo/__init__.py".to_string()));
    assert!(names.contains(&"src/demo/core.py".to_string()));
    assert!(!names.contains(&"README.md".to_string()));
    let metadata = zip_entry(&artifact.path, "demo-1.2.3.dist-info/METADATA").unwrap();
    assert!(metadata.contains("\nVersion: 1.2.3\n"));
}

#[test]
fn test_builds_are_byte_identical() {
    let temp = tree(&[
        ("pyproject.toml", "[project]\nname = \"demo\"\nversion = \"1.0\"\n"),
        ("demo/__init__.py", "A = 1\n"),
        ("demo/data/table.csv", "a,b\n1,2\n"),
    ]);
    let outputs = tempfile::tempdir().expect("failed to create temp dir");
    let build = |out: &str| {
        let mut settings = settings();
        settings.location = Some(outputs.path().join(out));
        let project = prepare(temp.path(), HookRegistry::with_builtins(), settings);
        ["sdist", "wheel"].map(|target| {
            run_target(&project, target, &CancellationToken::new())
                .unwrap()
                .artifact
                .unwrap()
        })
    };

    let first = build("out-a");
    let second = build("out-b");
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.sha256, b.sha256);
        assert_eq!(a.size, b.size);
        assert_eq!(a.path.file_name(), b.path.file_name());
        assert_eq!(std::fs::read(&a.path).unwrap(), std::fs::read(&b.path).unwrap());
    }
}

#[cfg(unix)]
#[test]
fn test_relative_root_rebuild_skips_previous_artifacts() {
    let temp = tree(&[
        ("pyproject.toml", "[project]\nname = \"demo\"\nversion = \"1.0\"\n"),
        ("demo/__init__.py", "A = 1\n"),
    ]);
    let cwd = std::env::current_dir().unwrap();
    let mut root = std::path::PathBuf::new();
    for _ in cwd.components().skip(1) {
        root.push("..");
    }
    root.push(temp.path().strip_prefix("/").unwrap());
    assert!(root.is_relative());

    let mut settings = settings();
    settings.location = Some(temp.path().join("dist"));
    let build = || {
        let project = prepare(&root, HookRegistry::with_builtins(), settings.clone());
        assert!(project.descriptor().root().is_absolute());
        run_target(&project, "sdist", &CancellationToken::new()).unwrap()
    };

    let first = build();
    let second = build();
    assert_eq!(first.files, second.files);
    assert_eq!(
        first.artifact.map(|a| a.sha256),
        second.artifact.map(|a| a.sha256)
    );
}

#[test]
fn test_later_force_include_wins() {
    let temp = tree(&[
        (
            "pyproject.toml",
            r#"
[project]
name = "pkg"
version = "1.0"

[tool.packsmith.build]
include = ["pkg/**"]
force-include = [
    { source = "a/data.json", path = "pkg/data.json" },
    { source = "b/data.json", path = "pkg/data.json" },
]

[tool.packsmith.build.targets.wheel]
"#,
        ),
        ("pkg/__init__.py", ""),
        ("pkg/data.json", "{\"from\": \"tree\"}"),
        ("a/data.json", "{\"from\": \"a\"}"),
        ("b/data.json", "{\"from\": \"b\"}"),
    ]);
    let project = prepare(temp.path(), HookRegistry::with_builtins(), settings());
    let outcome = run_target(&project, "wheel", &CancellationToken::new()).unwrap();

    let artifact = outcome.artifact.unwrap();
    assert_eq!(
        zip_entry(&artifact.path, "pkg/data.json").as_deref(),
        Some("{\"from\": \"b\"}")
    );
}

#[test]
fn test_hooks_run_in_declaration_order() {
    let temp = tree(&[("pyproject.toml", HOOKED), ("demo/__init__.py", "")]);
    let journal = Journal::default();
    let project = prepare(temp.path(), registry(&journal, &[]), settings());

    let outcome = run_target(&project, "wheel", &CancellationToken::new()).unwrap();
    let calls = journal.lock().unwrap().clone();
    insta::assert_yaml_snapshot!(calls, @r#"
    - "h1:initialize"
    - "h2:initialize"
    - "h3:initialize"
    - "h1:finalize:true"
    - "h2:finalize:true"
    - "h3:finalize:true"
    "#);
    assert_eq!(outcome.build_data.dependencies(), ["h1-dep", "h2-dep", "h3-dep"]);

    let metadata = zip_entry(
        outcome.artifact.as_ref().map(|a| a.path.as_path()).unwrap(),
        "demo-0.1.dist-info/METADATA",
    )
    .unwrap();
    assert!(metadata.contains("Requires-Dist: h1-dep\nRequires-Dist: h2-dep\n"));
}

#[test]
fn test_initialize_failure_isolates_target() {
    let temp = tree(&[("pyproject.toml", HOOKED), ("demo/__init__.py", "")]);
    let journal = Journal::default();
    let project = prepare(
        temp.path(),
        registry(&journal, &[("h2", HookPhase::Initialize)]),
        settings(),
    );

    let err = run_target(&project, "wheel", &CancellationToken::new()).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Hook);
    let Some(HookError::Initialize {
        failure,
        contributions,
    }) = err.as_hook_error()
    else {
        panic!("expected an initialize failure, got {err}");
    };
    assert_eq!(failure.hook, "h2");
    assert_eq!(contributions.dependencies(), ["h1-dep", "h2-dep"]);
    assert_eq!(
        *journal.lock().unwrap(),
        vec!["h1:initialize", "h2:initialize"]
    );
    assert!(!temp.path().join("dist/demo-0.1-py3-none-any.whl").exists());
}

#[test]
fn test_finalize_failure_keeps_artifact() {
    let temp = tree(&[("pyproject.toml", HOOKED), ("demo/__init__.py", "")]);
    let journal = Journal::default();
    let project = prepare(
        temp.path(),
        registry(&journal, &[("h1", HookPhase::Finalize)]),
        settings(),
    );

    let err = run_target(&project, "wheel", &CancellationToken::new()).unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"hook error: 1 finalize step(s) failed: hook 'h1' failed during finalize: h1 cleanup failed");
    assert_eq!(journal.lock().unwrap().len(), 6);
    assert!(temp.path().join("dist/demo-0.1-py3-none-any.whl").exists());
}

#[test]
fn test_hooks_only_skips_archive() {
    let temp = tree(&[("pyproject.toml", HOOKED), ("demo/__init__.py", "")]);
    let journal = Journal::default();
    let mut settings = settings();
    settings.hooks_only = true;
    settings.disable_hooks = vec!["h3".to_string()];
    let project = prepare(temp.path(), registry(&journal, &[]), settings);

    let outcome = run_target(&project, "wheel", &CancellationToken::new()).unwrap();
    assert_eq!(outcome.artifact, None);
    assert_eq!(
        outcome.hooks,
        vec![
            "h1:initialize:ok",
            "h2:initialize:ok",
            "h1:finalize:ok",
            "h2:finalize:ok"
        ]
    );
    assert!(!temp.path().join("dist").exists());
}

#[test]
fn test_version_file_hook_lands_in_archive() {
    let temp = tree(&[
        (
            "pyproject.toml",
            r#"
[project]
name = "demo"
version = "2.0rc1"

[[tool.packsmith.build.hooks]]
name = "version-file"
path = "demo/_version.py"
"#,
        ),
        ("demo/__init__.py", ""),
    ]);
    let project = prepare(temp.path(), HookRegistry::with_builtins(), settings());

    let wheel = run_target(&project, "wheel", &CancellationToken::new())
        .unwrap()
        .artifact
        .unwrap();
    assert_eq!(
        zip_entry(&wheel.path, "demo/_version.py").as_deref(),
        Some("__version__ = \"2.0rc1\"\n")
    );
    assert!(!temp.path().join("demo/_version.py").exists());
}

#[test]
fn test_cancelled_before_first_stage() {
    let temp = tree(&[("pyproject.toml", HOOKED), ("demo/__init__.py", "")]);
    let journal = Journal::default();
    let project = prepare(temp.path(), registry(&journal, &[]), settings());
    let token = CancellationToken::new();
    token.cancel();

    let err = run_target(&project, "wheel", &token).unwrap_err();
    assert!(matches!(err, PackError::Cancelled(ref target) if &**target == "wheel"));
    assert_eq!(err.category().exit_code(), 130);
    assert!(journal.lock().unwrap().is_empty());
}

#[test]
fn test_unknown_target_and_unresolved_metadata() {
    let temp = tree(&[
        (
            "pyproject.toml",
            "[project]\nname = \"demo\"\nversion = \"1\"\ndynamic = [\"description\"]\n",
        ),
        ("demo/__init__.py", ""),
    ]);
    let descriptor = ProjectDescriptor::load(temp.path()).unwrap();
    let err = ProjectContext::prepare(
        descriptor,
        settings(),
        HookRegistry::with_builtins(),
        &MetadataHookRegistry::with_builtins(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        PackError::Config(ref e) if matches!(**e, ConfigError::UnresolvedMetadataField { ref field } if field == "description")
    ));

    let temp = tree(&[
        ("pyproject.toml", "[project]\nname = \"demo\"\nversion = \"1\"\n"),
        ("demo/__init__.py", ""),
    ]);
    let project = prepare(temp.path(), HookRegistry::with_builtins(), settings());
    let err = run_target(&project, "docs", &CancellationToken::new()).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Configuration);
}

#[test]
fn test_stage_names() {
    let stages: Vec<String> = [
        Stage::Select,
        Stage::Initialize,
        Stage::Build,
        Stage::Write,
        Stage::Finalize,
    ]
    .iter()
    .map(ToString::to_string)
    .collect();
    assert_eq!(stages, ["select", "initialize", "build", "write", "finalize"]);
}

/// Build sdist and wheel from a tree written in the given order.
fn build_all(files: &[(String, String)]) -> (tempfile::TempDir, [crate::artifact::Artifact; 2]) {
    let entries: Vec<(&str, &str)> = files.iter().map(|(p, c)| (p.as_str(), c.as_str())).collect();
    let temp = tree(&entries);
    let project = prepare(temp.path(), HookRegistry::with_builtins(), settings());
    let artifacts = ["sdist", "wheel"].map(|target| {
        run_target(&project, target, &CancellationToken::new())
            .unwrap()
            .artifact
            .unwrap()
    });
    (temp, artifacts)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn equal_trees_build_byte_identical_archives(
        files in prop::collection::btree_map("[a-c]{1,2}(/[a-c]{1,2})?\\.(py|txt)", "[ -~]{0,40}", 0..8),
    ) {
        let mut entries = vec![
            ("pyproject.toml".to_string(), "[project]\nname = \"demo\"\nversion = \"1.0\"\n".to_string()),
            ("demo/__init__.py".to_string(), "A = 1\n".to_string()),
        ];
        entries.extend(files.into_iter().map(|(rel, body)| (format!("demo/{rel}"), body)));

        let (_first_tree, first) = build_all(&entries);
        entries.reverse();
        let (_second_tree, second) = build_all(&entries);
        for (a, b) in first.iter().zip(&second) {
            prop_assert_eq!(a.path.file_name(), b.path.file_name());
            prop_assert_eq!(&a.sha256, &b.sha256);
            prop_assert_eq!(std::fs::read(&a.path).unwrap(), std::fs::read(&b.path).unwrap());
        }
    }
}
