// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::expr::{Value, evaluate_version, load_namespace};
use super::pep440::{Version, normalize};
use super::{
    ResolvedVersion, VersionContext, VersionProvenance, resolve_version,
};
use crate::config::BuildSettings;
use crate::config::types::VersionSourceConfig;
use crate::error::VersionError;
use std::path::{Path, PathBuf};

fn resolve(
    config: &VersionSourceConfig,
    root: &Path,
    settings: &BuildSettings,
) -> Result<ResolvedVersion, VersionError> {
    resolve_version(config, &VersionContext { root, settings })
}

#[test]
fn test_pep440_normalization() {
    let inputs = [
        "1.0",
        "v1.0.0",
        " 1.0 ",
        "01.002.0003",
        "1!2.0",
        "0!1.0",
        "1.0-ALPHA.2",
        "1.0beta",
        "1.0c3",
        "1.0pre1",
        "1.0preview-2",
        "1.0-1",
        "1.0.rev4",
        "1.0r",
        "1.0-dev",
        "1.0_dev_7",
        "1.0rc1.post2.dev3",
        "1.0+Ubuntu_1-2",
        "1.0+abc.007",
    ];
    let normalized: Vec<String> = inputs
        .iter()
        .map(|v| format!("{v:?} -> {}", normalize(v).unwrap()))
        .collect();

    insta::assert_snapshot!(normalized.join("\n"), @r#"
    "1.0" -> 1.0
    "v1.0.0" -> 1.0.0
    " 1.0 " -> 1.0
    "01.002.0003" -> 1.2.3
    "1!2.0" -> 1!2.0
    "0!1.0" -> 1.0
    "1.0-ALPHA.2" -> 1.0a2
    "1.0beta" -> 1.0b0
    "1.0c3" -> 1.0rc3
    "1.0pre1" -> 1.0rc1
    "1.0preview-2" -> 1.0rc2
    "1.0-1" -> 1.0.post1
    "1.0.rev4" -> 1.0.post4
    "1.0r" -> 1.0.post0
    "1.0-dev" -> 1.0.dev0
    "1.0_dev_7" -> 1.0.dev7
    "1.0rc1.post2.dev3" -> 1.0rc1.post2.dev3
    "1.0+Ubuntu_1-2" -> 1.0+ubuntu.1.2
    "1.0+abc.007" -> 1.0+abc.7
    "#);
}

#[test]
fn test_pep440_rejects_garbage() {
    for input in ["", "one", "1.0.", "1.0+", "1..0", "1.0-foo"] {
        assert!(
            matches!(normalize(input), Err(VersionError::Invalid { .. })),
            "{input:?} should be invalid"
        );
    }
}

#[test]
fn test_next_dev_version() {
    let bumped: Vec<String> = ["1.2.3", "1.2", "2.0rc1", "1.2.3.4"]
        .iter()
        .map(|v| Version::parse(v).unwrap().next_dev(5).unwrap().to_string())
        .collect();
    assert_eq!(
        bumped,
        vec!["1.2.4.dev5", "1.2.1.dev5", "2.0rc2.dev5", "1.2.3.5.dev5"]
    );

    let local = Version::parse("1.2.3")
        .unwrap()
        .next_dev(2)
        .unwrap()
        .with_local(["gabc1234".to_string(), "dirty".to_string()]);
    assert_eq!(local.to_string(), "1.2.4.dev2+gabc1234.dirty");
}

#[test]
fn test_next_dev_rejects_overflow() {
    for tag in ["1.2.18446744073709551615", "1.0rc18446744073709551615"] {
        let err = Version::parse(tag).unwrap().next_dev(1).unwrap_err();
        assert!(
            matches!(err, VersionError::Invalid { ref version, .. } if version == tag),
            "{tag}: {err}"
        );
    }
}

#[test]
fn test_expr_namespace_and_join() {
    let source = r#"
# comment line
import os
VERSION_INFO = (1, 4, "0rc1")
__version__ = ".".join(map(str, VERSION_INFO))
if True:
    __version__ = "ignored"
MAJOR: int = VERSION_INFO[0]
"#;
    let namespace = load_namespace(source);
    assert_eq!(
        namespace.get("__version__"),
        Some(&Value::Str("1.4.0rc1".to_string()))
    );
    assert_eq!(namespace.get("MAJOR"), Some(&Value::Int(1)));
    assert!(!namespace.contains_key("os"));

    assert_eq!(
        evaluate_version(source, "str(MAJOR) + '.' + str(VERSION_INFO[-1])").unwrap(),
        "1.0rc1"
    );
}

#[test]
fn test_expr_rejects_non_string_result() {
    let err = evaluate_version("VERSION = (1, 2)\n", "VERSION").unwrap_err();
    insta::assert_snapshot!(
        err.to_string(),
        @"version source 'code' failed: expression 'VERSION' evaluated to sequence, expected str"
    );
}

#[test]
fn test_expr_undefined_name() {
    let err = evaluate_version("A = '1'\n", "B").unwrap_err();
    assert!(matches!(err, VersionError::Source { source_name: "code", .. }));
}

#[test]
fn test_static_source() {
    let resolved = resolve(
        &VersionSourceConfig::Static {
            version: "2.0.0-RC.1".to_string(),
        },
        Path::new("."),
        &BuildSettings::default(),
    )
    .unwrap();
    assert_eq!(resolved.version, "2.0.0rc1");
    assert_eq!(resolved.provenance, VersionProvenance::Static);
}

#[test]
fn test_regex_source_default_pattern() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("version.py"), "VERSION = \"1.2.3\"\n").unwrap();

    let resolved = resolve(
        &VersionSourceConfig::Regex {
            path: PathBuf::from("version.py"),
            pattern: None,
        },
        dir.path(),
        &BuildSettings::default(),
    )
    .unwrap();
    assert_eq!(resolved.version, "1.2.3");
}

#[test]
fn test_regex_source_custom_pattern_and_missing_match() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("VERSION.txt"), "release: v4.5\n").unwrap();

    let custom = VersionSourceConfig::Regex {
        path: PathBuf::from("VERSION.txt"),
        pattern: Some(r"release: v(\S+)".to_string()),
    };
    let settings = BuildSettings::default();
    assert_eq!(resolve(&custom, dir.path(), &settings).unwrap().version, "4.5");

    let default = VersionSourceConfig::Regex {
        path: PathBuf::from("VERSION.txt"),
        pattern: None,
    };
    assert!(matches!(
        resolve(&default, dir.path(), &settings),
        Err(VersionError::NotFound { source_name: "regex", .. })
    ));

    let missing = VersionSourceConfig::Regex {
        path: PathBuf::from("nope.py"),
        pattern: None,
    };
    assert!(matches!(
        resolve(&missing, dir.path(), &settings),
        Err(VersionError::Read { .. })
    ));
}

#[test]
fn test_code_source() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("about.py"),
        "__version_info__ = (0, 9, 1)\n__version__ = '.'.join(map(str, __version_info__))\n",
    )
    .unwrap();

    let resolved = resolve(
        &VersionSourceConfig::Code {
            path: PathBuf::from("about.py"),
            expression: "__version__".to_string(),
        },
        dir.path(),
        &BuildSettings::default(),
    )
    .unwrap();
    assert_eq!(resolved.version, "0.9.1");
}

#[test]
fn test_env_source_reads_snapshot_only() {
    let mut settings = BuildSettings::default();
    settings
        .environment
        .insert("PKG_VERSION".to_string(), "3.1".to_string());

    let config = VersionSourceConfig::Env {
        variable: "PKG_VERSION".to_string(),
        default: None,
    };
    let resolved = resolve(&config, Path::new("."), &settings).unwrap();
    assert_eq!(resolved.version, "3.1");

    let unset = BuildSettings::default();
    assert!(matches!(
        resolve(&config, Path::new("."), &unset),
        Err(VersionError::NotFound { source_name: "env", .. })
    ));

    let with_default = VersionSourceConfig::Env {
        variable: "PKG_VERSION".to_string(),
        default: Some("0.0.1".to_string()),
    };
    let resolved = resolve(&with_default, Path::new("."), &unset).unwrap();
    assert_eq!(
        resolved.provenance,
        VersionProvenance::Env {
            variable: "PKG_VERSION".to_string(),
            defaulted: true
        }
    );
}

#[test]
fn test_invalid_version_is_fatal() {
    let err = resolve(
        &VersionSourceConfig::Static {
            version: "not-a-version".to_string(),
        },
        Path::new("."),
        &BuildSettings::default(),
    )
    .unwrap_err();
    assert!(matches!(err, VersionError::Invalid { .. }));
}

#[test]
fn test_vcs_source_outside_repository() {
    let dir = tempfile::tempdir().unwrap();
    let err = resolve(
        &VersionSourceConfig::Vcs {
            tag_pattern: None,
            fallback_version: Some("0.0.0".to_string()),
        },
        dir.path(),
        &BuildSettings::default(),
    )
    .unwrap_err();
    assert!(matches!(err, VersionError::Source { source_name: "vcs", .. }));
}
