// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::{LogConfig, LogContext, LogLevel};

#[test]
fn test_log_context_clear_hook() {
    let mut ctx = LogContext::with_target("wheel");
    ctx.set_hook("script");
    let with_hook = ctx.prefix();
    ctx.clear_hook();

    insta::assert_yaml_snapshot!(
        vec![("with_hook", with_hook), ("after_clear", ctx.prefix())],
        @r#"
    - - with_hook
      - "[wheel/script] "
    - - after_clear
      - "[wheel] "
    "#
    );
    assert!(ctx.hook().is_none(), "hook should be None after clear_hook");
}

#[test]
fn test_log_level_rejects_out_of_range() {
    assert!(LogLevel::new(7).is_err());
    assert_eq!(LogLevel::from_u8(4), Some(LogLevel::DEBUG));
    assert_eq!(LogLevel::from_u8(9), None);
}

#[test]
fn test_filter_strings_scope_debug_to_crate() {
    insta::assert_yaml_snapshot!(
        vec![
            LogLevel::SILENT.to_filter_string(),
            LogLevel::INFO.to_filter_string(),
            LogLevel::DEBUG.to_filter_string(),
            LogLevel::DUMP.to_filter_string(),
        ],
        @r#"
    - "off"
    - info
    - "warn,packsmith=debug"
    - trace
    "#
    );
}

#[test]
fn test_log_config_defaults() {
    let config = LogConfig::default();
    assert_eq!(config.console_level(), LogLevel::INFO);
    assert_eq!(config.file_level(), LogLevel::TRACE);
    assert!(config.log_file().is_none());
    assert!(config.show_timestamps());
    assert!(!config.json_console());
}
