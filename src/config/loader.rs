// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Settings loading from multiple sources.
//!
//! # Loader Pipeline
//!
//! ```text
//! SettingsLoader::new()
//!   .add_toml_file_optional()
//!   .add_toml_str()
//!   .with_environment(snapshot)
//!   .set()
//!        |
//!        v
//!    build() --> BuildSettings
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use super::BuildSettings;
use crate::error::{ConfigError, Result};

/// Prefix for engine environment variables.
pub const ENV_PREFIX: &str = "PACKSMITH";

/// Reproducibility timestamp variable.
pub const SOURCE_DATE_EPOCH: &str = "SOURCE_DATE_EPOCH";

/// Builder for loading [`BuildSettings`] from multiple sources.
pub struct SettingsLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    environment: BTreeMap<String, String>,
    files: Vec<(String, PathBuf)>,
}

impl SettingsLoader {
    #[must_use]
    pub fn new() -> Self {
        Self {
            builder: config::Config::builder(),
            environment: BTreeMap::new(),
            files: Vec::new(),
        }
    }

    /// Adds a TOML settings file that must exist.
    #[must_use]
    pub fn add_toml_file<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        use config::{File, FileFormat};
        let p = path.as_ref();
        self.builder = self
            .builder
            .add_source(File::from(p).format(FileFormat::Toml).required(true));
        self.files.push(("file".to_string(), p.to_path_buf()));
        self
    }

    #[must_use]
    pub fn add_toml_file_optional<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        use config::{File, FileFormat};
        let p = path.as_ref();
        self.builder = self
            .builder
            .add_source(File::from(p).format(FileFormat::Toml).required(false));
        if p.exists() {
            self.files.push(("optional".to_string(), p.to_path_buf()));
        }
        self
    }

    #[must_use]
    pub fn add_toml_str(mut self, content: &str) -> Self {
        use config::{File, FileFormat};
        self.builder = self
            .builder
            .add_source(File::from_str(content, FileFormat::Toml));
        self.files
            .push(("string".to_string(), PathBuf::from("<string>")));
        self
    }

    /// Uses the given variables as the invocation's environment snapshot.
    ///
    /// `PACKSMITH_*` variables become settings; the whole snapshot is kept in
    /// [`BuildSettings::environment`] for version sources and hooks.
    #[must_use]
    pub fn with_environment<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.environment = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /// Sets a settings override.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or if the value cannot be converted
    /// to a configuration value.
    pub fn set<T: Into<config::Value>>(mut self, key: &str, value: T) -> Result<Self> {
        self.builder = self
            .builder
            .set_override(key, value)
            .map_err(|e| anyhow::anyhow!("Config error: {e}"))?;
        Ok(self)
    }

    /// Builds the settings from all added sources.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required settings files are missing or have invalid TOML syntax.
    /// - `SOURCE_DATE_EPOCH` is not an integer.
    /// - The merged settings cannot be deserialized into [`BuildSettings`].
    pub fn build(self) -> Result<BuildSettings> {
        let prefixed: config::Map<String, String> = self
            .environment
            .iter()
            .filter(|(k, _)| k.starts_with(ENV_PREFIX))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let mut builder = self.builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .source(Some(prefixed))
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("enable_hooks")
                .with_list_parse_key("disable_hooks"),
        );

        if let Some(raw) = self.environment.get(SOURCE_DATE_EPOCH) {
            let epoch: i64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                section: "environment".to_string(),
                key: SOURCE_DATE_EPOCH.to_string(),
                message: format!("'{raw}' is not an integer number of seconds"),
            })?;
            builder = builder
                .set_default("source_date_epoch", epoch)
                .map_err(|e| anyhow::anyhow!("Config error: {e}"))?;
        }

        let cfg = builder.build()?;
        let mut settings: BuildSettings = cfg.try_deserialize()?;
        settings.environment = self.environment;
        Ok(settings)
    }

    #[must_use]
    pub fn loaded_files(&self) -> Vec<(String, PathBuf)> {
        self.files.clone()
    }
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}
