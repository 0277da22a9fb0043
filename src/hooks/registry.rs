// packsmith: pluggable package build engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Hook registries.
//!
//! ```text
//! declaration [[...hooks]] name = "version-file", path = "pkg/_v.py"
//!   is_hook_enabled(name)?  -- no --> skipped
//!   factories[name]         -- missing --> UnknownHook
//!   factory(spec)           -- Err --> InvalidValue
//!   --> Arc<dyn BuildHook>
//! ```
//!
//! Registration is static: the embedding host fills the registry before the
//! build starts; nothing is discovered at runtime.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::BuildSettings;
use crate::config::types::HookSpec;
use crate::error::{ConfigError, Result};

use super::BuildHook;
use super::builtin;

/// Creates a hook instance from its declaration.
pub type HookFactory<H> = Arc<dyn Fn(&HookSpec) -> Result<Arc<H>> + Send + Sync>;

/// Name-to-factory mapping for one family of hooks.
pub struct Registry<H: ?Sized> {
    kind: &'static str,
    section: &'static str,
    factories: BTreeMap<String, HookFactory<H>>,
}

/// Registry of build hooks.
pub type HookRegistry = Registry<dyn BuildHook>;

impl<H: ?Sized> std::fmt::Debug for Registry<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("kind", &self.kind)
            .field("hooks", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<H: ?Sized + 'static> Registry<H> {
    /// Creates an empty registry.
    ///
    /// `kind` names the family in errors ("build", "metadata"); `section` is
    /// the descriptor table reported for invalid hook configuration.
    #[must_use]
    pub fn empty(kind: &'static str, section: &'static str) -> Self {
        Self {
            kind,
            section,
            factories: BTreeMap::new(),
        }
    }

    /// Registers a factory, replacing any previous one with the same name.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&HookSpec) -> Result<Arc<H>> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    /// Registers a ready-made instance shared by every declaration of `name`.
    pub fn register_instance(&mut self, name: impl Into<String>, hook: Arc<H>)
    where
        Arc<H>: Send + Sync,
    {
        self.register(name, move |_| Ok(Arc::clone(&hook)));
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Instantiates one declaration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownHook` if no factory is registered under
    /// the name and `ConfigError::InvalidValue` if the factory rejects the
    /// configuration.
    pub fn instantiate(&self, spec: &HookSpec) -> std::result::Result<Arc<H>, ConfigError> {
        let factory = self
            .factories
            .get(&spec.name)
            .ok_or_else(|| ConfigError::UnknownHook {
                kind: self.kind,
                name: spec.name.clone(),
            })?;
        factory(spec).map_err(|e| ConfigError::InvalidValue {
            section: self.section.to_string(),
            key: spec.name.clone(),
            message: format!("{e:#}"),
        })
    }

    /// Instantiates every enabled declaration, preserving declaration order.
    ///
    /// Disabled declarations are skipped before lookup, so a hook the host
    /// does not provide can be switched off from the command line.
    ///
    /// # Errors
    ///
    /// Returns the first error from [`Registry::instantiate`].
    pub fn resolve(
        &self,
        specs: &[HookSpec],
        settings: &BuildSettings,
    ) -> std::result::Result<Vec<Arc<H>>, ConfigError> {
        let mut hooks = Vec::with_capacity(specs.len());
        for spec in specs {
            if !settings.is_hook_enabled(&spec.name, spec.enable_by_default) {
                debug!(kind = self.kind, hook = %spec.name, "Hook disabled");
                continue;
            }
            hooks.push(self.instantiate(spec)?);
        }
        Ok(hooks)
    }
}

impl HookRegistry {
    /// Empty build-hook registry.
    #[must_use]
    pub fn new() -> Self {
        Self::empty("build", "tool.packsmith.build.hooks")
    }

    /// Registry pre-filled with the built-in build hooks.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        builtin::register_all(&mut registry);
        registry
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Deserializes the opaque keys of a hook declaration.
///
/// # Errors
///
/// Returns an error if the keys do not match `T`.
pub fn hook_config<T: DeserializeOwned>(spec: &HookSpec) -> Result<T> {
    Ok(toml::Value::Table(spec.config.clone()).try_into()?)
}
