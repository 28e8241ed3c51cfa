//! Conversion configuration
//!
//! Which directories and modules convert, which modules are provided
//! externally, the build's known arches/OSes/product variables and the
//! schemas the generic rule handler works from.

mod loader;
mod rules;
mod scope;

pub use loader::ConfigLoader;
pub use rules::{AttributeKind, AttributeSchema, RuleSchema};
pub use scope::{DirectoryDefault, DirectoryScope};

use crate::axis::BuildConfig;
use crate::error::{Error, Result};
use crate::graph::{Module, normalize_dir};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Everything that decides what gets converted and how
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Bp2BuildConfig {
    /// Directory defaults; the most specific matching entry wins
    pub directories: BTreeMap<String, DirectoryDefault>,
    /// Modules converted regardless of their directory
    pub always_convert: BTreeSet<String>,
    /// Modules never converted
    pub never_convert: BTreeSet<String>,
    /// Modules that must convert; the run fails otherwise
    pub force_enabled: BTreeSet<String>,
    /// Modules treated as provided outside the generated tree
    pub assume_present: BTreeSet<String>,
    /// Modules allowed to reference their own variants
    pub bootstrap_modules: BTreeSet<String>,
    pub build: BuildConfig,
    /// Generic rule schemas keyed by module type
    pub rules: BTreeMap<String, RuleSchema>,
    #[serde(skip)]
    scopes: Vec<DirectoryScope>,
}

impl Bp2BuildConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: Bp2BuildConfig = serde_json::from_str(content)
            .map_err(|e| Error::ConfigError(format!("invalid config: {e}")))?;
        config.validated()
    }

    /// Checks for contradictions and prepares the directory scopes
    pub fn validated(mut self) -> Result<Self> {
        let conflicts: Vec<&String> = self
            .never_convert
            .iter()
            .filter(|name| self.always_convert.contains(*name) || self.force_enabled.contains(*name))
            .collect();
        if !conflicts.is_empty() {
            return Err(Error::ConfigError(format!(
                "modules both enabled and disabled: {}",
                conflicts
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }

        let mut seen = BTreeMap::new();
        for (dir, default) in &self.directories {
            let normalized = normalize_dir(dir);
            if let Some(previous) = seen.insert(normalized.clone(), *default) {
                if previous != *default {
                    return Err(Error::ConfigError(format!(
                        "directory {normalized:?} is listed twice with different defaults"
                    )));
                }
            }
        }
        self.scopes = seen
            .into_iter()
            .map(|(dir, default)| DirectoryScope::new(dir, default))
            .collect();

        for (module_type, schema) in &self.rules {
            schema.validate(module_type)?;
        }
        Ok(self)
    }

    /// Builder-style helpers, mostly for tests and embedding
    pub fn with_directory(mut self, dir: &str, default: DirectoryDefault) -> Self {
        self.directories.insert(dir.to_string(), default);
        let normalized = normalize_dir(dir);
        self.scopes.retain(|scope| scope.dir() != normalized);
        self.scopes.push(DirectoryScope::new(normalized, default));
        self
    }

    pub fn with_assume_present(mut self, name: &str) -> Self {
        self.assume_present.insert(name.to_string());
        self
    }

    pub fn with_force_enabled(mut self, name: &str) -> Self {
        self.force_enabled.insert(name.to_string());
        self
    }

    pub fn with_bootstrap_module(mut self, name: &str) -> Self {
        self.bootstrap_modules.insert(name.to_string());
        self
    }

    /// Whether modules in `dir` convert when nothing more specific says otherwise
    pub fn directory_enabled(&self, dir: &str) -> bool {
        self.scopes
            .iter()
            .filter(|scope| scope.matches(dir))
            .max_by_key(|scope| scope.specificity(dir))
            .is_some_and(|scope| scope.default().is_enabled())
    }

    /// Allowlist decision for one module, before dependency checks
    pub fn is_enabled(&self, module: &Module) -> bool {
        if self.never_convert.contains(&module.name) {
            return false;
        }
        if self.always_convert.contains(&module.name) || self.force_enabled.contains(&module.name) {
            return true;
        }
        match module.bazel_module.bp2build_available {
            Some(available) => available,
            None => self.directory_enabled(&module.dir),
        }
    }

    pub fn is_assumed_present(&self, name: &str) -> bool {
        self.assume_present.contains(name)
    }

    pub fn is_bootstrap(&self, name: &str) -> bool {
        self.bootstrap_modules.contains(name)
    }

    pub fn is_force_enabled(&self, name: &str) -> bool {
        self.force_enabled.contains(name)
    }
}
