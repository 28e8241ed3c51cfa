//! The frozen module graph the converter reads from
//!
//! Modules arrive fully variant-resolved (defaults already applied) as JSON.
//! A module name may appear several times with different variants; the first
//! variant in `(variant)` order is the primary one and is the one converted.

use crate::error::{Error, Result};
use crate::label::DepRef;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Bazel-related settings a module may carry in its definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BazelModuleProps {
    /// Hand-written target this module is redirected to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Per-module opt in / opt out
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bp2build_available: Option<bool>,
}

/// One variant of one module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    #[serde(rename = "type")]
    pub module_type: String,
    /// Directory relative to the source root, `""` for the root
    #[serde(default)]
    pub dir: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default)]
    pub deps: Vec<DepRef>,
    #[serde(default)]
    pub bazel_module: BazelModuleProps,
}

impl Module {
    pub fn new(name: impl Into<String>, module_type: impl Into<String>, dir: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module_type: module_type.into(),
            dir: dir.into(),
            variant: None,
            properties: Map::new(),
            deps: Vec::new(),
            bazel_module: BazelModuleProps::default(),
        }
    }

    pub fn with_properties(mut self, properties: Value) -> Self {
        if let Value::Object(map) = properties {
            self.properties = map;
        }
        self
    }

    pub fn with_deps<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deps = deps.into_iter().map(DepRef::new).collect();
        self
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }
}

#[derive(Deserialize)]
struct GraphFile {
    modules: Vec<Module>,
}

/// Read-only module graph indexed by name
#[derive(Debug, Clone, Default)]
pub struct ModuleGraph {
    modules: Vec<Module>,
    by_name: BTreeMap<String, Vec<usize>>,
    packages: BTreeSet<String>,
}

impl ModuleGraph {
    /// Builds and validates the graph; duplicate `(name, variant)` pairs are fatal
    pub fn new(modules: Vec<Module>) -> Result<Self> {
        let mut modules: Vec<Module> = modules
            .into_iter()
            .map(|mut module| {
                module.dir = normalize_dir(&module.dir);
                module
            })
            .collect();
        modules.sort_by(|a, b| {
            (&a.name, &a.variant, &a.dir).cmp(&(&b.name, &b.variant, &b.dir))
        });

        let mut by_name: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        let mut packages = BTreeSet::new();
        for (idx, module) in modules.iter().enumerate() {
            if module.name.is_empty() {
                return Err(Error::GraphError(format!(
                    "module of type {} in {:?} has no name",
                    module.module_type, module.dir
                )));
            }
            let variants = by_name.entry(module.name.clone()).or_default();
            if let Some(&first) = variants.first() {
                let first = &modules[first];
                if first.dir != module.dir {
                    return Err(Error::GraphError(format!(
                        "module {} is defined in both {:?} and {:?}",
                        module.name, first.dir, module.dir
                    )));
                }
            }
            if variants.iter().any(|&i| modules[i].variant == module.variant) {
                return Err(Error::GraphError(format!(
                    "duplicate module {} (variant {:?})",
                    module.name, module.variant
                )));
            }
            variants.push(idx);
            packages.insert(module.dir.clone());
        }

        debug!(
            "Loaded module graph: {} modules, {} variants, {} packages",
            by_name.len(),
            modules.len(),
            packages.len()
        );
        Ok(Self {
            modules,
            by_name,
            packages,
        })
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let file: GraphFile = serde_json::from_str(content)
            .map_err(|e| Error::GraphError(format!("invalid module graph: {e}")))?;
        Self::new(file.modules)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// The converted variant of `name`
    pub fn primary(&self, name: &str) -> Option<&Module> {
        self.by_name
            .get(name)
            .and_then(|indices| indices.first())
            .map(|&idx| &self.modules[idx])
    }

    pub fn variants(&self, name: &str) -> impl Iterator<Item = &Module> {
        self.by_name
            .get(name)
            .into_iter()
            .flatten()
            .map(|&idx| &self.modules[idx])
    }

    /// One module per name, sorted by name
    pub fn primaries(&self) -> impl Iterator<Item = &Module> {
        self.by_name.values().map(|indices| &self.modules[indices[0]])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Whether any module is defined in `dir`
    pub fn has_package(&self, dir: &str) -> bool {
        self.packages.contains(dir)
    }

    /// Union of the dependency references of every variant of `name`
    pub fn dependencies(&self, name: &str) -> Vec<&DepRef> {
        let mut seen = BTreeSet::new();
        self.variants(name)
            .flat_map(|module| module.deps.iter())
            .filter(|dep| seen.insert(&dep.name))
            .collect()
    }

    /// Primary modules with dependencies before dependents.
    ///
    /// Ties are broken by name so the order is stable; modules caught in a
    /// cycle are appended in name order once nothing else is ready.
    pub fn dependency_order(&self) -> Vec<&Module> {
        let mut remaining: BTreeMap<&str, usize> = BTreeMap::new();
        let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for module in self.primaries() {
            let deps: BTreeSet<&str> = self
                .dependencies(&module.name)
                .into_iter()
                .map(|dep| dep.name.as_str())
                .filter(|dep| *dep != module.name && self.contains(dep))
                .collect();
            remaining.insert(&module.name, deps.len());
            for dep in deps {
                dependents.entry(dep).or_default().push(&module.name);
            }
        }

        let mut ready: VecDeque<&str> = remaining
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(name, _)| *name)
            .collect();
        let mut order = Vec::with_capacity(remaining.len());
        let mut done = BTreeSet::new();

        loop {
            while let Some(name) = ready.pop_front() {
                if !done.insert(name) {
                    continue;
                }
                order.push(name);
                let mut unlocked = Vec::new();
                for dependent in dependents.get(name).into_iter().flatten() {
                    if let Some(count) = remaining.get_mut(dependent) {
                        *count = count.saturating_sub(1);
                        if *count == 0 {
                            unlocked.push(*dependent);
                        }
                    }
                }
                unlocked.sort();
                ready.extend(unlocked);
            }
            // Break a cycle by releasing its smallest member.
            match remaining.keys().find(|name| !done.contains(*name)) {
                Some(name) => ready.push_back(*name),
                None => break,
            }
        }

        order
            .into_iter()
            .filter_map(|name| self.primary(name))
            .collect()
    }
}

/// `./foo/bar/` and `foo/bar` name the same directory
pub fn normalize_dir(dir: &str) -> String {
    let trimmed = dir.trim_matches('/');
    match trimmed {
        "." => String::new(),
        _ => trimmed.trim_start_matches("./").to_string(),
    }
}
