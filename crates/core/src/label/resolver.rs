//! Dependency status and label construction
//!
//! Statuses are computed once over the frozen graph before any module
//! converts. A module whose dependency is missing or will not be converted is
//! dropped, and the drop propagates to everything depending on it unless the
//! dependency is assumed to be provided externally.

use super::{DepRef, Label, SourceRef};
use crate::config::Bp2BuildConfig;
use crate::configurable::Configurable;
use crate::convert::{RuleRegistry, STUB_SUITE_SUFFIX};
use crate::error::{ConvertError, ModuleError};
use crate::graph::{Module, ModuleGraph};
use crate::workspace::{PackageBoundaries, join_path};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, trace};

/// Outcome of resolving one dependency reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyStatus {
    Resolved(Label),
    Missing,
    Unconverted,
    SelfReferential,
}

/// Conversion status of a module
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleState {
    /// Will be converted by a rule handler
    Convertible,
    /// Redirected to a hand-written target
    Handwritten(Label),
    /// Not selected for conversion
    Disabled(String),
    /// Selected, but a dependency problem prevents conversion
    Dropped(ModuleError),
}

impl ModuleState {
    pub fn is_convertible(&self) -> bool {
        matches!(self, ModuleState::Convertible)
    }
}

/// Resolves references against the frozen graph
pub struct LabelResolver {
    graph: Arc<ModuleGraph>,
    config: Arc<Bp2BuildConfig>,
    registry: Arc<RuleRegistry>,
    boundaries: Arc<dyn PackageBoundaries>,
    states: BTreeMap<String, ModuleState>,
    /// Module to the modules its properties resolved to during conversion
    property_edges: Mutex<BTreeMap<String, BTreeSet<String>>>,
}

impl LabelResolver {
    /// Computes every module's status, including transitive drops
    pub fn new(
        graph: Arc<ModuleGraph>,
        config: Arc<Bp2BuildConfig>,
        registry: Arc<RuleRegistry>,
        boundaries: Arc<dyn PackageBoundaries>,
    ) -> Self {
        let mut states: BTreeMap<String, ModuleState> = graph
            .primaries()
            .map(|module| (module.name.clone(), initial_state(module, &config, &registry)))
            .collect();

        // Direct problems: the dependency does not exist or will not convert.
        let mut direct = Vec::new();
        for module in graph.primaries() {
            if !states[&module.name].is_convertible() {
                continue;
            }
            for dep in graph.dependencies(&module.name) {
                if dep.name == module.name || config.is_assumed_present(&dep.name) {
                    continue;
                }
                let error = match states.get(&dep.name) {
                    None => ModuleError::MissingDependency(dep.name.clone()),
                    Some(ModuleState::Disabled(_)) => ModuleError::UnconvertedDependency(dep.name.clone()),
                    Some(_) => continue,
                };
                direct.push((module.name.clone(), error));
                break;
            }
        }
        for (name, error) in direct {
            debug!("Dropping {}: {}", name, error);
            states.insert(name, ModuleState::Dropped(error));
        }

        propagate(&graph, &config, &BTreeMap::new(), &mut states);

        Self {
            graph,
            config,
            registry,
            boundaries,
            states,
            property_edges: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn state(&self, name: &str) -> Option<&ModuleState> {
        self.states.get(name)
    }

    pub fn states(&self) -> &BTreeMap<String, ModuleState> {
        &self.states
    }

    /// Whether a rule handler should be run for `name`
    pub fn should_convert(&self, name: &str) -> bool {
        self.states.get(name).is_some_and(ModuleState::is_convertible)
    }

    /// Marks modules whose conversion failed and drops their dependents,
    /// including modules that only reference them through properties.
    ///
    /// Returns the names of every module that changed state, the failed
    /// ones included.
    pub fn record_failures(&mut self, failures: &BTreeMap<String, ModuleError>) -> Vec<String> {
        let before: BTreeMap<String, bool> = self
            .states
            .iter()
            .map(|(name, state)| (name.clone(), state.is_convertible()))
            .collect();
        for (name, error) in failures {
            self.states.insert(name.clone(), ModuleState::Dropped(error.clone()));
        }
        let edges = self
            .property_edges
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        propagate(&self.graph, &self.config, edges, &mut self.states);
        self.states
            .iter()
            .filter(|(name, state)| before.get(*name) == Some(&true) && !state.is_convertible())
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Resolves one reference made by `from`
    pub fn resolve(&self, from: &Module, dep: &DepRef) -> DependencyStatus {
        if dep.name == from.name {
            return match &dep.variant {
                Some(variant) if self.config.is_bootstrap(&from.name) => {
                    DependencyStatus::Resolved(self.module_label(&from.dir, from, Some(variant)))
                }
                _ => DependencyStatus::SelfReferential,
            };
        }

        let Some(target) = self.graph.primary(&dep.name) else {
            return DependencyStatus::Missing;
        };
        let label = self.module_label(&from.dir, target, dep.variant.as_deref());
        match self.states.get(&dep.name) {
            Some(ModuleState::Convertible | ModuleState::Handwritten(_)) => DependencyStatus::Resolved(label),
            _ if self.config.is_assumed_present(&dep.name) => DependencyStatus::Resolved(label),
            _ => DependencyStatus::Unconverted,
        }
    }

    /// Resolves a list of references; self references and duplicates vanish
    pub fn resolve_deps(&self, from: &Module, deps: &[DepRef]) -> Result<Vec<Label>, ModuleError> {
        let mut labels = Vec::with_capacity(deps.len());
        for dep in deps {
            match self.resolve(from, dep) {
                DependencyStatus::Resolved(label) => {
                    self.record_edge(from, dep);
                    if !labels.contains(&label) {
                        labels.push(label);
                    }
                }
                DependencyStatus::SelfReferential => {
                    trace!("{}: ignoring self reference", from.name);
                }
                DependencyStatus::Missing => return Err(ModuleError::MissingDependency(dep.name.clone())),
                DependencyStatus::Unconverted => {
                    return Err(ModuleError::UnconvertedDependency(dep.name.clone()));
                }
            }
        }
        Ok(labels)
    }

    /// Modules `name` referenced through its properties so far
    pub fn property_references(&self, name: &str) -> BTreeSet<String> {
        self.property_edges
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    fn record_edge(&self, from: &Module, dep: &DepRef) {
        if dep.name == from.name {
            return;
        }
        self.property_edges
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(from.name.clone())
            .or_default()
            .insert(dep.name.clone());
    }

    /// Configurable variant of [`resolve_deps`](Self::resolve_deps)
    pub fn resolve_dep_lists(
        &self,
        from: &Module,
        deps: &Configurable<Vec<DepRef>>,
    ) -> Result<Configurable<Vec<Label>>, ModuleError> {
        deps.try_map(|refs| self.resolve_deps(from, refs))
    }

    /// Label of `target` as seen from `from_dir`
    pub fn module_label(&self, from_dir: &str, target: &Module, variant: Option<&str>) -> Label {
        if variant.is_none() {
            if let Some(ModuleState::Handwritten(label)) = self.states.get(&target.name) {
                return label.clone();
            }
        }
        let name = self.registry.target_name(target, variant);
        Label::for_target(from_dir, &target.dir, &name)
    }

    /// Absolute label of `module`, independent of the referring package
    pub fn absolute_label(&self, module: &Module, variant: Option<&str>) -> Label {
        let name = self.registry.target_name(module, variant);
        Label::verbatim(format!("//{}:{}", module.dir, name))
    }

    /// Label of the current-version stub library generated for `target`
    pub fn stub_label(&self, from_dir: &str, target: &Module) -> Label {
        let name = format!(
            "{}{}_current",
            self.registry.target_name(target, None),
            STUB_SUITE_SUFFIX
        );
        Label::for_target(from_dir, &target.dir, &name)
    }

    /// Label of a file of `module` that must exist in the workspace
    pub fn existing_file_label(&self, module: &Module, path: &str) -> Option<Label> {
        let path = path.trim_start_matches("./");
        self.boundaries
            .file_exists(&join_path(&module.dir, path))
            .then(|| self.label_for_file(&module.dir, path))
    }

    /// Label for a file given relative to `module_dir`.
    ///
    /// Files below a nested package belong to that package and become
    /// `//sub/pkg:rest` labels; other files stay package-relative.
    pub fn label_for_file(&self, module_dir: &str, path: &str) -> Label {
        let parts: Vec<&str> = path.split('/').collect();
        for split in (1..parts.len()).rev() {
            let package = join_path(module_dir, &parts[..split].join("/"));
            if self.is_package(&package) {
                return Label::verbatim(format!("//{}:{}", package, parts[split..].join("/")));
            }
        }
        Label::file(path)
    }

    fn is_package(&self, dir: &str) -> bool {
        self.boundaries.has_build_file(dir) || self.graph.has_package(dir)
    }

    /// Resolves a source list: files must exist, globs are expanded and
    /// `:module` references resolve like dependencies
    pub fn resolve_sources(&self, from: &Module, entries: &[String]) -> Result<Vec<Label>, ConvertError> {
        let mut labels = Vec::with_capacity(entries.len());
        let mut push = |label: Label| {
            if !labels.contains(&label) {
                labels.push(label);
            }
        };
        for entry in entries {
            match SourceRef::parse(entry) {
                SourceRef::Module(dep) => {
                    for label in self.resolve_deps(from, std::slice::from_ref(&dep))? {
                        push(label);
                    }
                }
                SourceRef::File(path) => {
                    if !self.boundaries.file_exists(&join_path(&from.dir, &path)) {
                        return Err(ModuleError::MissingPath(join_path(&from.dir, &path)).into());
                    }
                    push(self.label_for_file(&from.dir, &path));
                }
                SourceRef::Glob(pattern) => {
                    let matches = self
                        .boundaries
                        .glob(&from.dir, std::slice::from_ref(&pattern), &[])
                        .map_err(|e| ModuleError::invalid_property("srcs", e.to_string()))?;
                    for path in matches {
                        push(self.label_for_file(&from.dir, &path));
                    }
                }
            }
        }
        Ok(labels)
    }

    /// Resolves sources and exclusions per branch, then applies the exclusions
    pub fn resolve_source_lists(
        &self,
        from: &Module,
        srcs: &Configurable<Vec<String>>,
        excludes: &Configurable<Vec<String>>,
    ) -> Result<Configurable<Vec<Label>>, ConvertError> {
        let mut resolved = srcs.try_map(|entries| self.resolve_sources(from, entries))?;
        let excluded = excludes.try_map(|entries| self.resolve_exclusions(from, entries))?;
        resolved.resolve_excludes(&excluded);
        Ok(resolved)
    }

    /// Like [`resolve_sources`](Self::resolve_sources) but exclusions need
    /// not exist
    fn resolve_exclusions(&self, from: &Module, entries: &[String]) -> Result<Vec<Label>, ConvertError> {
        let mut labels = Vec::with_capacity(entries.len());
        for entry in entries {
            match SourceRef::parse(entry) {
                SourceRef::Module(dep) => match self.resolve(from, &dep) {
                    DependencyStatus::Resolved(label) => labels.push(label),
                    _ => continue,
                },
                SourceRef::File(path) => labels.push(self.label_for_file(&from.dir, &path)),
                SourceRef::Glob(pattern) => {
                    let matches = self
                        .boundaries
                        .glob(&from.dir, std::slice::from_ref(&pattern), &[])
                        .map_err(|e| ModuleError::invalid_property("exclude_srcs", e.to_string()))?;
                    labels.extend(matches.iter().map(|path| self.label_for_file(&from.dir, path)));
                }
            }
        }
        Ok(labels)
    }
}

fn initial_state(module: &Module, config: &Bp2BuildConfig, registry: &RuleRegistry) -> ModuleState {
    if let Some(label) = &module.bazel_module.label {
        return ModuleState::Handwritten(Label::verbatim(label.clone()));
    }
    if registry.handler_for(&module.module_type).is_none() {
        return ModuleState::Disabled(format!("no rule handler for {}", module.module_type));
    }
    if !config.is_enabled(module) {
        return ModuleState::Disabled("not allowlisted".to_string());
    }
    ModuleState::Convertible
}

/// Drops convertible modules depending on dropped ones until nothing changes.
///
/// Dependencies are the graph's declared ones plus `property_edges`.
fn propagate(
    graph: &ModuleGraph,
    config: &Bp2BuildConfig,
    property_edges: &BTreeMap<String, BTreeSet<String>>,
    states: &mut BTreeMap<String, ModuleState>,
) {
    loop {
        let mut dropped = Vec::new();
        for module in graph.primaries() {
            if !states.get(&module.name).is_some_and(ModuleState::is_convertible) {
                continue;
            }
            let declared = graph.dependencies(&module.name).into_iter().map(|dep| dep.name.as_str());
            let referenced = property_edges.get(&module.name).into_iter().flatten().map(String::as_str);
            let broken = declared.chain(referenced).find(|dep| {
                *dep != module.name
                    && !config.is_assumed_present(dep)
                    && matches!(states.get(*dep), Some(ModuleState::Dropped(_)))
            });
            if let Some(dep) = broken {
                dropped.push((
                    module.name.clone(),
                    ModuleError::UnconvertedDependency(dep.to_string()),
                ));
            }
        }
        if dropped.is_empty() {
            break;
        }
        for (name, error) in dropped {
            debug!("Dropping {}: {}", name, error);
            states.insert(name, ModuleState::Dropped(error));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DirectoryDefault;
    use crate::workspace::InMemoryWorkspace;

    fn resolver(modules: Vec<Module>, config: Bp2BuildConfig, ws: InMemoryWorkspace) -> LabelResolver {
        let config = Arc::new(config);
        LabelResolver::new(
            Arc::new(ModuleGraph::new(modules).unwrap()),
            config.clone(),
            Arc::new(RuleRegistry::with_builtin_rules(&config)),
            Arc::new(ws),
        )
    }

    fn enabled() -> Bp2BuildConfig {
        Bp2BuildConfig::new().with_directory(".", DirectoryDefault::EnabledRecursive)
    }

    fn filegroup(name: &str, dir: &str, deps: &[&str]) -> Module {
        Module::new(name, "filegroup", dir).with_deps(deps.iter().copied())
    }

    #[test]
    fn test_labels_for_same_and_other_package() {
        let r = resolver(
            vec![
                filegroup("a", "pkg", &["b", "c"]),
                filegroup("b", "pkg", &[]),
                filegroup("c", "other/dir", &[]),
            ],
            enabled(),
            InMemoryWorkspace::new(),
        );
        let a = r.graph.primary("a").unwrap().clone();

        assert_eq!(
            r.resolve(&a, &DepRef::new("b")),
            DependencyStatus::Resolved(Label::verbatim(":b"))
        );
        assert_eq!(
            r.resolve(&a, &DepRef::new("c")),
            DependencyStatus::Resolved(Label::verbatim("//other/dir:c"))
        );
        assert_eq!(r.resolve(&a, &DepRef::new("a")), DependencyStatus::SelfReferential);
    }

    #[test]
    fn test_missing_dependency_propagates_up_the_chain() {
        let r = resolver(
            vec![
                filegroup("m1", "x", &["m2"]),
                filegroup("m2", "x", &["m3"]),
                filegroup("m4", "x", &[]),
                filegroup("sibling", "x", &["m4"]),
            ],
            enabled(),
            InMemoryWorkspace::new(),
        );

        assert_eq!(
            r.state("m2"),
            Some(&ModuleState::Dropped(ModuleError::MissingDependency("m3".into())))
        );
        assert_eq!(
            r.state("m1"),
            Some(&ModuleState::Dropped(ModuleError::UnconvertedDependency("m2".into())))
        );
        assert!(r.should_convert("m4"));
        assert!(r.should_convert("sibling"));
    }

    #[test]
    fn test_assume_present_stops_propagation() {
        let r = resolver(
            vec![
                filegroup("app", "x", &["external"]),
                filegroup("external", "y", &["gone"]),
            ],
            enabled().with_assume_present("external"),
            InMemoryWorkspace::new(),
        );

        assert!(!r.should_convert("external"));
        assert!(r.should_convert("app"));
        let app = r.graph.primary("app").unwrap().clone();
        assert_eq!(
            r.resolve(&app, &DepRef::new("external")),
            DependencyStatus::Resolved(Label::verbatim("//y:external"))
        );
    }

    #[test]
    fn test_disabled_dependency_drops_dependent() {
        let config = Bp2BuildConfig::new().with_directory("on", DirectoryDefault::Enabled);
        let r = resolver(
            vec![filegroup("a", "on", &["b"]), filegroup("b", "off", &[])],
            config,
            InMemoryWorkspace::new(),
        );

        assert!(matches!(r.state("b"), Some(ModuleState::Disabled(_))));
        assert_eq!(
            r.state("a"),
            Some(&ModuleState::Dropped(ModuleError::UnconvertedDependency("b".into())))
        );
    }

    #[test]
    fn test_handwritten_redirect_is_used_verbatim() {
        let mut libc = Module::new("libc", "cc_library", "bionic");
        libc.bazel_module.label = Some("//bionic/libc:libc_handwritten".to_string());
        let r = resolver(
            vec![filegroup("user", "app", &["libc"]), libc],
            enabled(),
            InMemoryWorkspace::new(),
        );
        let user = r.graph.primary("user").unwrap().clone();

        assert!(r.should_convert("user"));
        assert_eq!(
            r.resolve(&user, &DepRef::new("libc")),
            DependencyStatus::Resolved(Label::verbatim("//bionic/libc:libc_handwritten"))
        );
    }

    #[test]
    fn test_bootstrap_module_references_its_variant() {
        let mut shared = Module::new("libdl", "cc_library", "bionic");
        shared.deps = vec![DepRef::with_variant("libdl", "static")];
        let mut static_variant = Module::new("libdl", "cc_library", "bionic");
        static_variant.variant = Some("static".to_string());
        let r = resolver(
            vec![shared, static_variant],
            enabled().with_bootstrap_module("libdl"),
            InMemoryWorkspace::new(),
        );
        let libdl = r.graph.primary("libdl").unwrap().clone();

        assert_eq!(
            r.resolve(&libdl, &DepRef::with_variant("libdl", "static")),
            DependencyStatus::Resolved(Label::verbatim(":libdl_bp2build_cc_library_static"))
        );
        assert!(r.should_convert("libdl"));
    }

    #[test]
    fn test_file_below_nested_package() {
        let r = resolver(
            vec![filegroup("a", "pkg", &[])],
            enabled(),
            InMemoryWorkspace::new()
                .with_build_file("pkg/sub", ["x"])
                .with_files(["pkg/sub/deep/f.c", "pkg/g.c"]),
        );

        assert_eq!(r.label_for_file("pkg", "sub/deep/f.c").as_str(), "//pkg/sub:deep/f.c");
        assert_eq!(r.label_for_file("pkg", "g.c").as_str(), "g.c");
    }

    #[test]
    fn test_source_resolution() {
        let r = resolver(
            vec![filegroup("a", "pkg", &["gen"]), filegroup("gen", "pkg", &[])],
            enabled(),
            InMemoryWorkspace::new().with_files(["pkg/a.c", "pkg/b.c", "pkg/b_test.c"]),
        );
        let a = r.graph.primary("a").unwrap().clone();

        let labels = r
            .resolve_sources(&a, &["*.c".to_string(), ":gen".to_string(), "a.c".to_string()])
            .unwrap();
        let labels: Vec<&str> = labels.iter().map(Label::as_str).collect();
        assert_eq!(labels, vec!["a.c", "b.c", "b_test.c", ":gen"]);

        let err = r.resolve_sources(&a, &["missing.c".to_string()]).unwrap_err();
        assert!(matches!(err, ConvertError::Module(ModuleError::MissingPath(_))));
    }

    #[test]
    fn test_record_failures_propagates() {
        let mut r = resolver(
            vec![filegroup("top", "x", &["mid"]), filegroup("mid", "x", &[])],
            enabled(),
            InMemoryWorkspace::new(),
        );

        let failures = BTreeMap::from([(
            "mid".to_string(),
            ModuleError::MissingPath("x/gone.c".to_string()),
        )]);
        let changed = r.record_failures(&failures);

        assert_eq!(changed, vec!["mid".to_string(), "top".to_string()]);
        assert!(!r.should_convert("top"));
    }

    #[test]
    fn test_record_failures_follows_property_references() {
        let mut r = resolver(
            vec![filegroup("user", "b", &[]), filegroup("gen", "a", &[])],
            enabled(),
            InMemoryWorkspace::new(),
        );
        let user = r.graph.primary("user").unwrap().clone();

        let labels = r.resolve_deps(&user, &[DepRef::new("gen"), DepRef::new("user")]).unwrap();
        let labels: Vec<&str> = labels.iter().map(Label::as_str).collect();
        assert_eq!(labels, vec!["//a:gen"]);
        assert_eq!(r.property_references("user"), BTreeSet::from(["gen".to_string()]));

        let failures = BTreeMap::from([(
            "gen".to_string(),
            ModuleError::MissingPath("a/gone.txt".to_string()),
        )]);
        let changed = r.record_failures(&failures);

        assert_eq!(changed, vec!["gen".to_string(), "user".to_string()]);
        assert!(!r.should_convert("user"));
    }
}
