//! Shared, read-only state handed to every rule handler

use super::{PropertyReader, RuleRegistry};
use crate::axis::BuildConfig;
use crate::config::Bp2BuildConfig;
use crate::error::ConvertError;
use crate::graph::{Module, ModuleGraph};
use crate::label::LabelResolver;
use crate::workspace::PackageBoundaries;
use std::sync::Arc;

/// Everything a conversion needs: the frozen graph, the config, the rule
/// registry, the source tree and the dependency statuses
pub struct ConversionContext {
    graph: Arc<ModuleGraph>,
    config: Arc<Bp2BuildConfig>,
    registry: Arc<RuleRegistry>,
    boundaries: Arc<dyn PackageBoundaries>,
    resolver: LabelResolver,
}

impl ConversionContext {
    /// Builds the registry from the config and computes every module's status
    pub fn new(graph: ModuleGraph, config: Bp2BuildConfig, boundaries: Arc<dyn PackageBoundaries>) -> Self {
        let registry = Arc::new(RuleRegistry::with_builtin_rules(&config));
        Self::with_registry(graph, config, registry, boundaries)
    }

    pub fn with_registry(
        graph: ModuleGraph,
        config: Bp2BuildConfig,
        registry: Arc<RuleRegistry>,
        boundaries: Arc<dyn PackageBoundaries>,
    ) -> Self {
        let graph = Arc::new(graph);
        let config = Arc::new(config);
        let resolver = LabelResolver::new(graph.clone(), config.clone(), registry.clone(), boundaries.clone());
        Self {
            graph,
            config,
            registry,
            boundaries,
            resolver,
        }
    }

    pub fn graph(&self) -> &ModuleGraph {
        &self.graph
    }

    pub fn config(&self) -> &Bp2BuildConfig {
        &self.config
    }

    pub fn build_config(&self) -> &BuildConfig {
        &self.config.build
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub fn boundaries(&self) -> Arc<dyn PackageBoundaries> {
        self.boundaries.clone()
    }

    pub fn resolver(&self) -> &LabelResolver {
        &self.resolver
    }

    pub(crate) fn resolver_mut(&mut self) -> &mut LabelResolver {
        &mut self.resolver
    }

    pub(crate) fn shared_graph(&self) -> Arc<ModuleGraph> {
        self.graph.clone()
    }

    /// Property access for `module` under this run's build configuration
    pub fn reader<'a>(&self, module: &'a Module) -> Result<PropertyReader<'a>, ConvertError> {
        PropertyReader::new(module, &self.config.build)
    }
}
