//! Converting a whole graph into BUILD files

use super::ConversionContext;
use crate::aggregate::{BazelTarget, TargetAggregator};
use crate::error::{ConvertError, Error, ModuleError, Result};
use crate::graph::Module;
use crate::label::is_valid_target_name;
use crate::metrics::CodegenMetrics;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

/// Rendered BUILD files keyed by directory, plus run metrics
#[derive(Debug, Clone)]
pub struct ConversionResult {
    pub files: BTreeMap<String, String>,
    pub metrics: CodegenMetrics,
}

pub struct Converter {
    ctx: ConversionContext,
}

impl Converter {
    pub fn new(ctx: ConversionContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &ConversionContext {
        &self.ctx
    }

    /// Converts every selected module.
    ///
    /// Modules convert in parallel; their targets are inserted into the
    /// aggregator afterwards in dependency order. A module failure drops the
    /// module and everything depending on it, a fatal error ends the run.
    pub fn run(mut self) -> Result<ConversionResult> {
        let graph = self.ctx.shared_graph();
        let candidates: Vec<&Module> = graph
            .dependency_order()
            .into_iter()
            .filter(|module| self.ctx.resolver().should_convert(&module.name))
            .collect();
        info!("Converting {} of {} modules", candidates.len(), graph.len());

        let ctx = &self.ctx;
        let outcomes: Vec<(&Module, std::result::Result<Vec<BazelTarget>, ConvertError>)> = candidates
            .par_iter()
            .map(|module| (*module, convert_module(ctx, module)))
            .collect();

        let mut converted: Vec<(String, Vec<BazelTarget>)> = Vec::with_capacity(outcomes.len());
        let mut failures = BTreeMap::new();
        for (module, outcome) in outcomes {
            match outcome {
                Ok(targets) => converted.push((module.name.clone(), targets)),
                Err(ConvertError::Fatal(error)) => return Err(error),
                Err(ConvertError::Module(error)) => {
                    warn!("Dropping {}: {}", module.name, error);
                    failures.insert(module.name.clone(), error);
                }
            }
        }

        let aggregator = loop {
            if !failures.is_empty() {
                let changed: BTreeSet<String> = self.ctx.resolver_mut().record_failures(&failures).into_iter().collect();
                converted.retain(|(name, _)| !changed.contains(name));
                failures.clear();
            }

            let mut aggregator = TargetAggregator::new(self.ctx.boundaries());
            for (name, targets) in &converted {
                for target in targets {
                    if let Err(error) = aggregator.add_target(target.clone()) {
                        warn!("Dropping {}: {}", name, error);
                        failures.entry(name.clone()).or_insert(error);
                        break;
                    }
                }
            }
            if failures.is_empty() {
                break aggregator;
            }
        };

        let missing: Vec<String> = self
            .ctx
            .config()
            .force_enabled
            .iter()
            .filter(|name| !self.ctx.resolver().should_convert(name))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(Error::ForceEnabledNotConverted(missing));
        }

        let metrics = CodegenMetrics::collect(&aggregator, self.ctx.resolver().states());
        info!(
            "Generated {} targets in {} BUILD files",
            metrics.generated_targets,
            aggregator.bundles().len()
        );
        Ok(ConversionResult {
            files: aggregator.render_all(),
            metrics,
        })
    }
}

/// Runs the module's handler and renders every attribute of its targets
pub fn convert_module(ctx: &ConversionContext, module: &Module) -> std::result::Result<Vec<BazelTarget>, ConvertError> {
    let handler = ctx
        .registry()
        .handler_for(&module.module_type)
        .ok_or_else(|| Error::Other(format!("no rule handler for {}", module.module_type)))?;
    debug!("Converting {} ({})", module.name, module.module_type);

    let specs = handler.convert(ctx, module)?;
    let mut targets = Vec::with_capacity(specs.len());
    for spec in specs {
        if !is_valid_target_name(&spec.name) {
            return Err(ModuleError::invalid_property("name", format!("{:?} is not a valid target name", spec.name)).into());
        }
        let mut attributes = BTreeMap::new();
        for (name, value) in &spec.attributes {
            if let Some(rendered) = value.render(name, ctx.build_config())? {
                attributes.insert(name.clone(), rendered);
            }
        }
        targets.push(BazelTarget {
            name: spec.name,
            rule_class: spec.rule_class,
            load_location: spec.load_location,
            attributes,
            package: module.dir.clone(),
            module_name: module.name.clone(),
            module_type: module.module_type.clone(),
        });
    }
    Ok(targets)
}
