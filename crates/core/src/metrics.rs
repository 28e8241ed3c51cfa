//! Counters describing one conversion run

use crate::aggregate::{SkippedTarget, TargetAggregator};
use crate::label::ModuleState;
use serde::Serialize;
use std::collections::BTreeMap;

/// Why a selected module produced no targets
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedModule {
    pub kind: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CodegenMetrics {
    pub generated_targets: usize,
    pub rule_class_counts: BTreeMap<String, usize>,
    pub converted_modules: Vec<String>,
    pub handwritten_collisions: Vec<SkippedTarget>,
    pub dropped_modules: BTreeMap<String, DroppedModule>,
    pub disabled_modules: usize,
}

impl CodegenMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tallies what ended up in the aggregator and the final module states
    pub fn collect<'a>(
        aggregator: &TargetAggregator,
        states: impl IntoIterator<Item = (&'a String, &'a ModuleState)>,
    ) -> Self {
        let mut metrics = Self::new();
        for bundle in aggregator.bundles().values() {
            for target in bundle.targets() {
                metrics.generated_targets += 1;
                *metrics
                    .rule_class_counts
                    .entry(target.rule_class.clone())
                    .or_default() += 1;
            }
        }
        metrics.handwritten_collisions = aggregator.skipped().to_vec();

        for (name, state) in states {
            match state {
                ModuleState::Convertible => metrics.converted_modules.push(name.clone()),
                ModuleState::Dropped(error) => {
                    metrics.dropped_modules.insert(
                        name.clone(),
                        DroppedModule {
                            kind: error.kind().to_string(),
                            reason: error.to_string(),
                        },
                    );
                }
                ModuleState::Disabled(_) => metrics.disabled_modules += 1,
                ModuleState::Handwritten(_) => {}
            }
        }
        metrics
    }

    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
