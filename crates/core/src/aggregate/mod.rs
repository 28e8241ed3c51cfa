//! Collecting generated targets into per-directory BUILD files
//!
//! Targets are inserted on one thread in dependency order. Everything is
//! kept in sorted maps so rendering does not depend on insertion order.

mod bundle;
mod target;

pub use bundle::{LoadStatement, OutputBundle};
pub use target::BazelTarget;

use crate::error::ModuleError;
use crate::workspace::PackageBoundaries;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// A generated target dropped because a hand-written one has its name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedTarget {
    pub package: String,
    pub name: String,
    pub module_name: String,
}

/// What happened to a target handed to [`TargetAggregator::add_target`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    HandwrittenCollision,
}

pub struct TargetAggregator {
    boundaries: Arc<dyn PackageBoundaries>,
    bundles: BTreeMap<String, OutputBundle>,
    skipped: Vec<SkippedTarget>,
}

impl TargetAggregator {
    pub fn new(boundaries: Arc<dyn PackageBoundaries>) -> Self {
        Self {
            boundaries,
            bundles: BTreeMap::new(),
            skipped: Vec::new(),
        }
    }

    /// Adds `target` to its package.
    ///
    /// A name declared by the hand-written BUILD file wins and the target is
    /// skipped. A name already generated in the package is an error of the
    /// module producing the second target.
    pub fn add_target(&mut self, target: BazelTarget) -> Result<AddOutcome, ModuleError> {
        if self.boundaries.existing_targets(&target.package).contains(&target.name) {
            debug!(
                "Skipping {}:{} from {}, declared in hand-written BUILD file",
                target.package, target.name, target.module_name
            );
            self.skipped.push(SkippedTarget {
                package: target.package,
                name: target.name,
                module_name: target.module_name,
            });
            return Ok(AddOutcome::HandwrittenCollision);
        }

        let bundle = self.bundles.entry(target.package.clone()).or_default();
        if bundle.contains(&target.name) {
            return Err(ModuleError::DuplicateTarget(target.name));
        }
        bundle.insert(target);
        Ok(AddOutcome::Added)
    }

    pub fn bundle(&self, dir: &str) -> Option<&OutputBundle> {
        self.bundles.get(dir)
    }

    pub fn bundles(&self) -> &BTreeMap<String, OutputBundle> {
        &self.bundles
    }

    pub fn skipped(&self) -> &[SkippedTarget] {
        &self.skipped
    }

    pub fn load_statements(&self, dir: &str) -> Vec<LoadStatement> {
        self.bundles
            .get(dir)
            .map(OutputBundle::load_statements)
            .unwrap_or_default()
    }

    /// Rendered BUILD file for `dir`, `None` when nothing was generated there
    pub fn render(&self, dir: &str) -> Option<String> {
        self.bundles.get(dir).map(OutputBundle::render)
    }

    /// Every rendered BUILD file keyed by directory
    pub fn render_all(&self) -> BTreeMap<String, String> {
        self.bundles
            .iter()
            .map(|(dir, bundle)| (dir.clone(), bundle.render()))
            .collect()
    }
}
