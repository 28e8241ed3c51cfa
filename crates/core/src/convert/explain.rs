//! Why a module converts the way it does

use super::{ConversionContext, convert_module};
use crate::aggregate::BazelTarget;
use crate::error::{ConvertError, Error, Result};
use crate::label::{DependencyStatus, ModuleState};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyReport {
    pub reference: String,
    pub status: String,
}

/// Status, dependencies and generated targets of one module
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Explanation {
    pub name: String,
    pub module_type: String,
    pub dir: String,
    pub status: String,
    pub dependencies: Vec<DependencyReport>,
    pub targets: Vec<BazelTarget>,
    /// Set when the module is selected but its conversion fails
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversion_error: Option<String>,
}

/// Explains `name` against the statuses computed for the whole graph
pub fn explain(ctx: &ConversionContext, name: &str) -> Result<Explanation> {
    let module = ctx
        .graph()
        .primary(name)
        .ok_or_else(|| Error::GraphError(format!("no module named {name}")))?;
    let resolver = ctx.resolver();

    let status = match resolver.state(name) {
        Some(ModuleState::Convertible) => "converted".to_string(),
        Some(ModuleState::Handwritten(label)) => format!("hand-written at {label}"),
        Some(ModuleState::Disabled(reason)) => format!("disabled: {reason}"),
        Some(ModuleState::Dropped(error)) => format!("dropped: {error}"),
        None => "unknown".to_string(),
    };

    let dependencies = ctx
        .graph()
        .dependencies(name)
        .into_iter()
        .map(|dep| DependencyReport {
            reference: dep.to_string(),
            status: match resolver.resolve(module, dep) {
                DependencyStatus::Resolved(label) => label.to_string(),
                DependencyStatus::Missing => "missing".to_string(),
                DependencyStatus::Unconverted => "unconverted".to_string(),
                DependencyStatus::SelfReferential => "self reference".to_string(),
            },
        })
        .collect();

    let mut targets = Vec::new();
    let mut conversion_error = None;
    if resolver.should_convert(name) {
        match convert_module(ctx, module) {
            Ok(converted) => targets = converted,
            Err(ConvertError::Module(error)) => conversion_error = Some(error.to_string()),
            Err(ConvertError::Fatal(error)) => return Err(error),
        }
    }

    Ok(Explanation {
        name: module.name.clone(),
        module_type: module.module_type.clone(),
        dir: module.dir.clone(),
        status,
        dependencies,
        targets,
        conversion_error,
    })
}
