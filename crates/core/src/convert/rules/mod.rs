//! Rule handlers for the supported module types

mod cc;
mod cc_binary;
mod cc_library;
mod filegroup;
mod generic;
mod genrule;

pub use cc_binary::CcBinaryHandler;
pub use cc_library::{CcLibraryHandler, CcLibrarySharedHandler, CcLibraryStaticHandler};
pub(crate) use cc_library::STUB_SUITE_SUFFIX;
pub use filegroup::FilegroupHandler;
pub use generic::GenericRuleHandler;
pub use genrule::GenruleHandler;

use super::ConversionContext;
use crate::error::ConvertError;
use crate::graph::Module;
use crate::render::Attribute;

/// Converts modules of some type into Bazel targets
pub trait RuleHandler: Send + Sync {
    /// Check if this handler can process the given module type
    fn can_handle(&self, module_type: &str) -> bool;

    /// Name of the target generated for `module`, or for one of its variants
    fn target_name(&self, module: &Module, variant: Option<&str>) -> String {
        match variant {
            Some(variant) => format!("{}_{}", module.name, variant),
            None => module.name.clone(),
        }
    }

    /// Produce the targets for one module
    fn convert(&self, ctx: &ConversionContext, module: &Module) -> Result<Vec<TargetSpec>, ConvertError>;
}

/// A target as produced by a rule handler, before rendering
#[derive(Debug, Clone, PartialEq)]
pub struct TargetSpec {
    pub name: String,
    pub rule_class: String,
    /// `.bzl` file the rule class is loaded from; `None` for native rules
    pub load_location: Option<String>,
    pub attributes: Vec<(String, Attribute)>,
}

impl TargetSpec {
    pub fn new(name: impl Into<String>, rule_class: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rule_class: rule_class.into(),
            load_location: None,
            attributes: Vec::new(),
        }
    }

    pub fn loaded_from(mut self, location: impl Into<String>) -> Self {
        self.load_location = Some(location.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: Attribute) -> Self {
        self.attributes.push((name.into(), value));
        self
    }

    pub fn add_attribute(&mut self, name: impl Into<String>, value: Attribute) {
        self.attributes.push((name.into(), value));
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|(attr, _)| attr == name)
            .map(|(_, value)| value)
    }
}
