//! Schema-driven handler for module types described in the config

use super::{RuleHandler, TargetSpec};
use crate::config::{AttributeKind, RuleSchema};
use crate::convert::ConversionContext;
use crate::error::ConvertError;
use crate::graph::Module;
use crate::render::Attribute;

/// Converts one module type by copying the properties its schema lists
pub struct GenericRuleHandler {
    module_type: String,
    schema: RuleSchema,
}

impl GenericRuleHandler {
    pub fn new(module_type: impl Into<String>, schema: RuleSchema) -> Self {
        Self {
            module_type: module_type.into(),
            schema,
        }
    }
}

impl RuleHandler for GenericRuleHandler {
    fn can_handle(&self, module_type: &str) -> bool {
        self.module_type == module_type
    }

    fn convert(&self, ctx: &ConversionContext, module: &Module) -> Result<Vec<TargetSpec>, ConvertError> {
        let props = ctx.reader(module)?;
        let resolver = ctx.resolver();

        let mut target = TargetSpec::new(&module.name, &self.schema.rule_class);
        if let Some(load) = &self.schema.load {
            target = target.loaded_from(load);
        }

        for (property, schema) in &self.schema.attributes {
            let value = match schema.kind {
                AttributeKind::Bool => Attribute::Bool(props.bool(property)?),
                AttributeKind::Int => Attribute::Int(props.int(property)?),
                AttributeKind::String => Attribute::String(props.string(property)?),
                AttributeKind::StringList => Attribute::StringList(props.string_list(property)?),
                AttributeKind::LabelList => {
                    Attribute::LabelList(resolver.resolve_dep_lists(module, &props.dep_list(property)?)?)
                }
                AttributeKind::SourceList => Attribute::LabelList(resolver.resolve_source_lists(
                    module,
                    &props.string_list(property)?,
                    &props.string_list(&format!("exclude_{property}"))?,
                )?),
            };
            target.add_attribute(self.schema.attribute_name(property), value);
        }
        Ok(vec![target])
    }
}
