//! Handler for filegroup modules

use super::{RuleHandler, TargetSpec};
use crate::convert::ConversionContext;
use crate::error::ConvertError;
use crate::graph::Module;
use crate::render::Attribute;

pub struct FilegroupHandler;

impl RuleHandler for FilegroupHandler {
    fn can_handle(&self, module_type: &str) -> bool {
        module_type == "filegroup"
    }

    fn convert(&self, ctx: &ConversionContext, module: &Module) -> Result<Vec<TargetSpec>, ConvertError> {
        let props = ctx.reader(module)?;
        let srcs = ctx.resolver().resolve_source_lists(
            module,
            &props.string_list("srcs")?,
            &props.string_list("exclude_srcs")?,
        )?;

        let mut target = TargetSpec::new(&module.name, "filegroup").with_attribute("srcs", Attribute::LabelList(srcs));
        if let Some(path) = props.base_string("path")? {
            target.add_attribute("path", Attribute::string(path));
        }
        Ok(vec![target])
    }
}
