//! Handler for cc_binary modules

use super::cc::{add_common_attributes, load_location};
use super::{RuleHandler, TargetSpec};
use crate::convert::ConversionContext;
use crate::error::ConvertError;
use crate::graph::Module;
use crate::render::Attribute;

const BINARY_RULE: &str = "cc_binary";

pub struct CcBinaryHandler;

impl RuleHandler for CcBinaryHandler {
    fn can_handle(&self, module_type: &str) -> bool {
        module_type == BINARY_RULE
    }

    fn convert(&self, ctx: &ConversionContext, module: &Module) -> Result<Vec<TargetSpec>, ConvertError> {
        let props = ctx.reader(module)?;
        let mut target = TargetSpec::new(&module.name, BINARY_RULE).loaded_from(load_location(BINARY_RULE));
        add_common_attributes(ctx, module, &props, None, &mut target)?;
        target.add_attribute("stem", Attribute::String(props.string("stem")?));
        target.add_attribute("suffix", Attribute::String(props.string("suffix")?));
        target.add_attribute("static_executable", Attribute::Bool(props.bool("static_executable")?));
        Ok(vec![target])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::ConfigurationAxis;
    use crate::convert::test_support::context;
    use crate::workspace::InMemoryWorkspace;
    use serde_json::json;

    #[test]
    fn test_binary_with_arch_specific_stem() {
        let module = Module::new("toybox", "cc_binary", "toybox").with_properties(json!({
            "srcs": ["main.c"],
            "stem": "toybox",
            "arch": {"arm64": {"stem": "toybox64"}}
        }));
        let ctx = context(vec![module.clone()], InMemoryWorkspace::new().with_file("toybox/main.c"));

        let target = CcBinaryHandler.convert(&ctx, &module).unwrap().remove(0);

        assert_eq!(
            target.load_location.as_deref(),
            Some("//build/bazel/rules/cc:cc_binary.bzl")
        );
        let Some(Attribute::String(stem)) = target.attribute("stem") else {
            panic!("stem should be a string");
        };
        assert_eq!(stem.base().map(String::as_str), Some("toybox"));
        assert_eq!(
            stem.select_value(&ConfigurationAxis::ARCH, "arm64").map(String::as_str),
            Some("toybox64")
        );
    }
}
