//! Handler for genrule modules

use super::{RuleHandler, TargetSpec};
use crate::convert::ConversionContext;
use crate::error::ConvertError;
use crate::graph::Module;
use crate::render::Attribute;

/// Command variables and their Bazel make-variable equivalents
const CMD_VARIABLES: [(&str, &str); 4] = [
    ("$(in)", "$(SRCS)"),
    ("$(out)", "$(OUTS)"),
    ("$(genDir)", "$(RULEDIR)"),
    ("$(outs)", "$(OUTS)"),
];

pub struct GenruleHandler;

impl RuleHandler for GenruleHandler {
    fn can_handle(&self, module_type: &str) -> bool {
        module_type == "genrule"
    }

    fn convert(&self, ctx: &ConversionContext, module: &Module) -> Result<Vec<TargetSpec>, ConvertError> {
        let props = ctx.reader(module)?;
        let resolver = ctx.resolver();

        let srcs = resolver.resolve_source_lists(
            module,
            &props.string_list("srcs")?,
            &props.string_list("exclude_srcs")?,
        )?;
        let mut tools = resolver.resolve_dep_lists(module, &props.dep_list("tools")?)?;
        let tool_files = resolver.resolve_source_lists(
            module,
            &props.string_list("tool_files")?,
            &Default::default(),
        )?;
        tools.append(&tool_files);

        let cmd = props.string("cmd")?.map(|cmd| translate_cmd(cmd));

        Ok(vec![
            TargetSpec::new(&module.name, "genrule")
                .with_attribute("srcs", Attribute::LabelList(srcs))
                .with_attribute("tools", Attribute::LabelList(tools))
                .with_attribute("outs", Attribute::StringList(props.string_list("out")?))
                .with_attribute("cmd", Attribute::String(cmd)),
        ])
    }
}

fn translate_cmd(cmd: &str) -> String {
    CMD_VARIABLES
        .iter()
        .fold(cmd.to_string(), |cmd, (from, to)| cmd.replace(from, to))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::test_support::context;
    use crate::workspace::InMemoryWorkspace;
    use serde_json::json;

    #[test]
    fn test_cmd_variables_are_translated() {
        assert_eq!(
            translate_cmd("$(location tool) $(in) > $(out) && cp $(genDir)/x ."),
            "$(location tool) $(SRCS) > $(OUTS) && cp $(RULEDIR)/x ."
        );
    }

    #[test]
    fn test_genrule_attributes() {
        let module = Module::new("gen_version", "genrule", "tools")
            .with_properties(json!({
                "srcs": ["version.in"],
                "out": ["version.h"],
                "tools": ["stamper"],
                "cmd": "$(location stamper) $(in) $(out)"
            }))
            .with_deps(["stamper"]);
        let stamper = Module::new("stamper", "cc_binary", "tools/stamper");
        let ctx = context(
            vec![module.clone(), stamper],
            InMemoryWorkspace::new().with_file("tools/version.in"),
        );

        let target = GenruleHandler.convert(&ctx, &module).unwrap().remove(0);

        assert_eq!(target.rule_class, "genrule");
        let Some(Attribute::LabelList(tools)) = target.attribute("tools") else {
            panic!("tools should be a label list");
        };
        assert_eq!(tools.base_list()[0].as_str(), "//tools/stamper:stamper");
        assert_eq!(
            target.attribute("cmd"),
            Some(&Attribute::string("$(location stamper) $(SRCS) $(OUTS)"))
        );
    }
}
