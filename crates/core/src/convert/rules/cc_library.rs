//! Handlers for cc_library_static, cc_library_shared and cc_library

use super::cc::{add_common_attributes, load_location, stub_versions};
use super::{RuleHandler, TargetSpec};
use crate::convert::ConversionContext;
use crate::error::{ConvertError, ModuleError};
use crate::graph::Module;
use crate::render::Attribute;

const STATIC_RULE: &str = "cc_library_static";
const SHARED_RULE: &str = "cc_library_shared";
const STUB_SUITE_RULE: &str = "cc_stub_suite";
const STUB_SUITE_LOAD: &str = "//build/bazel/rules/cc:cc_stub_library.bzl";

/// Suffix of the static half of a `cc_library`
pub(crate) const STATIC_SUFFIX: &str = "_bp2build_cc_library_static";
/// Suffix of the stub suite generated next to a shared library
pub(crate) const STUB_SUITE_SUFFIX: &str = "_stub_libs";

pub struct CcLibraryStaticHandler;

impl RuleHandler for CcLibraryStaticHandler {
    fn can_handle(&self, module_type: &str) -> bool {
        module_type == STATIC_RULE
    }

    fn convert(&self, ctx: &ConversionContext, module: &Module) -> Result<Vec<TargetSpec>, ConvertError> {
        Ok(vec![static_target(ctx, module, &module.name, None)?])
    }
}

pub struct CcLibrarySharedHandler;

impl RuleHandler for CcLibrarySharedHandler {
    fn can_handle(&self, module_type: &str) -> bool {
        module_type == SHARED_RULE
    }

    fn convert(&self, ctx: &ConversionContext, module: &Module) -> Result<Vec<TargetSpec>, ConvertError> {
        shared_targets(ctx, module, None)
    }
}

/// A `cc_library` builds both flavours: a static target under a derived
/// name and the shared target under the module name
pub struct CcLibraryHandler;

impl RuleHandler for CcLibraryHandler {
    fn can_handle(&self, module_type: &str) -> bool {
        module_type == "cc_library"
    }

    fn target_name(&self, module: &Module, variant: Option<&str>) -> String {
        match variant {
            Some("static") => format!("{}{STATIC_SUFFIX}", module.name),
            _ => module.name.clone(),
        }
    }

    fn convert(&self, ctx: &ConversionContext, module: &Module) -> Result<Vec<TargetSpec>, ConvertError> {
        let static_name = self.target_name(module, Some("static"));
        let mut targets = vec![static_target(ctx, module, &static_name, Some("static"))?];
        targets.extend(shared_targets(ctx, module, Some("shared"))?);
        Ok(targets)
    }
}

fn static_target(
    ctx: &ConversionContext,
    module: &Module,
    name: &str,
    section: Option<&str>,
) -> Result<TargetSpec, ConvertError> {
    let props = ctx.reader(module)?;
    let mut target = TargetSpec::new(name, STATIC_RULE).loaded_from(load_location(STATIC_RULE));
    add_common_attributes(ctx, module, &props, section, &mut target)?;
    Ok(target)
}

fn shared_targets(
    ctx: &ConversionContext,
    module: &Module,
    section: Option<&str>,
) -> Result<Vec<TargetSpec>, ConvertError> {
    let props = ctx.reader(module)?;
    let resolver = ctx.resolver();

    let mut shared = TargetSpec::new(&module.name, SHARED_RULE).loaded_from(load_location(SHARED_RULE));
    add_common_attributes(ctx, module, &props, section, &mut shared)?;

    let version_script = props.string("version_script")?.try_map(|path| {
        resolver
            .existing_file_label(module, path)
            .ok_or_else(|| ModuleError::MissingPath(path.clone()))
    })?;
    shared.add_attribute("version_script", Attribute::Label(version_script));
    shared.add_attribute("stem", Attribute::String(props.string("stem")?));
    shared.add_attribute("suffix", Attribute::String(props.string("suffix")?));

    let versions = stub_versions(module);
    if versions.is_empty() {
        return Ok(vec![shared]);
    }

    let mut versions = versions;
    if !versions.iter().any(|v| v == "current") {
        versions.push("current".to_string());
    }
    let mut stubs = TargetSpec::new(format!("{}{STUB_SUITE_SUFFIX}", module.name), STUB_SUITE_RULE)
        .loaded_from(STUB_SUITE_LOAD)
        .with_attribute("soname", Attribute::string(format!("{}.so", module.name)))
        .with_attribute(
            "source_library_label",
            Attribute::label(resolver.absolute_label(module, None)),
        )
        .with_attribute("versions", Attribute::string_list(versions));
    if let Some(symbol_file) = props.base_string("stubs.symbol_file")? {
        let label = resolver
            .existing_file_label(module, &symbol_file)
            .ok_or(ModuleError::MissingPath(symbol_file))?;
        stubs.add_attribute("symbol_file", Attribute::label(label));
    }
    Ok(vec![shared, stubs])
}
