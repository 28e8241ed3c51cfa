//! Attributes shared by the cc rule handlers

use super::TargetSpec;
use crate::axis::{ANDROID_AND_IN_APEX, CONDITIONS_DEFAULT, ConfigurationAxis};
use crate::configurable::Configurable;
use crate::convert::{ConversionContext, PropertyReader};
use crate::error::{ConvertError, ModuleError};
use crate::graph::Module;
use crate::label::{DepRef, Label};
use crate::render::Attribute;
use serde_json::Value;

pub(super) const CC_RULES_PACKAGE: &str = "//build/bazel/rules/cc";

const INCOMPATIBLE: &str = "@platforms//:incompatible";
const PLATFORM_APEX: &str = "//apex_available:platform";

/// String list properties copied under a new attribute name
const STRING_LISTS: [(&str, &str); 7] = [
    ("cflags", "copts"),
    ("conlyflags", "conlyflags"),
    ("cppflags", "cppflags"),
    ("asflags", "asflags"),
    ("local_include_dirs", "local_includes"),
    ("export_include_dirs", "export_includes"),
    ("export_system_include_dirs", "export_system_includes"),
];

const STRINGS: [(&str, &str); 4] = [
    ("stl", "stl"),
    ("cpp_std", "cpp_std"),
    ("c_std", "c_std"),
    ("min_sdk_version", "min_sdk_version"),
];

pub(super) fn load_location(rule_class: &str) -> String {
    format!("{CC_RULES_PACKAGE}:{rule_class}.bzl")
}

/// Reads a list property, appending the `<section>.<name>` variant when a
/// section is given
fn section_list(
    props: &PropertyReader<'_>,
    name: &str,
    section: Option<&str>,
) -> Result<Configurable<Vec<String>>, ModuleError> {
    let mut list = props.string_list(name)?;
    if let Some(section) = section {
        list.append(&props.string_list(&format!("{section}.{name}"))?);
    }
    Ok(list)
}

fn section_deps(
    props: &PropertyReader<'_>,
    name: &str,
    section: Option<&str>,
) -> Result<Configurable<Vec<DepRef>>, ModuleError> {
    Ok(section_list(props, name, section)?.map(|names| names.iter().map(DepRef::new).collect()))
}

/// Adds the attributes every cc target carries
pub(super) fn add_common_attributes(
    ctx: &ConversionContext,
    module: &Module,
    props: &PropertyReader<'_>,
    section: Option<&str>,
    target: &mut TargetSpec,
) -> Result<(), ConvertError> {
    let resolver = ctx.resolver();

    let srcs = resolver.resolve_source_lists(
        module,
        &section_list(props, "srcs", section)?,
        &section_list(props, "exclude_srcs", section)?,
    )?;
    let (srcs, srcs_c, srcs_as) = split_sources(&srcs);
    target.add_attribute("srcs", Attribute::LabelList(srcs));
    target.add_attribute("srcs_c", Attribute::LabelList(srcs_c));
    target.add_attribute("srcs_as", Attribute::LabelList(srcs_as));

    for (property, attribute) in STRING_LISTS {
        target.add_attribute(attribute, Attribute::StringList(section_list(props, property, section)?));
    }
    for (property, attribute) in STRINGS {
        target.add_attribute(attribute, Attribute::String(props.string(property)?));
    }
    target.add_attribute("rtti", Attribute::Bool(props.bool("rtti")?));

    let mut implementation_deps = resolver.resolve_dep_lists(module, &section_deps(props, "static_libs", section)?)?;
    implementation_deps.append(&resolver.resolve_dep_lists(module, &section_deps(props, "header_libs", section)?)?);
    target.add_attribute("implementation_deps", Attribute::LabelList(implementation_deps));

    let whole_archive = resolver.resolve_dep_lists(module, &section_deps(props, "whole_static_libs", section)?)?;
    target.add_attribute("whole_archive_deps", Attribute::LabelList(whole_archive));

    let apex_available = props.string_list("apex_available")?;
    let dynamic = dynamic_deps(ctx, module, &section_deps(props, "shared_libs", section)?, apex_available.base_list())?;
    target.add_attribute("implementation_dynamic_deps", Attribute::LabelList(dynamic));

    let system = resolver.resolve_dep_lists(module, &section_deps(props, "system_shared_libs", section)?)?;
    target.add_attribute("system_dynamic_deps", Attribute::LabelList(system));

    target.add_attribute("apex_available", Attribute::StringList(apex_available));
    target.add_attribute(
        "target_compatible_with",
        Attribute::StringList(target_compatible_with(ctx, props)?),
    );
    Ok(())
}

/// Splits resolved sources into C++, C and assembly lists
fn split_sources(
    srcs: &Configurable<Vec<Label>>,
) -> (Configurable<Vec<Label>>, Configurable<Vec<Label>>, Configurable<Vec<Label>>) {
    let is_c = |label: &Label| label.as_str().ends_with(".c");
    let is_as = |label: &Label| label.as_str().ends_with(".s") || label.as_str().ends_with(".S");

    let mut cpp = srcs.clone();
    cpp.retain(|label| !is_c(label) && !is_as(label));
    let mut c = srcs.clone();
    c.retain(is_c);
    let mut asm = srcs.clone();
    asm.retain(is_as);
    (cpp, c, asm)
}

/// Shared library dependencies. When the module can be installed in an
/// apex, dependencies that provide stubs link against the stubs inside the
/// apex and against the implementation elsewhere. Such dependencies must be
/// listed unconditionally.
fn dynamic_deps(
    ctx: &ConversionContext,
    module: &Module,
    deps: &Configurable<Vec<DepRef>>,
    apex_available: &[String],
) -> Result<Configurable<Vec<Label>>, ModuleError> {
    let resolver = ctx.resolver();
    let in_apex = apex_available.iter().any(|apex| apex != PLATFORM_APEX);
    if !in_apex {
        return resolver.resolve_dep_lists(module, deps);
    }
    // The apex select cannot be nested under another axis.
    let configured_stub = deps
        .iter_select_values()
        .flat_map(|(_, _, refs)| refs)
        .find(|dep| has_stubs(ctx, dep));
    if let Some(dep) = configured_stub {
        return Err(ModuleError::invalid_property(
            "shared_libs",
            format!("stub library {} is only listed for some configurations", dep.name),
        ));
    }

    let (stubbed, plain): (Vec<DepRef>, Vec<DepRef>) =
        deps.base_list().iter().cloned().partition(|dep| has_stubs(ctx, dep));
    if stubbed.is_empty() {
        return resolver.resolve_dep_lists(module, deps);
    }

    let mut without_stubbed = deps.clone();
    without_stubbed.set_base(plain);
    let mut resolved = resolver.resolve_dep_lists(module, &without_stubbed)?;

    let implementations = resolver.resolve_deps(module, &stubbed)?;
    let stubs: Vec<Label> = stubbed
        .iter()
        .filter_map(|dep| ctx.graph().primary(&dep.name))
        .map(|target| resolver.stub_label(&module.dir, target))
        .collect();
    resolved.set_select_value(&ConfigurationAxis::OS_AND_IN_APEX, ANDROID_AND_IN_APEX, stubs);
    resolved.set_select_value(&ConfigurationAxis::OS_AND_IN_APEX, CONDITIONS_DEFAULT, implementations);
    Ok(resolved)
}

/// Whether `dep` is a library that will be converted with a stub suite
fn has_stubs(ctx: &ConversionContext, dep: &DepRef) -> bool {
    ctx.resolver().should_convert(&dep.name)
        && ctx
            .graph()
            .primary(&dep.name)
            .is_some_and(|target| !stub_versions(target).is_empty())
}

/// `stubs.versions` of a library module, empty when it has no stubs
pub(super) fn stub_versions(module: &Module) -> Vec<String> {
    module
        .property("stubs")
        .and_then(|stubs| stubs.get("versions"))
        .and_then(Value::as_array)
        .map(|versions| {
            versions
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// `enabled: false` becomes an incompatible constraint on the affected
/// configurations
fn target_compatible_with(
    ctx: &ConversionContext,
    props: &PropertyReader<'_>,
) -> Result<Configurable<Vec<String>>, ConvertError> {
    let mut enabled = props.bool("enabled")?;
    enabled.collapse_scalar("enabled", ctx.build_config())?;

    let constraint = |enabled: &bool| {
        if *enabled {
            Vec::new()
        } else {
            vec![INCOMPATIBLE.to_string()]
        }
    };
    let mut result = Configurable::new();
    match enabled.sorted_axes().first() {
        None => {
            if enabled.base() == Some(&false) {
                result.set_base(constraint(&false));
            }
        }
        Some(axis) => {
            let axis = (*axis).clone();
            for (_, key, value) in enabled.iter_select_values() {
                result.set_select_value(&axis, key, constraint(value));
            }
            if enabled.axis_default(&axis).is_none() {
                let fallback = enabled.base().copied().unwrap_or(true);
                result.set_select_value(&axis, CONDITIONS_DEFAULT, constraint(&fallback));
            }
        }
    }
    Ok(result)
}
