//! `select()` expressions for configurable values

use super::starlark::{NONE, StarlarkValue, indent, list_literal, quote};
use crate::axis::{BuildConfig, CONDITIONS_DEFAULT, CONDITIONS_DEFAULT_SELECT_KEY, ConfigurationAxis};
use crate::configurable::{AxisValues, Configurable, Scalar};
use crate::error::{Error, Result};

/// Level attribute values render at inside a target
const VALUE_LEVEL: usize = 1;

/// Renders a list attribute.
///
/// One `select()` per surviving axis in axis order joined with ` + `, then
/// the base literal. Returns `None` when nothing would be rendered.
pub fn render_list<T>(attr: &Configurable<Vec<T>>, build: &BuildConfig) -> Result<Option<String>>
where
    T: StarlarkValue + Clone + PartialEq,
{
    let mut parts = Vec::new();
    for axis in attr.sorted_axes() {
        let Some(values) = attr.axis_values(axis) else {
            continue;
        };
        if values.values().all(|branch| branch.is_empty()) {
            continue;
        }
        let default = values
            .get(CONDITIONS_DEFAULT)
            .map(|branch| list_literal(branch, VALUE_LEVEL + 1))
            .unwrap_or_else(|| "[]".to_string());
        let entries = select_entries(axis, values, build, |branch: &Vec<T>| {
            list_literal(branch, VALUE_LEVEL + 1)
        })?;
        parts.push(select_block(entries, default));
    }

    let base = attr.base_list();
    if !base.is_empty() {
        parts.push(list_literal(base, VALUE_LEVEL));
    }

    if parts.is_empty() {
        Ok(None)
    } else {
        Ok(Some(parts.join(" + ")))
    }
}

/// Renders a scalar attribute that has already been collapsed.
///
/// The base folds into the default branch of the single remaining select.
pub fn render_scalar<T>(attribute: &str, attr: &Configurable<T>, build: &BuildConfig) -> Result<Option<String>>
where
    T: StarlarkValue + Scalar,
{
    let axes = attr.sorted_axes();
    let axis = match axes.as_slice() {
        [] => return Ok(attr.base().map(|v| v.to_starlark())),
        [axis] => *axis,
        _ => {
            return Err(Error::UncollapsibleAttribute {
                attribute: attribute.to_string(),
                reason: format!("{} axes remain after collapsing", axes.len()),
            });
        }
    };

    let Some(values) = attr.axis_values(axis) else {
        return Ok(attr.base().map(|v| v.to_starlark()));
    };
    let default = attr
        .axis_default(axis)
        .or_else(|| attr.base())
        .map(|v| v.to_starlark())
        .unwrap_or_else(|| NONE.to_string());
    let entries = select_entries(axis, values, build, |v: &T| v.to_starlark())?;
    Ok(Some(select_block(entries, default)))
}

/// `(select key, rendered value)` for every explicit branch, sorted by key
fn select_entries<V>(
    axis: &ConfigurationAxis,
    values: &AxisValues<V>,
    build: &BuildConfig,
    render: impl Fn(&V) -> String,
) -> Result<Vec<(String, String)>> {
    let mut entries = Vec::with_capacity(values.len());
    for (key, value) in values {
        if key == CONDITIONS_DEFAULT {
            continue;
        }
        axis.validate_key(key, build)?;
        entries.push((axis.select_key(key)?, render(value)));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}

fn select_block(entries: Vec<(String, String)>, default: String) -> String {
    let inner = indent(VALUE_LEVEL + 1);
    let mut out = String::from("select({\n");
    let default_entry = (CONDITIONS_DEFAULT_SELECT_KEY.to_string(), default);
    for (key, value) in entries.into_iter().chain(std::iter::once(default_entry)) {
        out.push_str(&inner);
        out.push_str(&quote(&key));
        out.push_str(": ");
        out.push_str(&value);
        out.push_str(",\n");
    }
    out.push_str(&indent(VALUE_LEVEL));
    out.push_str("})");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_plain_list_renders_literal() {
        let attr = Configurable::from_list(list(&["a.c", "b.c"]));
        let rendered = render_list(&attr, &BuildConfig::default()).unwrap().unwrap();
        assert_eq!(rendered, "[\n        \"a.c\",\n        \"b.c\",\n    ]");
    }

    #[test]
    fn test_empty_list_renders_nothing() {
        let mut attr: Configurable<Vec<String>> = Configurable::new();
        attr.set_select_value(&ConfigurationAxis::ARCH, "arm", Vec::new());
        assert_eq!(render_list(&attr, &BuildConfig::default()).unwrap(), None);
    }

    #[test]
    fn test_selects_in_axis_order_then_base() {
        let mut attr = Configurable::from_list(list(&["common.c"]));
        attr.set_select_value(&ConfigurationAxis::OS, "linux_glibc", list(&["linux.c"]));
        attr.set_select_value(&ConfigurationAxis::ARCH, "x86", list(&["x86.c"]));
        attr.set_select_value(&ConfigurationAxis::ARCH, "arm", list(&["arm.c"]));

        let rendered = render_list(&attr, &BuildConfig::default()).unwrap().unwrap();

        assert_eq!(
            rendered,
            r#"select({
        "//build/bazel/platforms/arch:arm": ["arm.c"],
        "//build/bazel/platforms/arch:x86": ["x86.c"],
        "//conditions:default": [],
    }) + select({
        "//build/bazel/platforms/os:linux_glibc": ["linux.c"],
        "//conditions:default": [],
    }) + ["common.c"]"#
        );
    }

    #[test]
    fn test_multi_line_branch_indents_one_level_deeper() {
        let mut attr: Configurable<Vec<String>> = Configurable::new();
        attr.set_select_value(&ConfigurationAxis::OS, "android", list(&["a", "b"]));

        let rendered = render_list(&attr, &BuildConfig::default()).unwrap().unwrap();

        assert_eq!(
            rendered,
            r#"select({
        "//build/bazel/platforms/os:android": [
            "a",
            "b",
        ],
        "//conditions:default": [],
    })"#
        );
    }

    #[test]
    fn test_invalid_key_is_fatal() {
        let mut attr: Configurable<Vec<String>> = Configurable::new();
        attr.set_select_value(&ConfigurationAxis::ARCH, "sparc", list(&["a"]));
        let err = render_list(&attr, &BuildConfig::default()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedConfiguration { .. }));
    }

    #[test]
    fn test_scalar_base_folds_into_default() {
        let mut attr = Configurable::from_base(false);
        attr.set_select_value(&ConfigurationAxis::OS, "darwin", true);

        let rendered = render_scalar("enabled", &attr, &BuildConfig::default()).unwrap().unwrap();

        assert_eq!(
            rendered,
            r#"select({
        "//build/bazel/platforms/os:darwin": True,
        "//conditions:default": False,
    })"#
        );
    }

    #[test]
    fn test_scalar_without_base_defaults_to_none() {
        let mut attr = Configurable::new();
        attr.set_select_value(&ConfigurationAxis::product_variable("eng"), "eng", 2i64);

        let rendered = render_scalar("level", &attr, &BuildConfig::default()).unwrap().unwrap();

        assert_eq!(
            rendered,
            r#"select({
        "//build/bazel/product_variables:eng": 2,
        "//conditions:default": None,
    })"#
        );
    }

    #[test]
    fn test_scalar_with_two_axes_is_rejected() {
        let mut attr = Configurable::new();
        attr.set_select_value(&ConfigurationAxis::ARCH, "arm", 1i64);
        attr.set_select_value(&ConfigurationAxis::OS, "android", 2i64);
        assert!(render_scalar("x", &attr, &BuildConfig::default()).is_err());
    }
}
