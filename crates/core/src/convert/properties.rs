//! Reading arch-variant module properties into configurable values
//!
//! A property may be set at the top level and again under `arch.<arch>`,
//! `multilib.lib32|lib64`, `target.<os>`, `target.<os>_<arch>`, one of the
//! `target.host|linux|bionic|not_windows` groups, or
//! `product_variables.<name>`. Dotted property paths (`static.srcs`) are
//! looked up the same way inside every section.

use crate::axis::{BuildConfig, ConfigurationAxis};
use crate::configurable::{Configurable, Scalar};
use crate::error::{ConvertError, Error, ModuleError};
use crate::graph::Module;
use crate::label::DepRef;
use serde_json::{Map, Value};

const TARGET_GROUPS: [&str; 4] = ["host", "linux", "bionic", "not_windows"];

/// Where one section's values land
#[derive(Debug, Clone)]
struct Placement<'a> {
    axis: ConfigurationAxis,
    keys: Vec<String>,
    section: &'a Map<String, Value>,
}

/// Typed, axis-aware access to one module's properties
pub struct PropertyReader<'a> {
    module: &'a Module,
    placements: Vec<Placement<'a>>,
}

impl<'a> PropertyReader<'a> {
    /// Validates every configured section of `module` up front
    pub fn new(module: &'a Module, build: &BuildConfig) -> Result<Self, ConvertError> {
        let mut placements = vec![Placement {
            axis: ConfigurationAxis::NO_CONFIG,
            keys: Vec::new(),
            section: &module.properties,
        }];

        for (key, section) in sections(module, "arch")? {
            if !build.is_arch(key) {
                return Err(unsupported("arch", key));
            }
            placements.push(Placement {
                axis: ConfigurationAxis::ARCH,
                keys: vec![key.to_string()],
                section,
            });
        }

        for (key, section) in sections(module, "multilib")? {
            let arches = match key {
                "lib32" => &build.lib32_arches,
                "lib64" => &build.lib64_arches,
                _ => return Err(unsupported("multilib", key)),
            };
            placements.push(Placement {
                axis: ConfigurationAxis::ARCH,
                keys: arches.clone(),
                section,
            });
        }

        // Groups first so an explicit os or os_arch section overrides them.
        let targets = sections(module, "target")?;
        for group in TARGET_GROUPS {
            if let Some((_, section)) = targets.iter().find(|(key, _)| *key == group) {
                let oses = match group {
                    "host" => build.host_oses.clone(),
                    "linux" => build.linux_oses.clone(),
                    "bionic" => build.bionic_oses.clone(),
                    _ => build.not_windows_oses(),
                };
                placements.push(Placement {
                    axis: ConfigurationAxis::OS,
                    keys: oses,
                    section: *section,
                });
            }
        }
        for (key, section) in &targets {
            if TARGET_GROUPS.contains(key) {
                continue;
            }
            let axis = if build.is_os(key) {
                ConfigurationAxis::OS
            } else if build.is_os_arch(key) {
                ConfigurationAxis::OS_ARCH
            } else {
                return Err(unsupported("target", key));
            };
            placements.push(Placement {
                axis,
                keys: vec![key.to_string()],
                section: *section,
            });
        }

        for (key, section) in sections(module, "product_variables")? {
            if !build.product_variables.iter().any(|v| v == key) {
                return Err(unsupported("product_variables", key));
            }
            placements.push(Placement {
                axis: ConfigurationAxis::product_variable(key),
                keys: vec![key.to_string()],
                section,
            });
        }

        Ok(Self { module, placements })
    }

    pub fn module(&self) -> &'a Module {
        self.module
    }

    /// Every value of `path`, with where it belongs
    fn lookups(&self, path: &str) -> impl Iterator<Item = (&Placement<'a>, &'a Value)> {
        self.placements
            .iter()
            .filter_map(move |placement| lookup(placement.section, path).map(|value| (placement, value)))
    }

    pub fn has(&self, path: &str) -> bool {
        self.lookups(path).next().is_some()
    }

    /// A list property; section values append in section order
    pub fn string_list(&self, path: &str) -> Result<Configurable<Vec<String>>, ModuleError> {
        let mut result = Configurable::new();
        for (placement, value) in self.lookups(path) {
            let items = as_string_list(path, value)?;
            if placement.axis.is_base() {
                result.branch_mut(&placement.axis, "").extend(items);
                continue;
            }
            for key in &placement.keys {
                result.branch_mut(&placement.axis, key).extend(items.iter().cloned());
            }
        }
        Ok(result)
    }

    /// A list of module names
    pub fn dep_list(&self, path: &str) -> Result<Configurable<Vec<DepRef>>, ModuleError> {
        Ok(self
            .string_list(path)?
            .map(|names| names.iter().map(DepRef::new).collect()))
    }

    pub fn string(&self, path: &str) -> Result<Configurable<String>, ModuleError> {
        self.scalar(path, |value| value.as_str().map(str::to_string), "a string")
    }

    pub fn bool(&self, path: &str) -> Result<Configurable<bool>, ModuleError> {
        self.scalar(path, Value::as_bool, "a boolean")
    }

    pub fn int(&self, path: &str) -> Result<Configurable<i64>, ModuleError> {
        self.scalar(path, Value::as_i64, "an integer")
    }

    /// The unconfigured value of a string property
    pub fn base_string(&self, path: &str) -> Result<Option<String>, ModuleError> {
        Ok(self.string(path)?.base().cloned())
    }

    fn scalar<T: Scalar>(
        &self,
        path: &str,
        convert: impl Fn(&Value) -> Option<T>,
        expected: &str,
    ) -> Result<Configurable<T>, ModuleError> {
        let mut result = Configurable::new();
        for (placement, value) in self.lookups(path) {
            let value = convert(value)
                .ok_or_else(|| ModuleError::invalid_property(path, format!("expected {expected}")))?;
            if placement.axis.is_base() {
                result.set_base(value);
                continue;
            }
            for key in &placement.keys {
                result.set_select_value(&placement.axis, key, value.clone());
            }
        }
        Ok(result)
    }
}

fn unsupported(axis: &str, key: &str) -> ConvertError {
    ConvertError::Fatal(Error::UnsupportedConfiguration {
        axis: axis.to_string(),
        key: key.to_string(),
    })
}

/// `(key, section)` pairs of a configuration block such as `arch`
fn sections<'a>(module: &'a Module, block: &str) -> Result<Vec<(&'a str, &'a Map<String, Value>)>, ConvertError> {
    let Some(value) = module.properties.get(block) else {
        return Ok(Vec::new());
    };
    let Some(map) = value.as_object() else {
        return Err(ModuleError::invalid_property(block, "expected an object").into());
    };
    map.iter()
        .map(|(key, section)| match section.as_object() {
            Some(section) => Ok((key.as_str(), section)),
            None => Err(ModuleError::invalid_property(format!("{block}.{key}"), "expected an object").into()),
        })
        .collect()
}

fn lookup<'a>(section: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let first = parts.next()?;
    let mut value = section.get(first)?;
    for part in parts {
        value = value.as_object()?.get(part)?;
    }
    Some(value)
}

fn as_string_list(path: &str, value: &Value) -> Result<Vec<String>, ModuleError> {
    let invalid = || ModuleError::invalid_property(path, "expected a list of strings");
    value
        .as_array()
        .ok_or_else(invalid)?
        .iter()
        .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn module(properties: Value) -> Module {
        Module::new("libfoo", "cc_library_static", "foo").with_properties(properties)
    }

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_reads_base_and_arch_values() {
        let m = module(json!({
            "srcs": ["a.c"],
            "arch": {"arm": {"srcs": ["arm.c"]}, "x86": {"cflags": ["-m32"]}}
        }));
        let reader = PropertyReader::new(&m, &BuildConfig::default()).unwrap();

        let srcs = reader.string_list("srcs").unwrap();
        assert_eq!(srcs.base_list(), list(&["a.c"]).as_slice());
        assert_eq!(srcs.select_value(&ConfigurationAxis::ARCH, "arm"), Some(&list(&["arm.c"])));
        assert_eq!(srcs.select_value(&ConfigurationAxis::ARCH, "x86"), None);
    }

    #[test]
    fn test_multilib_and_target_groups() {
        let m = module(json!({
            "multilib": {"lib32": {"srcs": ["32.c"]}},
            "target": {
                "host": {"srcs": ["host.c"]},
                "linux_glibc": {"srcs": ["glibc.c"]},
                "android_arm64": {"srcs": ["android_arm64.c"]}
            }
        }));
        let build = BuildConfig::default();
        let reader = PropertyReader::new(&m, &build).unwrap();
        let srcs = reader.string_list("srcs").unwrap();

        assert_eq!(srcs.select_value(&ConfigurationAxis::ARCH, "arm"), Some(&list(&["32.c"])));
        assert_eq!(srcs.select_value(&ConfigurationAxis::ARCH, "x86"), Some(&list(&["32.c"])));
        assert_eq!(srcs.select_value(&ConfigurationAxis::ARCH, "arm64"), None);
        assert_eq!(
            srcs.select_value(&ConfigurationAxis::OS, "linux_glibc"),
            Some(&list(&["host.c", "glibc.c"]))
        );
        assert_eq!(srcs.select_value(&ConfigurationAxis::OS, "darwin"), Some(&list(&["host.c"])));
        assert_eq!(srcs.select_value(&ConfigurationAxis::OS, "android"), None);
        assert_eq!(
            srcs.select_value(&ConfigurationAxis::OS_ARCH, "android_arm64"),
            Some(&list(&["android_arm64.c"]))
        );
    }

    #[test]
    fn test_explicit_os_overrides_group_for_scalars() {
        let m = module(json!({
            "stl": "libc++",
            "target": {"not_windows": {"stl": "none"}, "darwin": {"stl": "libc++_static"}}
        }));
        let reader = PropertyReader::new(&m, &BuildConfig::default()).unwrap();
        let stl = reader.string("stl").unwrap();

        assert_eq!(stl.base().map(String::as_str), Some("libc++"));
        assert_eq!(
            stl.select_value(&ConfigurationAxis::OS, "darwin").map(String::as_str),
            Some("libc++_static")
        );
        assert_eq!(
            stl.select_value(&ConfigurationAxis::OS, "linux_glibc").map(String::as_str),
            Some("none")
        );
        assert_eq!(stl.select_value(&ConfigurationAxis::OS, "windows"), None);
    }

    #[test]
    fn test_product_variables() {
        let m = module(json!({"product_variables": {"eng": {"cflags": ["-DENG"]}}}));
        let reader = PropertyReader::new(&m, &BuildConfig::default()).unwrap();
        let cflags = reader.string_list("cflags").unwrap();

        assert_eq!(
            cflags.select_value(&ConfigurationAxis::product_variable("eng"), "eng"),
            Some(&list(&["-DENG"]))
        );
    }

    #[test]
    fn test_unknown_section_key_is_fatal() {
        let m = module(json!({"arch": {"sparc": {"srcs": ["s.c"]}}}));
        let err = PropertyReader::new(&m, &BuildConfig::default()).err().unwrap();
        assert!(matches!(
            err,
            ConvertError::Fatal(Error::UnsupportedConfiguration { .. })
        ));
    }

    #[test]
    fn test_wrong_shape_drops_module() {
        let m = module(json!({"srcs": "a.c", "static": {"srcs": ["s.c"]}}));
        let reader = PropertyReader::new(&m, &BuildConfig::default()).unwrap();

        assert!(matches!(
            reader.string_list("srcs"),
            Err(ModuleError::InvalidProperty { .. })
        ));
        assert_eq!(
            reader.string_list("static.srcs").unwrap().base_list(),
            list(&["s.c"]).as_slice()
        );
    }
}
