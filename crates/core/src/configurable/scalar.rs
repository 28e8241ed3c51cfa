//! Scalar semantics: overwrite, axis collapse and os/arch folding

use super::Configurable;
use crate::axis::{BuildConfig, CONDITIONS_DEFAULT, ConfigurationAxis, ConfigurationType, os_arch_key};
use crate::error::{Error, Result};

/// Marker for values that overwrite rather than concatenate
pub trait Scalar: Clone + PartialEq {}

impl Scalar for bool {}
impl Scalar for i64 {}
impl Scalar for String {}

impl<T: Scalar> Configurable<T> {
    /// Reduces the container to at most one axis.
    ///
    /// Axes whose branches all agree are dropped. When os and arch values
    /// coexist they are folded into the os_arch axis: an explicit os_arch
    /// value wins, then the arch value, then the os value. Product variables
    /// or apex configuration mixed with any other axis cannot be expressed
    /// as a single select and are fatal.
    pub fn collapse_scalar(&mut self, attribute: &str, build: &BuildConfig) -> Result<()> {
        self.drop_uniform_axes();

        let types: Vec<ConfigurationType> = self
            .sorted_axes()
            .into_iter()
            .map(|axis| axis.config_type())
            .collect();
        let has = |t: ConfigurationType| types.contains(&t);
        let product_axes = types
            .iter()
            .filter(|t| **t == ConfigurationType::ProductVariables)
            .count();
        let has_os = has(ConfigurationType::Os);
        let has_arch = has(ConfigurationType::Arch);
        let has_os_arch = has(ConfigurationType::OsArch);
        let platform_axes = has_os || has_arch || has_os_arch;
        let has_apex = has(ConfigurationType::OsAndInApex);

        if product_axes > 1
            || (product_axes == 1 && (platform_axes || has_apex))
            || (has_apex && platform_axes)
        {
            return Err(Error::UncollapsibleAttribute {
                attribute: attribute.to_string(),
                reason: "two or more unrelated axes are configured".to_string(),
            });
        }

        if (has_os && has_arch) || (has_os_arch && (has_os || has_arch)) {
            self.fold_into_os_arch(build);
        }
        Ok(())
    }

    fn drop_uniform_axes(&mut self) {
        let axes: Vec<ConfigurationAxis> = self.values.keys().cloned().collect();
        for axis in axes {
            let Some(values) = self.values.get(&axis) else {
                continue;
            };
            match values.get(CONDITIONS_DEFAULT).cloned() {
                Some(default) => {
                    if values.values().all(|v| *v == default) {
                        self.values.remove(&axis);
                        self.base = Some(default);
                    }
                }
                None => {
                    let uniform = match &self.base {
                        Some(base) => values.values().all(|v| v == base),
                        None => values.is_empty(),
                    };
                    if uniform {
                        self.values.remove(&axis);
                    }
                }
            }
        }
    }

    fn fold_into_os_arch(&mut self, build: &BuildConfig) {
        let arch_values = self.values.remove(&ConfigurationAxis::ARCH).unwrap_or_default();
        let os_values = self.values.remove(&ConfigurationAxis::OS).unwrap_or_default();
        let os_arch = self.axis_values_mut(&ConfigurationAxis::OS_ARCH);

        for (os, arches) in &build.os_arches {
            for arch in arches {
                let key = os_arch_key(os, arch);
                if os_arch.contains_key(&key) {
                    continue;
                }
                // Arch takes precedence over os, matching the order the
                // source build applies its variants in.
                if let Some(value) = arch_values.get(arch).or_else(|| os_values.get(os)) {
                    os_arch.insert(key, value.clone());
                }
            }
        }

        if !os_arch.contains_key(CONDITIONS_DEFAULT) {
            if let Some(default) = arch_values
                .get(CONDITIONS_DEFAULT)
                .or_else(|| os_values.get(CONDITIONS_DEFAULT))
            {
                os_arch.insert(CONDITIONS_DEFAULT.to_string(), default.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> String {
        v.to_string()
    }

    #[test]
    fn test_uniform_axis_collapses_into_base() {
        let mut attr = Configurable::from_base(s("old"));
        attr.set_select_value(&ConfigurationAxis::ARCH, "arm", s("new"));
        attr.set_select_value(&ConfigurationAxis::ARCH, CONDITIONS_DEFAULT, s("new"));

        attr.collapse_scalar("stem", &BuildConfig::default()).unwrap();

        assert!(!attr.has_configurable_values());
        assert_eq!(attr.base(), Some(&s("new")));
    }

    #[test]
    fn test_branches_equal_to_base_collapse() {
        let mut attr = Configurable::from_base(true);
        attr.set_select_value(&ConfigurationAxis::OS, "android", true);

        attr.collapse_scalar("enabled", &BuildConfig::default()).unwrap();

        assert!(!attr.has_configurable_values());
        assert_eq!(attr.base(), Some(&true));
    }

    #[test]
    fn test_single_axis_survives() {
        let mut attr = Configurable::from_base(false);
        attr.set_select_value(&ConfigurationAxis::OS, "darwin", true);

        attr.collapse_scalar("enabled", &BuildConfig::default()).unwrap();

        assert_eq!(attr.sorted_axes(), vec![&ConfigurationAxis::OS]);
    }

    #[test]
    fn test_os_and_arch_fold_into_os_arch() {
        let mut attr = Configurable::new();
        attr.set_select_value(&ConfigurationAxis::OS, "android", s("os_android"));
        attr.set_select_value(&ConfigurationAxis::ARCH, "arm64", s("arch_arm64"));
        attr.set_select_value(&ConfigurationAxis::OS_ARCH, "android_x86", s("explicit"));

        attr.collapse_scalar("version_script", &BuildConfig::default()).unwrap();

        assert_eq!(attr.sorted_axes(), vec![&ConfigurationAxis::OS_ARCH]);
        let get = |key: &str| attr.select_value(&ConfigurationAxis::OS_ARCH, key).cloned();
        assert_eq!(get("android_arm64"), Some(s("arch_arm64")));
        assert_eq!(get("android_arm"), Some(s("os_android")));
        assert_eq!(get("android_x86"), Some(s("explicit")));
        assert_eq!(get("darwin_arm64"), Some(s("arch_arm64")));
        assert_eq!(get("linux_glibc_x86_64"), None);
    }

    #[test]
    fn test_product_variable_with_platform_axis_is_fatal() {
        let mut attr = Configurable::new();
        attr.set_select_value(&ConfigurationAxis::OS, "android", 1i64);
        attr.set_select_value(&ConfigurationAxis::product_variable("eng"), "eng", 2i64);

        let err = attr
            .collapse_scalar("min_sdk_version", &BuildConfig::default())
            .unwrap_err();
        assert!(matches!(err, Error::UncollapsibleAttribute { .. }));
    }
}
