//! Configuration axes along which an attribute value may vary
//!
//! Every axis owns a set of configuration keys (`arm64`, `android`,
//! `android_arm64`, ...) plus the `conditions_default` key. Axes are totally
//! ordered; the renderer emits one `select()` per axis in that order.

mod build_config;

pub use build_config::BuildConfig;

use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;

/// Key used inside an axis for the branch taken when nothing else matches
pub const CONDITIONS_DEFAULT: &str = "conditions_default";
/// The select key Bazel recognises as the default branch
pub const CONDITIONS_DEFAULT_SELECT_KEY: &str = "//conditions:default";

pub const ANDROID_AND_IN_APEX: &str = "android-in_apex";
pub const ANDROID_AND_NON_APEX: &str = "android-non_apex";

const ARCH_PLATFORM_PREFIX: &str = "//build/bazel/platforms/arch:";
const OS_PLATFORM_PREFIX: &str = "//build/bazel/platforms/os:";
const OS_ARCH_PLATFORM_PREFIX: &str = "//build/bazel/platforms/os_arch:";
const PRODUCT_VARIABLE_PREFIX: &str = "//build/bazel/product_variables:";
const APEX_CONFIG_PREFIX: &str = "//build/bazel/rules/apex:";

/// Kind of an axis. Declaration order is the rendering order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigurationType {
    NoConfig,
    Arch,
    Os,
    OsArch,
    ProductVariables,
    OsAndInApex,
}

/// One configuration dimension
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConfigurationAxis {
    config_type: ConfigurationType,
    /// Product variable name for `ProductVariables` axes, empty otherwise
    sub_type: String,
}

impl ConfigurationAxis {
    pub const NO_CONFIG: ConfigurationAxis = ConfigurationAxis::plain(ConfigurationType::NoConfig);
    pub const ARCH: ConfigurationAxis = ConfigurationAxis::plain(ConfigurationType::Arch);
    pub const OS: ConfigurationAxis = ConfigurationAxis::plain(ConfigurationType::Os);
    pub const OS_ARCH: ConfigurationAxis = ConfigurationAxis::plain(ConfigurationType::OsArch);
    pub const OS_AND_IN_APEX: ConfigurationAxis =
        ConfigurationAxis::plain(ConfigurationType::OsAndInApex);

    const fn plain(config_type: ConfigurationType) -> Self {
        Self {
            config_type,
            sub_type: String::new(),
        }
    }

    /// Axis for a single product variable; each variable is its own axis
    pub fn product_variable(name: impl Into<String>) -> Self {
        Self {
            config_type: ConfigurationType::ProductVariables,
            sub_type: name.into(),
        }
    }

    pub fn config_type(&self) -> ConfigurationType {
        self.config_type
    }

    pub fn sub_type(&self) -> &str {
        &self.sub_type
    }

    pub fn is_base(&self) -> bool {
        self.config_type == ConfigurationType::NoConfig
    }

    /// Fully-qualified select key for a configuration key of this axis
    pub fn select_key(&self, key: &str) -> Result<String> {
        if key == CONDITIONS_DEFAULT {
            return Ok(CONDITIONS_DEFAULT_SELECT_KEY.to_string());
        }
        match self.config_type {
            ConfigurationType::NoConfig => Err(self.unsupported(key)),
            ConfigurationType::Arch => Ok(format!("{ARCH_PLATFORM_PREFIX}{key}")),
            ConfigurationType::Os => Ok(format!("{OS_PLATFORM_PREFIX}{key}")),
            ConfigurationType::OsArch => Ok(format!("{OS_ARCH_PLATFORM_PREFIX}{key}")),
            ConfigurationType::ProductVariables => {
                if key == self.sub_type {
                    Ok(format!("{PRODUCT_VARIABLE_PREFIX}{}", key.to_lowercase()))
                } else {
                    Err(self.unsupported(key))
                }
            }
            ConfigurationType::OsAndInApex => match key {
                ANDROID_AND_IN_APEX | ANDROID_AND_NON_APEX => {
                    Ok(format!("{APEX_CONFIG_PREFIX}{key}"))
                }
                _ => Err(self.unsupported(key)),
            },
        }
    }

    /// Every valid key of this axis, sorted, with the default key last
    pub fn keys_for(&self, build: &BuildConfig) -> Vec<String> {
        let mut keys: Vec<String> = match self.config_type {
            ConfigurationType::NoConfig => Vec::new(),
            ConfigurationType::Arch => build.arches(),
            ConfigurationType::Os => build.oses(),
            ConfigurationType::OsArch => build.os_arches(),
            ConfigurationType::ProductVariables => vec![self.sub_type.clone()],
            ConfigurationType::OsAndInApex => vec![
                ANDROID_AND_IN_APEX.to_string(),
                ANDROID_AND_NON_APEX.to_string(),
            ],
        };
        keys.sort();
        keys.dedup();
        keys.push(CONDITIONS_DEFAULT.to_string());
        keys
    }

    /// Fails with a fatal error when `key` is not expressible on this axis
    pub fn validate_key(&self, key: &str, build: &BuildConfig) -> Result<()> {
        if self.keys_for(build).iter().any(|k| k == key) {
            Ok(())
        } else {
            Err(self.unsupported(key))
        }
    }

    fn unsupported(&self, key: &str) -> Error {
        Error::UnsupportedConfiguration {
            axis: self.to_string(),
            key: key.to_string(),
        }
    }
}

impl fmt::Display for ConfigurationAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.config_type {
            ConfigurationType::NoConfig => write!(f, "no_config"),
            ConfigurationType::Arch => write!(f, "arch"),
            ConfigurationType::Os => write!(f, "os"),
            ConfigurationType::OsArch => write!(f, "os_arch"),
            ConfigurationType::ProductVariables => write!(f, "product_variables:{}", self.sub_type),
            ConfigurationType::OsAndInApex => write!(f, "os_and_in_apex"),
        }
    }
}

/// Composite key of the `OsArch` axis
pub fn os_arch_key(os: &str, arch: &str) -> String {
    format!("{os}_{arch}")
}

/// Sorts axes into rendering order
pub fn axis_order<'a>(axes: impl IntoIterator<Item = &'a ConfigurationAxis>) -> Vec<&'a ConfigurationAxis> {
    let mut ordered: Vec<_> = axes.into_iter().collect();
    ordered.sort();
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_order_is_fixed() {
        let pv_b = ConfigurationAxis::product_variable("debuggable");
        let pv_a = ConfigurationAxis::product_variable("binder32bit");
        let axes = vec![
            ConfigurationAxis::OS_AND_IN_APEX,
            pv_b.clone(),
            ConfigurationAxis::OS_ARCH,
            ConfigurationAxis::OS,
            pv_a.clone(),
            ConfigurationAxis::ARCH,
            ConfigurationAxis::NO_CONFIG,
        ];

        let ordered = axis_order(&axes);

        assert_eq!(
            ordered,
            vec![
                &ConfigurationAxis::NO_CONFIG,
                &ConfigurationAxis::ARCH,
                &ConfigurationAxis::OS,
                &ConfigurationAxis::OS_ARCH,
                &pv_a,
                &pv_b,
                &ConfigurationAxis::OS_AND_IN_APEX,
            ]
        );
    }

    #[test]
    fn test_keys_end_with_default() {
        let build = BuildConfig::default();
        for axis in [
            ConfigurationAxis::ARCH,
            ConfigurationAxis::OS,
            ConfigurationAxis::OS_ARCH,
            ConfigurationAxis::OS_AND_IN_APEX,
            ConfigurationAxis::product_variable("debuggable"),
        ] {
            let keys = axis.keys_for(&build);
            assert_eq!(keys.last().map(String::as_str), Some(CONDITIONS_DEFAULT), "{axis}");
        }
    }

    #[test]
    fn test_arch_keys() {
        let keys = ConfigurationAxis::ARCH.keys_for(&BuildConfig::default());
        assert_eq!(
            keys,
            vec!["arm", "arm64", "riscv64", "x86", "x86_64", CONDITIONS_DEFAULT]
        );
    }

    #[test]
    fn test_os_arch_is_distinct_axis() {
        let build = BuildConfig::default();
        assert_ne!(ConfigurationAxis::OS_ARCH, ConfigurationAxis::OS);
        assert!(ConfigurationAxis::OS_ARCH.validate_key("android_arm64", &build).is_ok());
        assert!(ConfigurationAxis::OS.validate_key("android_arm64", &build).is_err());
        assert!(ConfigurationAxis::ARCH.validate_key("android", &build).is_err());
    }

    #[test]
    fn test_select_keys() {
        assert_eq!(
            ConfigurationAxis::ARCH.select_key("arm64").unwrap(),
            "//build/bazel/platforms/arch:arm64"
        );
        assert_eq!(
            ConfigurationAxis::OS.select_key("android").unwrap(),
            "//build/bazel/platforms/os:android"
        );
        assert_eq!(
            ConfigurationAxis::OS_ARCH.select_key("linux_glibc_x86_64").unwrap(),
            "//build/bazel/platforms/os_arch:linux_glibc_x86_64"
        );
        assert_eq!(
            ConfigurationAxis::product_variable("Debuggable")
                .select_key("Debuggable")
                .unwrap(),
            "//build/bazel/product_variables:debuggable"
        );
        assert_eq!(
            ConfigurationAxis::OS_AND_IN_APEX
                .select_key(ANDROID_AND_IN_APEX)
                .unwrap(),
            "//build/bazel/rules/apex:android-in_apex"
        );
        assert_eq!(
            ConfigurationAxis::OS.select_key(CONDITIONS_DEFAULT).unwrap(),
            CONDITIONS_DEFAULT_SELECT_KEY
        );
    }

    #[test]
    fn test_invalid_keys_are_fatal() {
        assert!(ConfigurationAxis::NO_CONFIG.select_key("arm").is_err());
        assert!(
            ConfigurationAxis::product_variable("debuggable")
                .select_key("eng")
                .is_err()
        );
        assert!(ConfigurationAxis::OS_AND_IN_APEX.select_key("linux").is_err());
        assert!(matches!(
            ConfigurationAxis::ARCH.validate_key("mips", &BuildConfig::default()),
            Err(Error::UnsupportedConfiguration { .. })
        ));
    }
}
