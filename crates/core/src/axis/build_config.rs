//! Architectures, operating systems and product variables known to the build

use super::os_arch_key;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The build's known configuration space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// OS name to the architectures it supports
    pub os_arches: BTreeMap<String, Vec<String>>,
    /// OSes grouped under `target.host`
    pub host_oses: Vec<String>,
    /// OSes that use the bionic libc
    pub bionic_oses: Vec<String>,
    /// OSes grouped under `target.linux`
    pub linux_oses: Vec<String>,
    /// Architectures addressed by `multilib.lib32`
    pub lib32_arches: Vec<String>,
    /// Architectures addressed by `multilib.lib64`
    pub lib64_arches: Vec<String>,
    /// Product variables that may carry configured properties
    pub product_variables: Vec<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        let os_arches = [
            ("android", &["arm", "arm64", "riscv64", "x86", "x86_64"][..]),
            ("darwin", &["arm64", "x86_64"][..]),
            ("linux_bionic", &["arm64", "x86_64"][..]),
            ("linux_glibc", &["x86", "x86_64"][..]),
            ("linux_musl", &["arm", "arm64", "x86", "x86_64"][..]),
            ("windows", &["x86", "x86_64"][..]),
        ]
        .into_iter()
        .map(|(os, arches)| {
            (
                os.to_string(),
                arches.iter().map(|a| a.to_string()).collect(),
            )
        })
        .collect();

        Self {
            os_arches,
            host_oses: strings(&["darwin", "linux_bionic", "linux_glibc", "linux_musl", "windows"]),
            bionic_oses: strings(&["android", "linux_bionic"]),
            linux_oses: strings(&["android", "linux_bionic", "linux_glibc", "linux_musl"]),
            lib32_arches: strings(&["arm", "x86"]),
            lib64_arches: strings(&["arm64", "riscv64", "x86_64"]),
            product_variables: strings(&[
                "binder32bit",
                "debuggable",
                "eng",
                "malloc_not_svelte",
                "platform_sdk_version",
                "unbundled_build",
            ]),
        }
    }
}

impl BuildConfig {
    /// All architectures supported by any OS, sorted
    pub fn arches(&self) -> Vec<String> {
        let mut arches: Vec<String> = self.os_arches.values().flatten().cloned().collect();
        arches.sort();
        arches.dedup();
        arches
    }

    pub fn oses(&self) -> Vec<String> {
        self.os_arches.keys().cloned().collect()
    }

    /// Every supported `<os>_<arch>` pair
    pub fn os_arches(&self) -> Vec<String> {
        self.os_arches
            .iter()
            .flat_map(|(os, arches)| arches.iter().map(move |arch| os_arch_key(os, arch)))
            .collect()
    }

    pub fn is_arch(&self, name: &str) -> bool {
        self.os_arches.values().flatten().any(|a| a == name)
    }

    pub fn is_os(&self, name: &str) -> bool {
        self.os_arches.contains_key(name)
    }

    pub fn is_os_arch(&self, name: &str) -> bool {
        self.os_arches().iter().any(|k| k == name)
    }

    /// OSes that are not Windows, for the `target.not_windows` group
    pub fn not_windows_oses(&self) -> Vec<String> {
        self.os_arches
            .keys()
            .filter(|os| os.as_str() != "windows")
            .cloned()
            .collect()
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
