//! Bazel labels and references to Blueprint modules
//!
//! All label strings are built here; rule handlers go through
//! [`LabelResolver`] instead of formatting `//pkg:name` themselves.

mod resolver;

pub use resolver::{DependencyStatus, LabelResolver, ModuleState};

use crate::configurable::Scalar;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static TARGET_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9!%@^_#$&'()*\-+,;<=>?\[\]{|}~./ ]+$").expect("valid target name regex")
});

/// A target-addressable reference, e.g. `:foo` or `//bar/baz:qux`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Label(String);

impl Label {
    /// Label of `name` as seen from a target in `from_dir`
    pub(crate) fn for_target(from_dir: &str, target_dir: &str, name: &str) -> Self {
        if from_dir == target_dir {
            Label(format!(":{name}"))
        } else {
            Label(format!("//{target_dir}:{name}"))
        }
    }

    /// A label taken verbatim from a hand-written redirect
    pub(crate) fn verbatim(label: impl Into<String>) -> Self {
        Label(label.into())
    }

    /// A package-relative file path
    pub(crate) fn file(path: impl Into<String>) -> Self {
        Label(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Scalar for Label {}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether `name` can be used as a Bazel target name
pub fn is_valid_target_name(name: &str) -> bool {
    !name.starts_with('/') && !name.ends_with('/') && !name.contains("//") && TARGET_NAME.is_match(name)
}

/// A named pointer from one module to another, optionally to a specific variant
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "DepRefRepr")]
pub struct DepRef {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

impl DepRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variant: None,
        }
    }

    pub fn with_variant(name: impl Into<String>, variant: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variant: Some(variant.into()),
        }
    }
}

impl fmt::Display for DepRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.variant {
            Some(variant) => write!(f, "{}#{}", self.name, variant),
            None => f.write_str(&self.name),
        }
    }
}

/// Module graphs spell references either as `"name"` or as an object
#[derive(Deserialize)]
#[serde(untagged)]
enum DepRefRepr {
    Name(String),
    Full {
        name: String,
        #[serde(default)]
        variant: Option<String>,
    },
}

impl From<DepRefRepr> for DepRef {
    fn from(repr: DepRefRepr) -> Self {
        match repr {
            DepRefRepr::Name(name) => DepRef::new(name),
            DepRefRepr::Full { name, variant } => DepRef { name, variant },
        }
    }
}

/// One entry of a source list property
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRef {
    /// `:name` or `:name{.tag}`, the output of another module
    Module(DepRef),
    /// A path relative to the module directory
    File(String),
    /// A path containing glob metacharacters
    Glob(String),
}

impl SourceRef {
    pub fn parse(entry: &str) -> Self {
        if let Some(reference) = entry.strip_prefix(':') {
            let name = match reference.find('{') {
                Some(idx) => &reference[..idx],
                None => reference,
            };
            return SourceRef::Module(DepRef::new(name));
        }
        if entry.contains(['*', '?', '[']) {
            SourceRef::Glob(entry.to_string())
        } else {
            SourceRef::File(entry.trim_start_matches("./").to_string())
        }
    }
}
