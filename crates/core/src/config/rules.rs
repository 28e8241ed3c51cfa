//! Schemas for module types converted by the generic rule handler

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"));

/// How a module type maps onto a Bazel rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSchema {
    /// Rule class emitted, e.g. `java_library`
    pub rule_class: String,
    /// `.bzl` file the rule class is loaded from; native rules need none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load: Option<String>,
    /// Module property name to attribute schema
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeSchema>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeSchema {
    pub kind: AttributeKind,
    /// Attribute name in the generated target, defaults to the property name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rename: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    Bool,
    Int,
    String,
    StringList,
    /// Module names resolved to labels
    LabelList,
    /// Source paths, globs and `:module` references resolved to labels
    SourceList,
}

impl RuleSchema {
    pub fn new(rule_class: impl Into<String>) -> Self {
        Self {
            rule_class: rule_class.into(),
            load: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_load(mut self, location: impl Into<String>) -> Self {
        self.load = Some(location.into());
        self
    }

    pub fn with_attribute(mut self, property: &str, kind: AttributeKind) -> Self {
        self.attributes.insert(property.to_string(), AttributeSchema { kind, rename: None });
        self
    }

    /// Attribute name a property is emitted under
    pub fn attribute_name<'a>(&'a self, property: &'a str) -> &'a str {
        self.attributes
            .get(property)
            .and_then(|schema| schema.rename.as_deref())
            .unwrap_or(property)
    }

    pub(crate) fn validate(&self, module_type: &str) -> Result<()> {
        if !IDENTIFIER.is_match(&self.rule_class) {
            return Err(Error::ConfigError(format!(
                "rule schema for {module_type}: invalid rule class {:?}",
                self.rule_class
            )));
        }
        if let Some(load) = &self.load {
            if !load.ends_with(".bzl") {
                return Err(Error::ConfigError(format!(
                    "rule schema for {module_type}: load location {load:?} is not a .bzl file"
                )));
            }
        }
        for property in self.attributes.keys() {
            let attribute = self.attribute_name(property);
            if !IDENTIFIER.is_match(attribute) || attribute == "name" {
                return Err(Error::ConfigError(format!(
                    "rule schema for {module_type}: invalid attribute name {attribute:?}"
                )));
            }
        }
        Ok(())
    }
}
