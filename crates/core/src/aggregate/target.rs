use crate::render::{INDENT, quote};
use serde::Serialize;
use std::collections::BTreeMap;

/// A generated target with every attribute already rendered
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BazelTarget {
    pub name: String,
    pub rule_class: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_location: Option<String>,
    /// Attribute name to Starlark expression
    pub attributes: BTreeMap<String, String>,
    /// Directory whose BUILD file receives the target
    pub package: String,
    /// Module that produced the target
    pub module_name: String,
    pub module_type: String,
}

impl BazelTarget {
    /// Renders the rule call; `name` first, the rest by attribute name
    pub fn render(&self) -> String {
        let mut out = format!("{}(\n{INDENT}name = {},\n", self.rule_class, quote(&self.name));
        for (attribute, value) in &self.attributes {
            out.push_str(&format!("{INDENT}{attribute} = {value},\n"));
        }
        out.push(')');
        out
    }
}
