use super::BazelTarget;
use crate::render::quote;
use std::collections::{BTreeMap, BTreeSet};

/// `load("<location>", "<symbol>", ...)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadStatement {
    pub location: String,
    pub symbols: BTreeSet<String>,
}

impl LoadStatement {
    pub fn render(&self) -> String {
        let mut parts = vec![quote(&self.location)];
        parts.extend(self.symbols.iter().map(|symbol| quote(symbol)));
        format!("load({})", parts.join(", "))
    }
}

/// The generated targets of one directory
#[derive(Debug, Clone, Default)]
pub struct OutputBundle {
    targets: BTreeMap<String, BazelTarget>,
}

impl OutputBundle {
    pub fn targets(&self) -> impl Iterator<Item = &BazelTarget> {
        self.targets.values()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.targets.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub(super) fn insert(&mut self, target: BazelTarget) {
        self.targets.insert(target.name.clone(), target);
    }

    /// One statement per location, both locations and symbols sorted
    pub fn load_statements(&self) -> Vec<LoadStatement> {
        let mut grouped: BTreeMap<&str, BTreeSet<String>> = BTreeMap::new();
        for target in self.targets.values() {
            if let Some(location) = &target.load_location {
                grouped
                    .entry(location)
                    .or_default()
                    .insert(target.rule_class.clone());
            }
        }
        grouped
            .into_iter()
            .map(|(location, symbols)| LoadStatement {
                location: location.to_string(),
                symbols,
            })
            .collect()
    }

    /// Load header, a blank line, then the targets by name
    pub fn render(&self) -> String {
        let loads: Vec<String> = self.load_statements().iter().map(LoadStatement::render).collect();
        let targets: Vec<String> = self.targets.values().map(BazelTarget::render).collect();

        let mut out = String::new();
        if !loads.is_empty() {
            out.push_str(&loads.join("\n"));
            out.push_str("\n\n");
        }
        out.push_str(&targets.join("\n\n"));
        out.push('\n');
        out
    }
}
