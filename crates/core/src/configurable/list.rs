//! List semantics: append, prepend, collapse and excludes

use super::Configurable;
use crate::axis::{CONDITIONS_DEFAULT, ConfigurationAxis};
use std::collections::{BTreeMap, BTreeSet};

impl<T: Clone + PartialEq> Configurable<Vec<T>> {
    pub fn from_list(items: impl IntoIterator<Item = T>) -> Self {
        Self::from_base(items.into_iter().collect())
    }

    /// The base list, empty when unset
    pub fn base_list(&self) -> &[T] {
        self.base.as_deref().unwrap_or(&[])
    }

    /// True when neither the base nor any branch holds an element
    pub fn is_empty(&self) -> bool {
        self.base_list().is_empty() && self.values.values().flatten().all(|(_, v)| v.is_empty())
    }

    /// Concatenates `other` after `self`, per axis and key
    pub fn append(&mut self, other: &Self) {
        *self = Self::concat(self, other);
    }

    /// Concatenates `other` before `self`, per axis and key
    pub fn prepend(&mut self, other: &Self) {
        *self = Self::concat(other, self);
    }

    fn concat(first: &Self, second: &Self) -> Self {
        let base = match (&first.base, &second.base) {
            (None, None) => None,
            _ => {
                let mut base = first.base_list().to_vec();
                base.extend(second.base_list().iter().cloned());
                Some(base)
            }
        };
        let mut result = Self {
            base,
            values: BTreeMap::new(),
        };

        let axes: BTreeSet<&ConfigurationAxis> =
            first.values.keys().chain(second.values.keys()).collect();
        for axis in axes {
            let keys: BTreeSet<&String> = first
                .values
                .get(axis)
                .into_iter()
                .chain(second.values.get(axis))
                .flat_map(|values| values.keys())
                .collect();
            for key in keys {
                let mut merged = first.branch_or_default(axis, key);
                merged.extend(second.branch_or_default(axis, key));
                result.set_select_value(axis, key, merged);
            }
        }
        result
    }

    /// Value a configuration with `key` selected would see on `axis`
    fn branch_or_default(&self, axis: &ConfigurationAxis, key: &str) -> Vec<T> {
        self.select_value(axis, key)
            .or_else(|| self.axis_default(axis))
            .cloned()
            .unwrap_or_default()
    }

    /// Drops every axis whose branches all equal its default, folding the
    /// default into the base. Folded values land before the existing base, so
    /// they render after every surviving select block.
    pub fn collapse(&mut self) {
        let mut folded = Vec::new();
        let axes: Vec<ConfigurationAxis> = self.values.keys().cloned().collect();
        for axis in axes {
            let Some(values) = self.values.get(&axis) else {
                continue;
            };
            let default = values.get(CONDITIONS_DEFAULT).cloned().unwrap_or_default();
            if values.values().all(|v| *v == default) {
                self.values.remove(&axis);
                folded.extend(default);
            }
        }
        if !folded.is_empty() {
            folded.extend(self.base_list().iter().cloned());
            self.base = Some(folded);
        }
    }

    /// Removes excluded entries. Base excludes apply everywhere; a branch
    /// exclude only applies to that branch and never touches the base.
    pub fn resolve_excludes(&mut self, excludes: &Self) {
        let base_excludes = excludes.base_list();
        if !base_excludes.is_empty() {
            self.retain(|item| !base_excludes.contains(item));
        }

        for (axis, key, excluded) in excludes.iter_select_values() {
            let Some(values) = self.values.get_mut(axis) else {
                continue;
            };
            if !values.contains_key(key) {
                // The configuration would otherwise fall through to the default.
                match values.get(CONDITIONS_DEFAULT) {
                    Some(default) => {
                        let default = default.clone();
                        values.insert(key.to_string(), default);
                    }
                    None => continue,
                }
            }
            if let Some(branch) = values.get_mut(key) {
                branch.retain(|item| !excluded.contains(item));
            }
        }
    }

    /// Keeps the first occurrence of every element, per base and per branch
    pub fn dedup(&mut self) {
        if let Some(base) = self.base.as_mut() {
            first_unique(base);
        }
        for values in self.values.values_mut() {
            for branch in values.values_mut() {
                first_unique(branch);
            }
        }
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) {
        if let Some(base) = self.base.as_mut() {
            base.retain(|item| keep(item));
        }
        for values in self.values.values_mut() {
            for branch in values.values_mut() {
                branch.retain(|item| keep(item));
            }
        }
    }

    /// The concatenated list a build configured with `point` would see:
    /// one branch per axis in axis order, then the base.
    pub fn evaluate(&self, point: &BTreeMap<ConfigurationAxis, String>) -> Vec<T> {
        let mut out = Vec::new();
        for (axis, values) in &self.values {
            let key = point.get(axis).map(String::as_str).unwrap_or(CONDITIONS_DEFAULT);
            if let Some(branch) = values.get(key).or_else(|| values.get(CONDITIONS_DEFAULT)) {
                out.extend(branch.iter().cloned());
            }
        }
        out.extend(self.base_list().iter().cloned());
        out
    }

    /// Mutable access to one branch, created empty when missing
    pub fn branch_mut(&mut self, axis: &ConfigurationAxis, key: &str) -> &mut Vec<T> {
        if axis.is_base() {
            return self.base.get_or_insert_with(Vec::new);
        }
        self.axis_values_mut(axis).entry(key.to_string()).or_default()
    }
}

fn first_unique<T: PartialEq>(items: &mut Vec<T>) {
    let mut i = 0;
    while i < items.len() {
        if items[..i].contains(&items[i]) {
            items.remove(i);
        } else {
            i += 1;
        }
    }
}
