//! Values that may vary along configuration axes
//!
//! A [`Configurable`] holds a base value plus, per axis, a map from
//! configuration key to value. List values get append/prepend/collapse
//! semantics (see `list.rs`); scalar values get overwrite semantics and the
//! os/arch folding rules (see `scalar.rs`).

mod list;
mod scalar;

pub use scalar::Scalar;

use crate::axis::{CONDITIONS_DEFAULT, ConfigurationAxis};
use std::collections::BTreeMap;

/// Per-axis key to value map
pub type AxisValues<V> = BTreeMap<String, V>;

/// A base value plus per-axis configured values
#[derive(Debug, Clone, PartialEq)]
pub struct Configurable<V> {
    base: Option<V>,
    values: BTreeMap<ConfigurationAxis, AxisValues<V>>,
}

impl<V> Default for Configurable<V> {
    fn default() -> Self {
        Self {
            base: None,
            values: BTreeMap::new(),
        }
    }
}

impl<V: Clone + PartialEq> Configurable<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A container with only a base value
    pub fn from_base(value: V) -> Self {
        Self {
            base: Some(value),
            values: BTreeMap::new(),
        }
    }

    pub fn set_base(&mut self, value: V) {
        self.base = Some(value);
    }

    pub fn clear_base(&mut self) {
        self.base = None;
    }

    pub fn base(&self) -> Option<&V> {
        self.base.as_ref()
    }

    /// Assigns a value to one key of an axis; the base axis writes the base value
    pub fn set_select_value(&mut self, axis: &ConfigurationAxis, key: &str, value: V) {
        if axis.is_base() {
            self.base = Some(value);
            return;
        }
        self.values
            .entry(axis.clone())
            .or_default()
            .insert(key.to_string(), value);
    }

    pub fn select_value(&self, axis: &ConfigurationAxis, key: &str) -> Option<&V> {
        if axis.is_base() {
            return self.base.as_ref();
        }
        self.values.get(axis).and_then(|values| values.get(key))
    }

    /// The value of the axis' `conditions_default` key, if set
    pub fn axis_default(&self, axis: &ConfigurationAxis) -> Option<&V> {
        self.select_value(axis, CONDITIONS_DEFAULT)
    }

    pub fn axis_values(&self, axis: &ConfigurationAxis) -> Option<&AxisValues<V>> {
        self.values.get(axis)
    }

    pub fn has_configurable_values(&self) -> bool {
        self.values.values().any(|values| !values.is_empty())
    }

    /// Axes carrying at least one value, in rendering order
    pub fn sorted_axes(&self) -> Vec<&ConfigurationAxis> {
        self.values
            .iter()
            .filter(|(_, values)| !values.is_empty())
            .map(|(axis, _)| axis)
            .collect()
    }

    pub fn remove_axis(&mut self, axis: &ConfigurationAxis) -> Option<AxisValues<V>> {
        self.values.remove(axis)
    }

    /// Every `(axis, key, value)` triple, base excluded
    pub fn iter_select_values(&self) -> impl Iterator<Item = (&ConfigurationAxis, &str, &V)> {
        self.values.iter().flat_map(|(axis, values)| {
            values
                .iter()
                .map(move |(key, value)| (axis, key.as_str(), value))
        })
    }

    /// Converts every value, keeping the axis structure
    pub fn try_map<W, E>(&self, mut f: impl FnMut(&V) -> Result<W, E>) -> Result<Configurable<W>, E> {
        let base = self.base.as_ref().map(&mut f).transpose()?;
        let mut values = BTreeMap::new();
        for (axis, axis_values) in &self.values {
            let mut mapped = BTreeMap::new();
            for (key, value) in axis_values {
                mapped.insert(key.clone(), f(value)?);
            }
            values.insert(axis.clone(), mapped);
        }
        Ok(Configurable { base, values })
    }

    pub fn map<W>(&self, mut f: impl FnMut(&V) -> W) -> Configurable<W> {
        match self.try_map(|v| Ok::<W, std::convert::Infallible>(f(v))) {
            Ok(mapped) => mapped,
            Err(never) => match never {},
        }
    }

    fn axis_values_mut(&mut self, axis: &ConfigurationAxis) -> &mut AxisValues<V> {
        self.values.entry(axis.clone()).or_default()
    }
}
