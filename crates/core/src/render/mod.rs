//! Turning configurable attribute values into Starlark text

mod select;
mod starlark;

pub use select::{render_list, render_scalar};
pub(crate) use starlark::INDENT;
pub use starlark::{NONE, StarlarkValue, list_literal, quote};

use crate::axis::BuildConfig;
use crate::configurable::Configurable;
use crate::error::Result;
use crate::label::Label;

/// A typed attribute value as produced by a rule handler
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    Bool(Configurable<bool>),
    Int(Configurable<i64>),
    String(Configurable<String>),
    Label(Configurable<Label>),
    StringList(Configurable<Vec<String>>),
    LabelList(Configurable<Vec<Label>>),
}

impl Attribute {
    pub fn bool(value: bool) -> Self {
        Attribute::Bool(Configurable::from_base(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Attribute::String(Configurable::from_base(value.into()))
    }

    pub fn label(value: Label) -> Self {
        Attribute::Label(Configurable::from_base(value))
    }

    pub fn string_list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Attribute::StringList(Configurable::from_list(values.into_iter().map(Into::into)))
    }

    /// Whether the attribute would render to nothing
    pub fn is_empty(&self) -> bool {
        match self {
            Attribute::Bool(v) => is_unset(v),
            Attribute::Int(v) => is_unset(v),
            Attribute::String(v) => is_unset(v),
            Attribute::Label(v) => is_unset(v),
            Attribute::StringList(v) => v.is_empty(),
            Attribute::LabelList(v) => v.is_empty(),
        }
    }

    /// Collapses redundant branches and renders the value.
    ///
    /// Label lists are also deduplicated. `None` means the attribute should
    /// be omitted from the target.
    pub fn render(&self, name: &str, build: &BuildConfig) -> Result<Option<String>> {
        match self {
            Attribute::Bool(v) => render_collapsed_scalar(name, v, build),
            Attribute::Int(v) => render_collapsed_scalar(name, v, build),
            Attribute::String(v) => render_collapsed_scalar(name, v, build),
            Attribute::Label(v) => render_collapsed_scalar(name, v, build),
            Attribute::StringList(v) => {
                let mut v = v.clone();
                v.collapse();
                render_list(&v, build)
            }
            Attribute::LabelList(v) => {
                let mut v = v.clone();
                v.dedup();
                v.collapse();
                render_list(&v, build)
            }
        }
    }
}

fn is_unset<T: Clone + PartialEq>(value: &Configurable<T>) -> bool {
    value.base().is_none() && !value.has_configurable_values()
}

fn render_collapsed_scalar<T>(name: &str, value: &Configurable<T>, build: &BuildConfig) -> Result<Option<String>>
where
    T: StarlarkValue + crate::configurable::Scalar,
{
    let mut value = value.clone();
    value.collapse_scalar(name, build)?;
    render_scalar(name, &value, build)
}
