//! Module conversion: rule handlers, the shared context and the driver

mod context;
mod driver;
mod explain;
mod properties;
mod registry;
pub mod rules;

pub use context::ConversionContext;
pub use driver::{ConversionResult, Converter, convert_module};
pub use explain::{DependencyReport, Explanation, explain};
pub use properties::PropertyReader;
pub use registry::RuleRegistry;
pub use rules::{RuleHandler, TargetSpec};
pub(crate) use rules::STUB_SUITE_SUFFIX;
