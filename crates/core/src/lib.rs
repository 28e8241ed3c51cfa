//! bp2bazel - Translate a resolved Blueprint module graph into Bazel BUILD files
//!
//! This crate provides functionality to:
//! - Model attribute values that vary by architecture, OS and product variable
//! - Render those values as Starlark `select()` expressions
//! - Resolve module references into Bazel labels and drop unconvertible modules
//! - Aggregate generated targets into deterministic per-directory BUILD files
pub mod aggregate;
pub mod axis;
pub mod config;
pub mod configurable;
pub mod convert;
pub mod error;
pub mod graph;
pub mod label;
pub mod metrics;
pub mod render;
pub mod workspace;

// Re-export commonly used types
pub use aggregate::{BazelTarget, TargetAggregator};
pub use axis::{BuildConfig, ConfigurationAxis};
pub use config::{Bp2BuildConfig, ConfigLoader};
pub use configurable::Configurable;
pub use convert::{ConversionContext, ConversionResult, Converter, RuleHandler, RuleRegistry, explain};
pub use error::{ConvertError, Error, ModuleError, Result};
pub use graph::{Module, ModuleGraph};
pub use label::{DepRef, Label, LabelResolver};
pub use metrics::CodegenMetrics;
pub use workspace::{FsWorkspace, InMemoryWorkspace, PackageBoundaries};
