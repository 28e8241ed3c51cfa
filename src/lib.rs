//! Virtual package hosting the cross-crate integration tests in `tests/`
pub use bp2bazel_core::*;
