//! The source tree as seen by the converter
//!
//! Package boundaries, hand-written targets, file existence and glob
//! expansion. Conversion only talks to [`PackageBoundaries`]; the filesystem
//! and in-memory implementations live here.

mod fs;
mod rule_extractor;
mod starlark_parser;

pub use fs::FsWorkspace;
pub use rule_extractor::{RuleCall, RuleExtractor};
pub use starlark_parser::{StarlarkAst, StarlarkParser};

use crate::error::{Error, Result};
use glob::{MatchOptions, Pattern};
use std::collections::{BTreeMap, BTreeSet};

/// File names that make a directory a Bazel package
pub const BUILD_FILE_NAMES: [&str; 2] = ["BUILD.bazel", "BUILD"];

/// Read-only view of the source tree, shared across conversion workers
pub trait PackageBoundaries: Send + Sync {
    /// Whether `dir` holds a hand-written BUILD file
    fn has_build_file(&self, dir: &str) -> bool;

    /// Target names declared by the hand-written BUILD file in `dir`
    fn existing_targets(&self, dir: &str) -> BTreeSet<String>;

    /// Whether the file at `path` (relative to the source root) exists
    fn file_exists(&self, path: &str) -> bool;

    /// Files below `dir` matching any include and no exclude, relative to
    /// `dir` and sorted
    fn glob(&self, dir: &str, includes: &[String], excludes: &[String]) -> Result<Vec<String>>;
}

/// `dir/path`, or `path` for the root directory
pub fn join_path(dir: &str, path: &str) -> String {
    if dir.is_empty() {
        path.to_string()
    } else {
        format!("{dir}/{path}")
    }
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|pattern| {
            if pattern.starts_with('/') || pattern.split('/').any(|part| part == "..") {
                return Err(Error::ParseError(format!(
                    "glob pattern {pattern:?} escapes its directory"
                )));
            }
            Pattern::new(pattern)
                .map_err(|e| Error::ParseError(format!("invalid glob pattern {pattern:?}: {e}")))
        })
        .collect()
}

/// Shared glob matching over a sorted set of root-relative file paths
pub(crate) fn glob_files<'a>(
    files: impl Iterator<Item = &'a String>,
    dir: &str,
    includes: &[String],
    excludes: &[String],
) -> Result<Vec<String>> {
    let includes = compile_patterns(includes)?;
    let excludes = compile_patterns(excludes)?;
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: true,
    };

    let mut matched = BTreeSet::new();
    for path in files {
        let relative = if dir.is_empty() {
            path.as_str()
        } else {
            match path.strip_prefix(dir).and_then(|rest| rest.strip_prefix('/')) {
                Some(rest) => rest,
                None => continue,
            }
        };
        if includes.iter().any(|p| p.matches_with(relative, options))
            && !excludes.iter().any(|p| p.matches_with(relative, options))
        {
            matched.insert(relative.to_string());
        }
    }
    Ok(matched.into_iter().collect())
}

/// A workspace held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkspace {
    files: BTreeSet<String>,
    build_files: BTreeMap<String, BTreeSet<String>>,
}

impl InMemoryWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: &str) -> Self {
        self.files.insert(path.trim_start_matches('/').to_string());
        self
    }

    pub fn with_files<'a>(mut self, paths: impl IntoIterator<Item = &'a str>) -> Self {
        for path in paths {
            self = self.with_file(path);
        }
        self
    }

    /// Marks `dir` as a package whose BUILD file declares `targets`
    pub fn with_build_file<'a>(mut self, dir: &str, targets: impl IntoIterator<Item = &'a str>) -> Self {
        self.build_files
            .entry(dir.to_string())
            .or_default()
            .extend(targets.into_iter().map(str::to_string));
        self
    }
}

impl PackageBoundaries for InMemoryWorkspace {
    fn has_build_file(&self, dir: &str) -> bool {
        self.build_files.contains_key(dir)
    }

    fn existing_targets(&self, dir: &str) -> BTreeSet<String> {
        self.build_files.get(dir).cloned().unwrap_or_default()
    }

    fn file_exists(&self, path: &str) -> bool {
        self.files.contains(path)
    }

    fn glob(&self, dir: &str, includes: &[String], excludes: &[String]) -> Result<Vec<String>> {
        glob_files(self.files.iter(), dir, includes, excludes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn workspace() -> InMemoryWorkspace {
        InMemoryWorkspace::new().with_files([
            "pkg/a.c",
            "pkg/b.c",
            "pkg/b_test.c",
            "pkg/sub/c.c",
            "pkg/sub/deep/d.c",
            "pkg/.hidden.c",
            "other/e.c",
        ])
    }

    #[test]
    fn test_star_does_not_cross_directories() {
        let files = workspace().glob("pkg", &strings(&["*.c"]), &[]).unwrap();
        assert_eq!(files, strings(&["a.c", "b.c", "b_test.c"]));
    }

    #[test]
    fn test_double_star_crosses_directories() {
        let files = workspace()
            .glob("pkg", &strings(&["**/*.c"]), &strings(&["**/*_test.c"]))
            .unwrap();
        assert_eq!(files, strings(&["a.c", "b.c", "sub/c.c", "sub/deep/d.c"]));
    }

    #[test]
    fn test_glob_from_root() {
        let files = workspace().glob("", &strings(&["other/*.c"]), &[]).unwrap();
        assert_eq!(files, strings(&["other/e.c"]));
    }

    #[test]
    fn test_escaping_pattern_is_rejected() {
        assert!(workspace().glob("pkg", &strings(&["../other/*.c"]), &[]).is_err());
    }

    #[test]
    fn test_build_files() {
        let ws = InMemoryWorkspace::new().with_build_file("pkg/sub", ["handwritten"]);
        assert!(ws.has_build_file("pkg/sub"));
        assert!(!ws.has_build_file("pkg"));
        assert!(ws.existing_targets("pkg/sub").contains("handwritten"));
    }
}
