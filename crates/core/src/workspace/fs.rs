//! Filesystem-backed workspace

use super::{BUILD_FILE_NAMES, PackageBoundaries, RuleExtractor, StarlarkParser, glob_files};
use crate::error::Result;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// A snapshot of a source tree taken once before conversion
#[derive(Debug, Clone, Default)]
pub struct FsWorkspace {
    root: PathBuf,
    files: BTreeSet<String>,
    build_files: BTreeMap<String, BTreeSet<String>>,
}

impl FsWorkspace {
    pub fn scan(root: &Path) -> Result<Self> {
        Self::scan_excluding(root, &[])
    }

    /// Scan `root`, skipping hidden directories and every directory in
    /// `excluded` (typically the generated output tree)
    pub fn scan_excluding(root: &Path, excluded: &[PathBuf]) -> Result<Self> {
        let mut parser = StarlarkParser::new()?;
        let mut workspace = Self {
            root: root.to_path_buf(),
            ..Self::default()
        };

        let walker = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| !is_skipped(entry, root, excluded));
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(relative) = relative_path(root, entry.path()) else {
                continue;
            };

            let file_name = entry.file_name().to_string_lossy();
            if BUILD_FILE_NAMES.contains(&file_name.as_ref()) {
                let dir = match relative.rsplit_once('/') {
                    Some((dir, _)) => dir.to_string(),
                    None => String::new(),
                };
                let targets = workspace.read_targets(&mut parser, entry.path());
                workspace.build_files.entry(dir).or_default().extend(targets);
            }
            workspace.files.insert(relative);
        }

        debug!(
            "Scanned {:?}: {} files, {} packages",
            root,
            workspace.files.len(),
            workspace.build_files.len()
        );
        Ok(workspace)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read_targets(&self, parser: &mut StarlarkParser, path: &Path) -> BTreeSet<String> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Cannot read {:?}: {}", path, e);
                return BTreeSet::new();
            }
        };
        // A broken BUILD file still marks a package; its targets are unknown.
        match parser.parse_build_file(&content) {
            Ok(ast) => RuleExtractor::extract_rules(&ast)
                .into_iter()
                .map(|rule| rule.name)
                .collect(),
            Err(e) => {
                warn!("Failed to parse {:?}: {}", path, e);
                BTreeSet::new()
            }
        }
    }
}

fn is_skipped(entry: &DirEntry, root: &Path, excluded: &[PathBuf]) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    if entry.file_name().to_string_lossy().starts_with('.') {
        return true;
    }
    excluded
        .iter()
        .any(|dir| entry.path() == dir || entry.path() == root.join(dir))
}

fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}

impl PackageBoundaries for FsWorkspace {
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
