use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of every generated BUILD file
pub const BUILD_FILE_NAME: &str = "BUILD.bazel";

/// Where the BUILD file of package `dir` lands below `out`
pub fn build_file_path(out: &Path, dir: &str) -> PathBuf {
    if dir.is_empty() {
        out.join(BUILD_FILE_NAME)
    } else {
        out.join(dir).join(BUILD_FILE_NAME)
    }
}

/// Writes one BUILD file per package, returning the written paths in order
pub fn write_build_files(out: &Path, files: &BTreeMap<String, String>) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(files.len());
    for (dir, content) in files {
        let path = build_file_path(out, dir);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        debug!("Wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}
