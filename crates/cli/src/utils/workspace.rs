use anyhow::{Context, Result};
use bp2bazel_core::{ConfigLoader, ConversionContext, FsWorkspace, ModuleGraph};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::cli::SourceArgs;

/// Loads the graph, the config and the source tree named by `source`.
///
/// Directories in `skip` (the output tree) are left out of the scan.
pub fn load_context(source: &SourceArgs, skip: &[PathBuf]) -> Result<ConversionContext> {
    let graph = ModuleGraph::load(&source.graph)
        .with_context(|| format!("Failed to load module graph {}", source.graph.display()))?;
    let config = ConfigLoader::load(source.config.as_deref(), Some(source.root.as_path()))
        .context("Failed to load configuration")?;
    let workspace = FsWorkspace::scan_excluding(&source.root, skip)
        .with_context(|| format!("Failed to scan {}", source.root.display()))?;
    info!("Loaded {} modules from {}", graph.len(), source.graph.display());

    Ok(ConversionContext::new(graph, config, Arc::new(workspace)))
}
