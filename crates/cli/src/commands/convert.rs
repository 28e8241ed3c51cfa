use anyhow::{Context, Result};
use bp2bazel_core::Converter;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::cli::SourceArgs;
use crate::display::print_summary;
use crate::utils::{build_file_path, load_context, write_build_files};

pub fn convert_command(source: &SourceArgs, out: &Path, metrics: Option<&Path>, dry_run: bool) -> Result<()> {
    debug!("Converting {} into {}", source.graph.display(), out.display());

    let ctx = load_context(source, &[out.to_path_buf()])?;
    let result = Converter::new(ctx).run().context("Conversion failed")?;

    if let Some(path) = metrics {
        let json = result.metrics.to_json()?;
        fs::write(path, json).with_context(|| format!("Failed to write metrics to {}", path.display()))?;
    }

    if dry_run {
        for (dir, content) in &result.files {
            println!("# {}", build_file_path(out, dir).display());
            println!("{content}");
        }
        return Ok(());
    }

    let written = write_build_files(out, &result.files)?;
    print_summary(&result.metrics, written.len(), out);
    Ok(())
}
