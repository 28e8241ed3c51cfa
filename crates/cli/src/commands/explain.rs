use anyhow::{Context, Result};
use bp2bazel_core::explain;

use crate::cli::SourceArgs;
use crate::display::print_explanation;
use crate::utils::load_context;

pub fn explain_command(source: &SourceArgs, module: &str, json: bool) -> Result<()> {
    let ctx = load_context(source, &[])?;
    let explanation = explain(&ctx, module).with_context(|| format!("Cannot explain {module}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&explanation)?);
    } else {
        print_explanation(&explanation);
    }
    Ok(())
}
