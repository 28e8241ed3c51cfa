use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::{convert_command, explain_command};

#[derive(Parser, Debug)]
#[command(name = "bp2bazel")]
#[command(version, about, long_about = None)]
#[command(after_help = "ENVIRONMENT:\n    RUST_LOG=debug    Enable debug logging")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Inputs shared by every command
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Module graph JSON produced by the Blueprint front end
    #[arg(short, long)]
    pub graph: PathBuf,

    /// Source tree root used for file checks and hand-written BUILD files
    #[arg(short, long, default_value = ".")]
    pub root: PathBuf,

    /// Config file (defaults to bp2bazel.json or .bp2bazel.json in the root)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert a module graph into BUILD.bazel files
    #[command(visible_alias = "c")]
    Convert {
        #[command(flatten)]
        source: SourceArgs,

        /// Directory receiving the generated BUILD.bazel files
        #[arg(short, long, default_value = "bp2bazel-out")]
        out: PathBuf,

        /// Write conversion metrics as JSON to this file
        #[arg(short, long)]
        metrics: Option<PathBuf>,

        /// Print the generated files instead of writing them
        #[arg(short, long)]
        dry_run: bool,
    },
    /// Show how a single module converts and why
    #[command(visible_alias = "e")]
    Explain {
        #[command(flatten)]
        source: SourceArgs,

        /// Print the explanation as JSON
        #[arg(long)]
        json: bool,

        /// Module name
        module: String,
    },
}

impl Commands {
    /// Execute the command
    pub fn execute(self) -> Result<()> {
        match self {
            Commands::Convert {
                source,
                out,
                metrics,
                dry_run,
            } => convert_command(&source, &out, metrics.as_deref(), dry_run),
            Commands::Explain { source, json, module } => explain_command(&source, &module, json),
        }
    }
}
