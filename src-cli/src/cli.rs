use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Evidence-grounded pro/con arguments with quality scores.
#[derive(Debug, Parser)]
#[command(name = "argumentrx")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(long, global = true, env = "ARGUMENTRX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Retrieve evidence and generate scored pro/con arguments for a topic
    Generate(GenerateArgs),

    /// Score an argument text file
    Score(ScoreArgs),

    /// Check that the local Ollama server is reachable
    Health,
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Topic to argue about
    pub topic: String,

    /// Write the JSON report to this path
    #[arg(long)]
    pub save: Option<PathBuf>,

    /// Write the JSON report into this directory under a generated name
    #[arg(long, conflicts_with = "save")]
    pub results_dir: Option<PathBuf>,

    /// Also write the source transparency report (Markdown)
    #[arg(long)]
    pub transparency: bool,

    /// Search the persisted index instead of rebuilding it
    #[arg(long)]
    pub reuse_index: bool,

    /// Print the full report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ScoreArgs {
    /// File containing the argument text
    #[arg(long)]
    pub file: PathBuf,

    /// Citation string attached to the argument (repeatable)
    #[arg(long = "citation")]
    pub citations: Vec<String>,

    /// Skip the model-based assessment
    #[arg(long)]
    pub rule_only: bool,
}
