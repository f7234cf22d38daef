//! CLI argument definitions.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// DeepBook - write an illustrated children's book from a prompt
#[derive(Parser, Debug)]
#[command(name = "deepbook")]
#[command(about = "Write an illustrated children's book from a prompt", long_about = None)]
#[command(version)]
pub struct Cli {
    /// What the story should be about
    pub prompt: String,

    /// Number of chapters to request
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub chapters: Option<u32>,

    /// Skip character illustrations
    #[arg(long)]
    pub no_illustrations: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "markdown")]
    pub format: OutputFormat,

    /// Configuration file layered over the bundled defaults
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Write logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,
}

/// Output format options
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Markdown document
    Markdown,
    /// The full book as JSON
    Json,
}
