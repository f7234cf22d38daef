//! DeepBook CLI binary.
//!
//! Writes an illustrated children's book from a prompt, reporting each
//! stage on stderr and printing the finished book on stdout.

use clap::Parser;
use std::process::ExitCode;

mod cli;

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    use cli::{Cli, write_story};

    // Load .env before reading API keys
    let _ = dotenvy::dotenv();

    // Parse command-line arguments
    let cli = Cli::parse();

    // Initialize tracing
    let log_level = if cli.verbose { "debug" } else { "warn" };
    let log_format = if cli.json_logs {
        deepbook::LogFormat::Json
    } else {
        deepbook::LogFormat::Text
    };
    deepbook::init_logging(log_level, log_format)?;

    let done = write_story(&cli).await?;
    Ok(if done {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
