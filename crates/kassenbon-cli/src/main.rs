//! Kassenbon CLI - Receipt capture and canonicalization
//!
//! Usage:
//!   kassenbon ingest --file bon.txt        Ingest raw receipt text
//!   kassenbon ingest-json --file bon.json  Ingest a structured receipt payload
//!   kassenbon ingest-image --file bon.jpg  Store an image (plus optional OCR text)
//!   kassenbon detect --file bon.txt        Score receipt-likelihood only
//!   kassenbon categorize "H-Milch 3,5%"    Categorize a single item name
//!   kassenbon rules                        Show the loaded rule set

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match &cli.command {
        Commands::Ingest { file, source } => {
            commands::cmd_ingest(&cli, file.as_deref(), source.as_deref()).await
        }
        Commands::IngestJson { file, source } => {
            commands::cmd_ingest_json(&cli, file.as_deref(), source.as_deref()).await
        }
        Commands::IngestImage {
            file,
            ocr_text,
            source,
        } => commands::cmd_ingest_image(&cli, file, ocr_text.as_deref(), source.as_deref()).await,
        Commands::Detect { file } => commands::cmd_detect(&cli, file.as_deref()),
        Commands::Categorize { name } => commands::cmd_categorize(&cli, name),
        Commands::Rules => commands::cmd_rules(&cli),
    }
}
