//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI
//! arguments. The actual command implementations are in the `commands`
//! module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Kassenbon - Capture receipts into canonical records
#[derive(Parser)]
#[command(name = "kassenbon")]
#[command(about = "Receipt capture and canonicalization pipeline", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Data root directory (defaults to the platform data dir)
    ///
    /// Can also be set via KASSENBON_DATA_DIR.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// IANA timezone for receipt timestamps
    #[arg(long, default_value = "Europe/Berlin", global = true)]
    pub tz: String,

    /// Skip the remote canonicalization service even when configured
    ///
    /// The remote service is configured via KASSENBON_RECEIPT_SERVICE_URL.
    #[arg(long, global = true)]
    pub no_remote: bool,

    /// Fail instead of canonicalizing locally when remote routing fails
    #[arg(long, global = true)]
    pub no_fallback: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ingest raw receipt text
    Ingest {
        /// Text file to ingest (reads stdin if not given)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Source label recorded in the ingest event (e.g. "inbox")
        #[arg(short, long)]
        source: Option<String>,
    },

    /// Ingest a structured receipt payload (JSON)
    IngestJson {
        /// JSON file to ingest (reads stdin if not given)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Source label recorded in the ingest event
        #[arg(short, long)]
        source: Option<String>,
    },

    /// Ingest a receipt image
    IngestImage {
        /// Image file to ingest
        #[arg(short, long)]
        file: PathBuf,

        /// Text file with already-extracted OCR text for this image
        #[arg(long)]
        ocr_text: Option<PathBuf>,

        /// Source label recorded in the ingest event
        #[arg(short, long)]
        source: Option<String>,
    },

    /// Score receipt-likelihood of a text without ingesting it
    Detect {
        /// Text file to score (reads stdin if not given)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Categorize a single item name
    Categorize {
        /// Raw item name, e.g. "K-Bio H-Milch 3,5%"
        name: String,
    },

    /// Show the loaded rule set
    Rules,
}
