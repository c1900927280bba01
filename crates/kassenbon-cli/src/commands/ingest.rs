//! Ingestion CLI commands

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use kassenbon_core::{IngestResult, IngestStatus};

use crate::cli::Cli;

use super::{orchestrator, read_input};

pub async fn cmd_ingest(cli: &Cli, file: Option<&Path>, source: Option<&str>) -> Result<()> {
    let text = read_input(file)?;
    let orchestrator = orchestrator(cli)?;

    println!("📥 Ingesting receipt text...");
    let result = orchestrator.ingest_text(&text, source).await?;
    tracing::info!(
        ingest_event_id = %result.ingest_event_id,
        status = result.status.as_str(),
        "text ingest finished"
    );
    print_result(&result);
    Ok(())
}

pub async fn cmd_ingest_json(cli: &Cli, file: Option<&Path>, source: Option<&str>) -> Result<()> {
    let body = read_input(file)?;
    let payload: serde_json::Value =
        serde_json::from_str(&body).context("Input is not valid JSON")?;
    let orchestrator = orchestrator(cli)?;

    println!("📥 Ingesting structured receipt...");
    let result = orchestrator.ingest_structured(payload, source).await?;
    tracing::info!(
        ingest_event_id = %result.ingest_event_id,
        status = result.status.as_str(),
        "structured ingest finished"
    );
    print_result(&result);
    Ok(())
}

pub async fn cmd_ingest_image(
    cli: &Cli,
    file: &Path,
    ocr_text_file: Option<&Path>,
    source: Option<&str>,
) -> Result<()> {
    let bytes =
        fs::read(file).with_context(|| format!("Failed to read image {}", file.display()))?;
    let ocr_text = match ocr_text_file {
        Some(path) => Some(
            fs::read_to_string(path)
                .with_context(|| format!("Failed to read OCR text {}", path.display()))?,
        ),
        None => None,
    };
    let filename = file.file_name().map(|n| n.to_string_lossy().to_string());
    let orchestrator = orchestrator(cli)?;

    println!("📥 Ingesting receipt image {}...", file.display());
    let result = orchestrator
        .ingest_image(&bytes, filename.as_deref(), ocr_text.as_deref(), source)
        .await?;
    tracing::info!(
        ingest_event_id = %result.ingest_event_id,
        status = result.status.as_str(),
        "image ingest finished"
    );
    print_result(&result);
    Ok(())
}

fn print_result(result: &IngestResult) {
    let marker = match result.status {
        IngestStatus::Ok | IngestStatus::OkLocal => "✅",
        IngestStatus::NonReceipt => "🚫",
        IngestStatus::StoredRawImage => "📦",
        IngestStatus::RouteFailed | IngestStatus::OcrFailed => "❌",
    };
    println!("{} Status: {}", marker, result.status.as_str());
    println!("   Event:  {}", result.ingest_event_path);
    if let Some(path) = &result.canonical_receipt_path {
        println!("   Record: {}", path);
    }
    if let Some(receipt) = &result.receipt {
        let merchant = receipt
            .receipt
            .merchant
            .name
            .as_deref()
            .unwrap_or("Unknown");
        let total = receipt
            .totals
            .total
            .map(|t| format!("{:.2} {}", t, receipt.receipt.currency))
            .unwrap_or_else(|| "n/a".to_string());
        println!(
            "   {} - {} item(s) - {}",
            merchant,
            receipt.line_items.len(),
            total
        );
        for item in &receipt.line_items {
            let amount = item
                .total
                .map(|t| format!("{:.2}", t))
                .unwrap_or_else(|| "-".to_string());
            println!("     {:<30} {:>8}  {}", item.name_raw, amount, item.category);
        }
    }
}
