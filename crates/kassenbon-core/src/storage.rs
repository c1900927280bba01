//! Persistence of canonical receipts and JSON artifacts
//!
//! Canonical receipts land at a deterministic path derived from the
//! receipt date, a slug of the merchant name, and the receipt id. The
//! embedded unique id excludes collisions; the year/date prefix keeps the
//! tree browsable without an index.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::CanonicalReceipt;

/// Casefold, map non-alphanumeric runs to a single underscore, trim.
/// Empty input slugs to "unknown".
pub fn slug(value: &str) -> String {
    let lowered = value.to_lowercase();
    let parts: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|p| !p.is_empty())
        .collect();
    let out = parts.join("_");
    if out.is_empty() {
        "unknown".to_string()
    } else {
        out
    }
}

/// Deterministic path for a canonical receipt:
/// `<canonical_dir>/receipts/<year>/<date>_<merchant-slug>_<id>.json`.
pub fn canonical_receipt_path(canonical_dir: &Path, receipt: &CanonicalReceipt) -> Result<PathBuf> {
    let date = parse_receipt_date(&receipt.receipt.datetime)?;
    let merchant = receipt
        .receipt
        .merchant
        .name
        .as_deref()
        .or(receipt.receipt.merchant.id.as_deref())
        .unwrap_or("unknown");
    let stem = format!(
        "{}_{}_{}",
        date.format("%Y-%m-%d"),
        slug(merchant),
        receipt.receipt.id
    );
    Ok(canonical_dir
        .join("receipts")
        .join(date.format("%Y").to_string())
        .join(format!("{stem}.json")))
}

fn parse_receipt_date(datetime: &str) -> Result<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(datetime) {
        return Ok(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(datetime, "%Y-%m-%dT%H:%M:%S") {
        return Ok(dt.date());
    }
    if datetime.len() >= 10 {
        if let Ok(date) = NaiveDate::parse_from_str(&datetime[..10], "%Y-%m-%d") {
            return Ok(date);
        }
    }
    Err(Error::Validation(format!(
        "receipt datetime is not ISO-8601: {datetime:?}"
    )))
}

/// Pretty-printed JSON write, creating parent directories.
pub fn write_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let body = serde_json::to_string_pretty(data)?;
    fs::write(path, body)?;
    Ok(())
}

pub fn persist_canonical_receipt(
    canonical_dir: &Path,
    receipt: &CanonicalReceipt,
) -> Result<PathBuf> {
    let path = canonical_receipt_path(canonical_dir, receipt)?;
    write_json(&path, receipt)?;
    Ok(path)
}
