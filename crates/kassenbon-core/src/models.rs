//! Persisted data model: canonical receipts, ingest events, ingest results
//!
//! Everything in this module is serialized as JSON on disk. The canonical
//! receipt is the root entity; an ingest event is the append-only audit
//! record tying a raw capture to its canonical output (or its rejection).

use serde::{Deserialize, Serialize};

/// Where an ingest call got its input from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Text,
    ReceiptJson,
    Image,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::ReceiptJson => "receipt_json",
            Self::Image => "image",
        }
    }
}

/// Terminal state of a single ingest call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestStatus {
    /// Canonicalized via the remote endpoint.
    Ok,
    /// Remote routing failed (or was not configured); canonicalized locally.
    OkLocal,
    /// The detector rejected the text; only the event record was written.
    NonReceipt,
    /// Remote routing failed and local fallback was disabled.
    RouteFailed,
    /// Image kept, no OCR backend available to produce text.
    StoredRawImage,
    /// OCR backend was present but errored.
    OcrFailed,
}

impl IngestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::OkLocal => "ok_local",
            Self::NonReceipt => "non_receipt",
            Self::RouteFailed => "route_failed",
            Self::StoredRawImage => "stored_raw_image",
            Self::OcrFailed => "ocr_failed",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReceiptMerchant {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptInfo {
    pub id: String,
    pub merchant: ReceiptMerchant,
    /// ISO-8601 timestamp string.
    pub datetime: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
}

fn default_currency() -> String {
    "EUR".to_string()
}

/// How a line item got its category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItemClassification {
    #[serde(default = "default_engine")]
    pub engine: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

fn default_engine() -> String {
    "rules".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub line_id: String,
    pub name_raw: String,
    pub name_clean: String,
    pub tokens: Vec<String>,
    /// Stopword-filtered tokens joined with `_`; empty when none survive.
    pub name_norm: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vat_rate: Option<f64>,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub classification: LineItemClassification,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VatBreakdownItem {
    pub rate: f64,
    pub gross: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Totals {
    /// Absent when no line item carried a total. Never coerced to zero.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vat_breakdown: Vec<VatBreakdownItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provenance {
    pub source_type: SourceType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr_engine: Option<String>,
    pub parser: String,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingest_event_id: Option<String>,
}

/// The normalized, categorized, persisted representation of a receipt,
/// independent of source (text/OCR/structured).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalReceipt {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    pub receipt: ReceiptInfo,
    pub line_items: Vec<LineItem>,
    pub totals: Totals,
    pub provenance: Provenance,
}

fn default_schema_version() -> String {
    "1.0".to_string()
}

/// Receipt-likelihood verdict, as recorded in the ingest event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptDetection {
    pub is_receipt: bool,
    pub score: f64,
    /// Diagnostic string encoding the counts that produced the score.
    pub reason: String,
}

/// OCR metadata captured for image ingests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
    /// True when the caller supplied the text instead of the OCR backend.
    pub provided: bool,
}

/// Immutable audit record of one ingestion attempt. Written exactly once,
/// keyed by its own generated id, never overwritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestEvent {
    pub ingest_event_id: String,
    pub received_at: String,
    pub source_type: SourceType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
    pub status: IngestStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_text_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_receipt_json_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_image_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical_receipt_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection: Option<ReceiptDetection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr: Option<OcrInfo>,
    /// Base URL of the remote service that produced the canonical record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routed_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_error: Option<String>,
    /// Free-form confidence label carried over from structured payloads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured_confidence: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// What an ingest call hands back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct IngestResult {
    pub ingest_event_id: String,
    pub status: IngestStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_text_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_receipt_json_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_image_path: Option<String>,
    pub ingest_event_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical_receipt_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<CanonicalReceipt>,
}
