//! Kassenbon Core Library
//!
//! Shared functionality for the kassenbon receipt pipeline:
//! - Text normalization and merchant detection driven by YAML rule documents
//! - Priority-ordered line item categorization
//! - Heuristic German receipt text parsing (prices, quantities, date/time)
//! - Receipt-likelihood scoring for free text
//! - Canonicalization engine for raw text and pre-structured payloads
//! - Ingest orchestration with remote routing, local fallback, and
//!   idempotent event records
//! - File-based persistence with deterministic canonical paths

pub mod detect;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod models;
pub mod ocr;
pub mod parser;
pub mod paths;
pub mod remote;
pub mod rules;
pub mod storage;
pub mod structured;
pub mod tz;

/// Test utilities including the mock remote canonicalization service
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use detect::detect_receipt;
pub use engine::{ReceiptEngine, STRUCTURED_PARSER, TEXT_PARSER};
pub use error::{Error, Result};
pub use ingest::IngestOrchestrator;
pub use models::{
    CanonicalReceipt, IngestEvent, IngestResult, IngestStatus, LineItem, LineItemClassification,
    OcrInfo, Provenance, ReceiptDetection, ReceiptInfo, ReceiptMerchant, SourceType, Totals,
    VatBreakdownItem,
};
pub use ocr::OcrBackend;
pub use parser::{parse_receipt_text, ParsedLine, ParsedReceipt};
pub use paths::DataPaths;
pub use remote::{CanonicalizeResponse, RemoteCanonicalizer};
pub use rules::{
    categorize::{categorize, Categorization},
    merchants::detect_merchant,
    normalize::{clean_text, normalize_name, NormalizedName},
    Condition, Merchant, RuleSet,
};
pub use structured::StructuredReceipt;
