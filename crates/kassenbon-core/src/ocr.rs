//! OCR backend seam
//!
//! Image ingestion consumes OCR as a black box: image path in, raw text
//! out (lines ordered top-to-bottom, left-to-right by detected position).
//! The backend is optional infrastructure, not a hard dependency of
//! ingestion: an orchestrator without a backend stores raw images and
//! records the unavailability in the event, distinct from a per-call
//! extraction failure.

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;

/// A pluggable OCR engine. Implementations must return
/// [`Error::OcrFailed`](crate::error::Error::OcrFailed) for per-call
/// extraction errors; absence of any backend is represented by the
/// orchestrator holding no handle at all.
#[async_trait]
pub trait OcrBackend: Send + Sync {
    /// Engine identifier recorded in provenance and event records.
    fn name(&self) -> &str;

    /// Extract text from an image file.
    async fn extract_text(&self, image_path: &Path) -> Result<String>;
}
