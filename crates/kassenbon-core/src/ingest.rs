//! Ingest orchestration
//!
//! End-to-end pipeline for one capture: persist the raw artifact, score
//! receipt-likelihood, route to the remote canonicalization service with
//! local fallback, persist the canonical record, and write the immutable
//! ingest event. States per call:
//!
//! ```text
//! received -> detected -> { non_receipt
//!                         | routed_remote -> (ok | route_failed)
//!                         | routed_local (ok_local) }
//!          -> persisted -> logged
//! ```
//!
//! Every terminal state still writes exactly one event record. Correctness
//! under concurrency needs no locks: each call generates its own ids up
//! front and writes only to paths keyed by them.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::detect::detect_receipt;
use crate::engine::ReceiptEngine;
use crate::error::{Error, Result};
use crate::models::{
    CanonicalReceipt, IngestEvent, IngestResult, IngestStatus, OcrInfo, ReceiptDetection,
    SourceType,
};
use crate::ocr::OcrBackend;
use crate::paths::DataPaths;
use crate::remote::RemoteCanonicalizer;
use crate::rules::RuleSet;
use crate::storage::{persist_canonical_receipt, slug, write_json};
use crate::structured::StructuredReceipt;
use crate::tz::now_in;

pub struct IngestOrchestrator {
    paths: DataPaths,
    ruleset: Arc<RuleSet>,
    engine: ReceiptEngine,
    remote: Option<RemoteCanonicalizer>,
    ocr: Option<Arc<dyn OcrBackend>>,
    allow_local_fallback: bool,
    tz: String,
}

impl IngestOrchestrator {
    pub fn new(paths: DataPaths, ruleset: Arc<RuleSet>, tz: &str) -> Result<Self> {
        paths.ensure_dirs()?;
        let engine = ReceiptEngine::new(ruleset.clone(), tz);
        Ok(Self {
            paths,
            ruleset,
            engine,
            remote: None,
            ocr: None,
            allow_local_fallback: true,
            tz: tz.to_string(),
        })
    }

    /// Route receipt-likely text through this remote service first.
    pub fn with_remote(mut self, remote: RemoteCanonicalizer) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn with_ocr(mut self, ocr: Arc<dyn OcrBackend>) -> Self {
        self.ocr = Some(ocr);
        self
    }

    /// Disable local canonicalization when remote routing fails. The call
    /// then terminates in `route_failed` with no canonical record.
    pub fn with_local_fallback(mut self, allow: bool) -> Self {
        self.allow_local_fallback = allow;
        self
    }

    pub fn paths(&self) -> &DataPaths {
        &self.paths
    }

    pub fn engine(&self) -> &ReceiptEngine {
        &self.engine
    }

    /// Ingest free receipt text.
    pub async fn ingest_text(&self, text: &str, source_name: Option<&str>) -> Result<IngestResult> {
        let ingest_event_id = Uuid::new_v4().to_string();
        let received_at = now_in(&self.tz).to_rfc3339();

        let raw_text_path = self.paths.raw_text_path(&ingest_event_id);
        write_raw(&raw_text_path, text.as_bytes())?;

        let detection = detect_receipt(text, &self.ruleset);
        let outcome = self
            .route_or_fallback(text, &ingest_event_id, SourceType::Text, &detection)
            .await;

        let event = IngestEvent {
            ingest_event_id: ingest_event_id.clone(),
            received_at,
            source_type: SourceType::Text,
            source_name: source_name.map(str::to_string),
            status: outcome.status,
            raw_text_path: Some(self.paths.rel(&raw_text_path)),
            raw_receipt_json_path: None,
            raw_image_path: None,
            canonical_receipt_path: outcome.canonical_path.as_deref().map(|p| self.paths.rel(p)),
            detection: Some(detection),
            ocr: None,
            routed_to: outcome.routed_to.clone(),
            route_error: outcome.route_error.clone(),
            structured_confidence: None,
            error: None,
        };
        let ingest_event_path = self.write_event(&event)?;

        info!(
            %ingest_event_id,
            status = event.status.as_str(),
            "text ingest complete"
        );
        Ok(self.result_from(event, ingest_event_path, outcome.receipt))
    }

    /// Ingest a pre-structured receipt payload. The raw payload is always
    /// persisted; validation failures are surfaced to the caller before
    /// canonicalization and produce no further artifacts.
    pub async fn ingest_structured(
        &self,
        payload: serde_json::Value,
        source_name: Option<&str>,
    ) -> Result<IngestResult> {
        let ingest_event_id = Uuid::new_v4().to_string();
        let received_at = now_in(&self.tz).to_rfc3339();

        let raw_json_path = self.paths.raw_json_path(&ingest_event_id);
        write_json(&raw_json_path, &payload)?;

        let structured = StructuredReceipt::from_value(payload)?;
        let receipt = self
            .engine
            .canonicalize_structured(&structured, Some(&ingest_event_id));
        let canonical_path = persist_canonical_receipt(&self.paths.canonical_dir, &receipt)?;

        let event = IngestEvent {
            ingest_event_id: ingest_event_id.clone(),
            received_at,
            source_type: SourceType::ReceiptJson,
            source_name: source_name.map(str::to_string),
            status: IngestStatus::Ok,
            raw_text_path: None,
            raw_receipt_json_path: Some(self.paths.rel(&raw_json_path)),
            raw_image_path: None,
            canonical_receipt_path: Some(self.paths.rel(&canonical_path)),
            detection: None,
            ocr: None,
            routed_to: None,
            route_error: None,
            structured_confidence: structured.confidence.clone(),
            error: None,
        };
        let ingest_event_path = self.write_event(&event)?;

        info!(%ingest_event_id, "structured ingest complete");
        Ok(self.result_from(event, ingest_event_path, Some(receipt)))
    }

    /// Ingest an image. When no OCR text is provided by the caller, the
    /// configured backend is consulted; a missing backend stores the raw
    /// image (`stored_raw_image`), a failing backend terminates in
    /// `ocr_failed`. Both still write the event record.
    pub async fn ingest_image(
        &self,
        image_bytes: &[u8],
        filename: Option<&str>,
        ocr_text: Option<&str>,
        source_name: Option<&str>,
    ) -> Result<IngestResult> {
        let ingest_event_id = Uuid::new_v4().to_string();
        let received_at = now_in(&self.tz).to_rfc3339();

        let (stem, suffix) = image_name_parts(filename);
        let raw_image_path = self.paths.raw_image_path(&ingest_event_id, &stem, &suffix);
        write_raw(&raw_image_path, image_bytes)?;

        let provided = ocr_text.is_some();
        let (text, ocr_engine) = match ocr_text {
            Some(text) => (text.to_string(), None),
            None => match self.run_ocr(&raw_image_path).await {
                Ok((text, engine)) => (text, Some(engine)),
                Err(err) => {
                    let status = match &err {
                        Error::OcrUnavailable(_) => IngestStatus::StoredRawImage,
                        _ => IngestStatus::OcrFailed,
                    };
                    warn!(%ingest_event_id, %err, "image ingest stopped before text");
                    let event = IngestEvent {
                        ingest_event_id: ingest_event_id.clone(),
                        received_at,
                        source_type: SourceType::Image,
                        source_name: source_name.map(str::to_string),
                        status,
                        raw_text_path: None,
                        raw_receipt_json_path: None,
                        raw_image_path: Some(self.paths.rel(&raw_image_path)),
                        canonical_receipt_path: None,
                        detection: None,
                        ocr: None,
                        routed_to: None,
                        route_error: None,
                        structured_confidence: None,
                        error: Some(err.to_string()),
                    };
                    let ingest_event_path = self.write_event(&event)?;
                    return Ok(self.result_from(event, ingest_event_path, None));
                }
            },
        };

        let raw_text_path = self.paths.raw_text_path(&ingest_event_id);
        write_raw(&raw_text_path, text.as_bytes())?;

        let detection = detect_receipt(&text, &self.ruleset);
        let outcome = self
            .route_or_fallback(&text, &ingest_event_id, SourceType::Image, &detection)
            .await;

        let event = IngestEvent {
            ingest_event_id: ingest_event_id.clone(),
            received_at,
            source_type: SourceType::Image,
            source_name: source_name.map(str::to_string),
            status: outcome.status,
            raw_text_path: Some(self.paths.rel(&raw_text_path)),
            raw_receipt_json_path: None,
            raw_image_path: Some(self.paths.rel(&raw_image_path)),
            canonical_receipt_path: outcome.canonical_path.as_deref().map(|p| self.paths.rel(p)),
            detection: Some(detection),
            ocr: Some(OcrInfo {
                engine: ocr_engine,
                provided,
            }),
            routed_to: outcome.routed_to.clone(),
            route_error: outcome.route_error.clone(),
            structured_confidence: None,
            error: None,
        };
        let ingest_event_path = self.write_event(&event)?;

        info!(
            %ingest_event_id,
            status = event.status.as_str(),
            "image ingest complete"
        );
        Ok(self.result_from(event, ingest_event_path, outcome.receipt))
    }

    async fn run_ocr(&self, image_path: &Path) -> Result<(String, String)> {
        let Some(backend) = &self.ocr else {
            return Err(Error::OcrUnavailable(
                "no OCR backend configured".to_string(),
            ));
        };
        let text = backend.extract_text(image_path).await?;
        Ok((text, backend.name().to_string()))
    }

    async fn route_or_fallback(
        &self,
        text: &str,
        ingest_event_id: &str,
        source_type: SourceType,
        detection: &ReceiptDetection,
    ) -> RouteOutcome {
        if !detection.is_receipt {
            return RouteOutcome::terminal(IngestStatus::NonReceipt);
        }

        if let Some(remote) = &self.remote {
            match remote
                .canonicalize_text(text, source_type, ingest_event_id)
                .await
            {
                Ok(response) => {
                    return RouteOutcome {
                        status: IngestStatus::Ok,
                        receipt: Some(response.receipt),
                        canonical_path: Some(self.paths.abs(&response.canonical_receipt_path)),
                        routed_to: Some(remote.base_url().to_string()),
                        route_error: None,
                    };
                }
                Err(err) => {
                    warn!(%ingest_event_id, %err, "remote canonicalization failed");
                    if !self.allow_local_fallback {
                        return RouteOutcome {
                            status: IngestStatus::RouteFailed,
                            receipt: None,
                            canonical_path: None,
                            routed_to: None,
                            route_error: Some(err.to_string()),
                        };
                    }
                }
            }
        }

        match self.canonicalize_locally(text, ingest_event_id, source_type) {
            Ok((receipt, canonical_path)) => RouteOutcome {
                status: IngestStatus::OkLocal,
                receipt: Some(receipt),
                canonical_path: Some(canonical_path),
                routed_to: None,
                route_error: None,
            },
            Err(err) => {
                // Local persistence failure: still reach a terminal state
                // so the event record can say what happened.
                warn!(%ingest_event_id, %err, "local canonicalization failed");
                RouteOutcome {
                    status: IngestStatus::RouteFailed,
                    receipt: None,
                    canonical_path: None,
                    routed_to: None,
                    route_error: Some(err.to_string()),
                }
            }
        }
    }

    fn canonicalize_locally(
        &self,
        text: &str,
        ingest_event_id: &str,
        source_type: SourceType,
    ) -> Result<(CanonicalReceipt, PathBuf)> {
        let receipt = self
            .engine
            .canonicalize_text(text, source_type, Some(ingest_event_id));
        let path = persist_canonical_receipt(&self.paths.canonical_dir, &receipt)?;
        Ok((receipt, path))
    }

    fn write_event(&self, event: &IngestEvent) -> Result<PathBuf> {
        let path = self.paths.ingest_event_path(&event.ingest_event_id);
        write_json(&path, event)?;
        Ok(path)
    }

    fn result_from(
        &self,
        event: IngestEvent,
        ingest_event_path: PathBuf,
        receipt: Option<CanonicalReceipt>,
    ) -> IngestResult {
        IngestResult {
            ingest_event_id: event.ingest_event_id,
            status: event.status,
            raw_text_path: event.raw_text_path,
            raw_receipt_json_path: event.raw_receipt_json_path,
            raw_image_path: event.raw_image_path,
            ingest_event_path: self.paths.rel(&ingest_event_path),
            canonical_receipt_path: event.canonical_receipt_path,
            receipt,
        }
    }
}

struct RouteOutcome {
    status: IngestStatus,
    receipt: Option<CanonicalReceipt>,
    canonical_path: Option<PathBuf>,
    routed_to: Option<String>,
    route_error: Option<String>,
}

impl RouteOutcome {
    fn terminal(status: IngestStatus) -> Self {
        Self {
            status,
            receipt: None,
            canonical_path: None,
            routed_to: None,
            route_error: None,
        }
    }
}

fn write_raw(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;
    Ok(())
}

/// Safe image filename parts: slugged stem, original suffix (default .jpg).
fn image_name_parts(filename: Option<&str>) -> (String, String) {
    let original = Path::new(filename.unwrap_or("image.jpg"));
    let stem = original
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "image".to_string());
    let suffix = original
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_else(|| ".jpg".to_string());
    (slug(&stem), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_name_parts_slugs_and_defaults() {
        assert_eq!(
            image_name_parts(Some("Kassen Bon 2025!.png")),
            ("kassen_bon_2025".to_string(), ".png".to_string())
        );
        assert_eq!(
            image_name_parts(None),
            ("image".to_string(), ".jpg".to_string())
        );
        assert_eq!(
            image_name_parts(Some("noext")),
            ("noext".to_string(), ".jpg".to_string())
        );
    }
}
