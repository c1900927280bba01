//! Test utilities for kassenbon-core
//!
//! A mock remote canonicalization service plus a scripted OCR backend,
//! used by integration tests and available to downstream crates via the
//! `test-utils` feature.

use std::net::SocketAddr;
use std::path::Path;

use axum::{extract::Json, http::StatusCode, routing::post, Router};
use serde::Deserialize;
use tokio::sync::oneshot;

use crate::error::{Error, Result};
use crate::models::{
    CanonicalReceipt, LineItem, LineItemClassification, Provenance, ReceiptInfo, ReceiptMerchant,
    SourceType, Totals,
};
use crate::ocr::OcrBackend;

/// Mock receipt canonicalization service.
///
/// Answers `POST /receipts/ingest_text` with a fixed canonical receipt so
/// tests can assert the remote routing path without a real service. Start
/// with [`start`](Self::start) for a healthy service or
/// [`start_failing`](Self::start_failing) for one that always answers 500.
pub struct MockReceiptService {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockReceiptService {
    pub async fn start() -> Self {
        Self::start_router(Router::new().route("/receipts/ingest_text", post(handle_ingest_text)))
            .await
    }

    pub async fn start_failing() -> Self {
        Self::start_router(Router::new().route("/receipts/ingest_text", post(handle_failure))).await
    }

    async fn start_router(app: Router) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Base URL for this mock service.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockReceiptService {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Debug, Deserialize)]
struct IngestTextRequest {
    #[allow(dead_code)]
    text: String,
    source_type: String,
    ingest_event_id: String,
}

async fn handle_ingest_text(Json(request): Json<IngestTextRequest>) -> Json<serde_json::Value> {
    let source_type = match request.source_type.as_str() {
        "image" => SourceType::Image,
        _ => SourceType::Text,
    };
    let receipt = CanonicalReceipt {
        schema_version: "1.0".to_string(),
        receipt: ReceiptInfo {
            id: format!("remote-{}", request.ingest_event_id),
            merchant: ReceiptMerchant {
                id: Some("mock_markt".to_string()),
                name: Some("Mock Markt".to_string()),
                store_id: None,
            },
            datetime: "2025-06-01T10:00:00+02:00".to_string(),
            currency: "EUR".to_string(),
            payment_method: None,
        },
        line_items: vec![LineItem {
            line_id: format!("line-{}", request.ingest_event_id),
            name_raw: "Testartikel".to_string(),
            name_clean: "testartikel".to_string(),
            tokens: vec!["testartikel".to_string()],
            name_norm: "testartikel".to_string(),
            quantity: Some(1.0),
            unit: None,
            unit_price: Some(1.99),
            total: Some(1.99),
            vat_rate: None,
            category: "other".to_string(),
            tags: vec![],
            classification: LineItemClassification {
                engine: "rules".to_string(),
                rule_id: None,
                confidence: None,
            },
        }],
        totals: Totals {
            total: Some(1.99),
            vat_breakdown: vec![],
        },
        provenance: Provenance {
            source_type,
            ocr_engine: None,
            parser: "remote_receipt_v1".to_string(),
            created_at: "2025-06-01T10:00:00+02:00".to_string(),
            ingest_event_id: Some(request.ingest_event_id.clone()),
        },
    };
    let path = format!(
        "data/canonical/receipts/2025/2025-06-01_mock_markt_remote-{}.json",
        request.ingest_event_id
    );
    Json(serde_json::json!({
        "canonical_receipt_path": path,
        "receipt": receipt,
    }))
}

async fn handle_failure() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "mock service down")
}

/// OCR backend that returns a fixed text, or a fixed failure.
pub struct ScriptedOcrBackend {
    text: Option<String>,
}

impl ScriptedOcrBackend {
    pub fn returning(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
        }
    }

    pub fn failing() -> Self {
        Self { text: None }
    }
}

#[async_trait::async_trait]
impl OcrBackend for ScriptedOcrBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn extract_text(&self, _image_path: &Path) -> Result<String> {
        match &self.text {
            Some(text) => Ok(text.clone()),
            None => Err(Error::OcrFailed("scripted extraction failure".to_string())),
        }
    }
}
