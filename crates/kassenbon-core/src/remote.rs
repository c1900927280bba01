//! Remote canonicalization client
//!
//! HTTP client for a remote receipt canonicalization service. The
//! orchestrator sends raw text plus the ingest event id for correlation
//! and, on success, trusts the remote's canonical record and path. A
//! single attempt, bounded by the configured timeout; any transport,
//! status, or decode failure is reported as a routing error and handled
//! by the caller's fallback policy.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{CanonicalReceipt, SourceType};

pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

#[derive(Clone)]
pub struct RemoteCanonicalizer {
    http_client: Client,
    base_url: String,
}

/// Request to the remote text-canonicalization endpoint.
#[derive(Debug, Serialize)]
struct CanonicalizeRequest<'a> {
    text: &'a str,
    source_type: &'a str,
    ingest_event_id: &'a str,
}

/// Response from the remote endpoint.
#[derive(Debug, Deserialize)]
pub struct CanonicalizeResponse {
    pub canonical_receipt_path: String,
    pub receipt: CanonicalReceipt,
}

impl RemoteCanonicalizer {
    /// Every request through this client is bounded by `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create from environment: `KASSENBON_RECEIPT_SERVICE_URL` and
    /// optional `KASSENBON_RECEIPT_SERVICE_TIMEOUT_S`. A client that
    /// cannot be built is reported and treated as not configured.
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("KASSENBON_RECEIPT_SERVICE_URL").ok()?;
        let timeout = std::env::var("KASSENBON_RECEIPT_SERVICE_TIMEOUT_S")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        match Self::new(&base_url, Duration::from_secs(timeout)) {
            Ok(client) => Some(client),
            Err(err) => {
                warn!(%err, "remote canonicalization client setup failed");
                None
            }
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn canonicalize_text(
        &self,
        text: &str,
        source_type: SourceType,
        ingest_event_id: &str,
    ) -> Result<CanonicalizeResponse> {
        let url = format!("{}/receipts/ingest_text", self.base_url);
        debug!(%url, ingest_event_id, "routing to remote canonicalization service");

        let response = self
            .http_client
            .post(&url)
            .json(&CanonicalizeRequest {
                text,
                source_type: source_type.as_str(),
                ingest_event_id,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Routing(format!("HTTP {status} from {url}: {body}")));
        }

        let parsed = response
            .json::<CanonicalizeResponse>()
            .await
            .map_err(|e| Error::Routing(format!("bad response from {url}: {e}")))?;
        Ok(parsed)
    }
}
