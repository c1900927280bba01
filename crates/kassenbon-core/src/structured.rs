//! Pre-structured receipt payloads (structured_receipt_v1)
//!
//! Upstream capture tools (app forms, third-party OCR) can hand over an
//! already-parsed receipt as JSON. Validation happens here, before the
//! payload ever reaches the canonicalization engine; heuristic line
//! parsing is skipped entirely for this path.

use serde::Deserialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StructuredMerchant {
    pub name: Option<String>,
    pub address: Option<String>,
    pub store_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StructuredItem {
    pub name: String,
    pub quantity: Option<f64>,
    pub unit_price: Option<f64>,
    pub total: Option<f64>,
    pub vat_rate: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StructuredVatLine {
    pub rate: f64,
    pub net: Option<f64>,
    pub vat: Option<f64>,
    /// Only lines stating a gross amount are carried into the canonical
    /// VAT breakdown.
    pub gross: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StructuredTotals {
    pub total: Option<f64>,
    #[serde(default)]
    pub vat: Vec<StructuredVatLine>,
    pub payment_method: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StructuredReceipt {
    #[serde(default)]
    pub merchant: StructuredMerchant,
    pub datetime: Option<String>,
    pub currency: Option<String>,
    #[serde(default)]
    pub items: Vec<StructuredItem>,
    #[serde(default)]
    pub totals: StructuredTotals,
    /// Free-form confidence label from the capture tool, echoed into the
    /// ingest event.
    pub confidence: Option<String>,
}

impl StructuredReceipt {
    /// Deserialize and validate a raw JSON payload. Wrong field types and
    /// missing or empty item names are validation errors, not parsing
    /// heuristics.
    pub fn from_value(payload: serde_json::Value) -> Result<Self> {
        let structured: StructuredReceipt = serde_json::from_value(payload)
            .map_err(|e| Error::Validation(format!("malformed receipt payload: {e}")))?;
        for (idx, item) in structured.items.iter().enumerate() {
            if item.name.trim().is_empty() {
                return Err(Error::Validation(format!(
                    "item {idx} has an empty name"
                )));
            }
        }
        Ok(structured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn valid_payload_passes() {
        let payload = json!({
            "merchant": {"name": "Kaufland", "store_id": "DE7450"},
            "datetime": "2025-12-29T12:07:00+01:00",
            "currency": "EUR",
            "items": [
                {"name": "KBio H-Milch", "quantity": 6, "unit_price": 1.25, "total": 7.50, "vat_rate": 0.07}
            ],
            "totals": {"total": 7.50, "vat": [{"rate": 0.07, "gross": 7.50}]},
            "confidence": "high"
        });
        let structured = StructuredReceipt::from_value(payload).unwrap();
        assert_eq!(structured.merchant.store_id.as_deref(), Some("DE7450"));
        assert_eq!(structured.items.len(), 1);
        assert_eq!(structured.totals.total, Some(7.50));
    }

    #[test]
    fn missing_item_name_is_a_validation_error() {
        let payload = json!({"items": [{"quantity": 1}]});
        let err = StructuredReceipt::from_value(payload).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn empty_item_name_is_a_validation_error() {
        let payload = json!({"items": [{"name": "  "}]});
        let err = StructuredReceipt::from_value(payload).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn wrong_field_type_is_a_validation_error() {
        let payload = json!({"items": [{"name": "Milch", "quantity": "six"}]});
        let err = StructuredReceipt::from_value(payload).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn empty_payload_defaults_everything() {
        let structured = StructuredReceipt::from_value(json!({})).unwrap();
        assert!(structured.items.is_empty());
        assert!(structured.merchant.name.is_none());
        assert!(structured.totals.total.is_none());
    }
}
