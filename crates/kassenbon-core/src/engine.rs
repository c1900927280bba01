//! Canonicalization engine
//!
//! Composes the line parser, merchant matcher, normalizer, and category
//! rule engine into a canonical receipt record. Two entry paths: free
//! text (heuristic parsing) and pre-validated structured payloads. Both
//! always produce a record; uncertainty lands in confidence scores and
//! the "other" category, never in errors.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::models::{
    CanonicalReceipt, LineItem, LineItemClassification, Provenance, ReceiptInfo, ReceiptMerchant,
    SourceType, Totals, VatBreakdownItem,
};
use crate::parser::{parse_receipt_text, round2};
use crate::rules::categorize::categorize;
use crate::rules::merchants::detect_merchant;
use crate::rules::normalize::normalize_name;
use crate::rules::RuleSet;
use crate::structured::StructuredReceipt;
use crate::tz::now_in;

pub const TEXT_PARSER: &str = "de_receipt_v1";
pub const STRUCTURED_PARSER: &str = "structured_receipt_v1";

#[derive(Clone)]
pub struct ReceiptEngine {
    ruleset: Arc<RuleSet>,
    tz: String,
}

impl ReceiptEngine {
    pub fn new(ruleset: Arc<RuleSet>, tz: &str) -> Self {
        Self {
            ruleset,
            tz: tz.to_string(),
        }
    }

    pub fn ruleset(&self) -> &RuleSet {
        &self.ruleset
    }

    /// Canonicalize free receipt text: parse lines, detect the merchant,
    /// normalize and categorize every item.
    pub fn canonicalize_text(
        &self,
        text: &str,
        source_type: SourceType,
        ingest_event_id: Option<&str>,
    ) -> CanonicalReceipt {
        let parsed = parse_receipt_text(text, &self.tz);
        let merchant = detect_merchant(text, &self.ruleset.merchants);

        let datetime = parsed
            .datetime_hint
            .unwrap_or_else(|| now_in(&self.tz))
            .to_rfc3339();

        let line_items: Vec<LineItem> = parsed
            .lines
            .iter()
            .map(|line| {
                self.build_line_item(
                    &line.name_raw,
                    line.quantity,
                    line.unit_price,
                    line.total,
                    None,
                )
            })
            .collect();

        let merchant_name = merchant
            .and_then(|m| m.names.first().cloned())
            .or(parsed.merchant_name_hint);

        debug!(
            lines = line_items.len(),
            merchant = merchant.map(|m| m.id.as_str()).unwrap_or("-"),
            "canonicalized text receipt"
        );

        CanonicalReceipt {
            schema_version: "1.0".to_string(),
            receipt: ReceiptInfo {
                id: Uuid::new_v4().to_string(),
                merchant: ReceiptMerchant {
                    id: merchant.map(|m| m.id.clone()),
                    name: merchant_name,
                    store_id: None,
                },
                datetime,
                currency: "EUR".to_string(),
                payment_method: None,
            },
            totals: Totals {
                total: sum_totals(&line_items),
                vat_breakdown: Vec::new(),
            },
            line_items,
            provenance: Provenance {
                source_type,
                ocr_engine: None,
                parser: TEXT_PARSER.to_string(),
                created_at: now_in(&self.tz).to_rfc3339(),
                ingest_event_id: ingest_event_id.map(str::to_string),
            },
        }
    }

    /// Canonicalize an already-validated structured payload. Skips line
    /// parsing; normalization and categorization still run per item.
    pub fn canonicalize_structured(
        &self,
        structured: &StructuredReceipt,
        ingest_event_id: Option<&str>,
    ) -> CanonicalReceipt {
        let merchant_name = structured.merchant.name.clone();
        let merchant_id = merchant_name
            .as_deref()
            .and_then(|name| detect_merchant(name, &self.ruleset.merchants))
            .map(|m| m.id.clone());

        let datetime = structured
            .datetime
            .clone()
            .unwrap_or_else(|| now_in(&self.tz).to_rfc3339());

        let line_items: Vec<LineItem> = structured
            .items
            .iter()
            .map(|item| {
                self.build_line_item(
                    &item.name,
                    item.quantity,
                    item.unit_price,
                    item.total,
                    item.vat_rate,
                )
            })
            .collect();

        // A stated total is trusted verbatim, even when it happens to
        // agree with the summed line totals.
        let total = structured.totals.total.or_else(|| sum_totals(&line_items));

        let vat_breakdown = structured
            .totals
            .vat
            .iter()
            .filter_map(|vat| {
                vat.gross.map(|gross| VatBreakdownItem {
                    rate: vat.rate,
                    gross,
                })
            })
            .collect();

        CanonicalReceipt {
            schema_version: "1.0".to_string(),
            receipt: ReceiptInfo {
                id: Uuid::new_v4().to_string(),
                merchant: ReceiptMerchant {
                    id: merchant_id,
                    name: merchant_name,
                    store_id: structured.merchant.store_id.clone(),
                },
                datetime,
                currency: structured
                    .currency
                    .clone()
                    .unwrap_or_else(|| "EUR".to_string()),
                payment_method: structured.totals.payment_method.clone(),
            },
            totals: Totals {
                total,
                vat_breakdown,
            },
            line_items,
            provenance: Provenance {
                source_type: SourceType::ReceiptJson,
                ocr_engine: None,
                parser: STRUCTURED_PARSER.to_string(),
                created_at: now_in(&self.tz).to_rfc3339(),
                ingest_event_id: ingest_event_id.map(str::to_string),
            },
        }
    }

    fn build_line_item(
        &self,
        name_raw: &str,
        quantity: Option<f64>,
        unit_price: Option<f64>,
        total: Option<f64>,
        vat_rate: Option<f64>,
    ) -> LineItem {
        let normalized = normalize_name(name_raw, &self.ruleset.normalization);
        let categorization = categorize(
            &normalized.name_clean,
            &normalized.tokens,
            &self.ruleset.categories,
        );

        LineItem {
            line_id: Uuid::new_v4().to_string(),
            name_raw: name_raw.to_string(),
            name_clean: normalized.name_clean,
            tokens: normalized.tokens,
            name_norm: normalized.name_norm,
            quantity,
            unit: None,
            unit_price,
            total,
            vat_rate,
            category: categorization.category,
            tags: categorization.tags_add,
            classification: LineItemClassification {
                engine: "rules".to_string(),
                rule_id: categorization.rule_id,
                confidence: categorization.confidence,
            },
        }
    }
}

/// Sum of line totals rounded to 2 decimals; absent when no line carries
/// a total.
fn sum_totals(line_items: &[LineItem]) -> Option<f64> {
    let totals: Vec<f64> = line_items.iter().filter_map(|li| li.total).collect();
    if totals.is_empty() {
        return None;
    }
    Some(round2(totals.iter().sum()))
}
