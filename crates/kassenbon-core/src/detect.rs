//! Receipt-likelihood scoring
//!
//! Decides whether arbitrary text is worth canonicalizing at all. A known
//! merchant is near-certain evidence; otherwise the score combines keyword
//! hints, price/percent density, and line count. The score gates the
//! pipeline, the reason string feeds the audit record.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::ReceiptDetection;
use crate::rules::merchants::detect_merchant;
use crate::rules::normalize::clean_text;
use crate::rules::RuleSet;

static PRICE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d+[.,]\d{2}\b").unwrap());
static PERCENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{1,2}\s*%").unwrap());

/// Receipt vocabulary: summary, VAT, cash register, card payment,
/// deposit markers.
const HINT_TOKENS: &[&str] = &[
    "summe",
    "gesamt",
    "mwst",
    "ust",
    "kasse",
    "bon",
    "kartenzahlung",
    "wechselgeld",
    "pfand",
    "ec",
    "karte",
    "visa",
    "mastercard",
];

const SCORE_THRESHOLD: f64 = 0.45;

pub fn detect_receipt(text: &str, ruleset: &RuleSet) -> ReceiptDetection {
    let cleaned = clean_text(text);
    if cleaned.is_empty() {
        return ReceiptDetection {
            is_receipt: false,
            score: 0.0,
            reason: "empty_text".to_string(),
        };
    }

    if let Some(merchant) = detect_merchant(text, &ruleset.merchants) {
        return ReceiptDetection {
            is_receipt: true,
            score: 0.95,
            reason: format!("merchant:{}", merchant.id),
        };
    }

    let hints = HINT_TOKENS
        .iter()
        .filter(|token| cleaned.contains(*token))
        .count();
    let prices = PRICE.find_iter(text).count();
    let percents = PERCENT.find_iter(text).count();
    let non_empty_lines = text.lines().filter(|ln| !ln.trim().is_empty()).count();
    // Saturates at ~40 lines.
    let line_score = f64::min(0.2, 0.2 * (non_empty_lines as f64 / 40.0));

    let score = f64::min(
        1.0,
        0.15 * hints as f64
            + 0.03 * prices as f64
            + 0.05 * usize::min(percents, 4) as f64
            + line_score,
    );

    ReceiptDetection {
        is_receipt: score >= SCORE_THRESHOLD,
        score,
        reason: format!(
            "hints={},prices={},percents={},lines={}",
            hints, prices, percents, non_empty_lines
        ),
    }
}
