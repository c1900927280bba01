//! Heuristic line parser for German receipt text
//!
//! Splits raw text into candidate item lines with quantity/price
//! extraction and pulls out a date/time hint. Parsing never fails: a line
//! with no recognizable amount is still emitted as a bare name.

use chrono::{DateTime, FixedOffset};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::tz::datetime_in;

/// One candidate item line. Never persisted directly; the engine turns
/// these into line items.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLine {
    pub name_raw: String,
    pub quantity: Option<f64>,
    pub unit_price: Option<f64>,
    pub total: Option<f64>,
}

impl ParsedLine {
    fn bare(name_raw: &str) -> Self {
        Self {
            name_raw: name_raw.to_string(),
            quantity: None,
            unit_price: None,
            total: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParsedReceipt {
    /// First non-empty line, truncated to 80 characters.
    pub merchant_name_hint: Option<String>,
    pub datetime_hint: Option<DateTime<FixedOffset>>,
    pub lines: Vec<ParsedLine>,
}

static DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{2})[./-](\d{2})[./-](\d{4})\b").unwrap());
static TIME: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{2}):(\d{2})\b").unwrap());
static PRICE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?P<price>\d+[.,]\d{2})\s*$").unwrap());
static QUANTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?P<qty>\d+(?:[.,]\d+)?)\s*[x*]\s*$").unwrap());

/// Summary/total/VAT/payment markers. Lines containing any of these are
/// not item candidates.
const NOISE_MARKERS: &[&str] = &[
    "summe", "gesamt", "total", "mwst", "ust", "steuern", "bar", "karte", "ec", "visa",
];

pub fn parse_receipt_text(text: &str, tz: &str) -> ParsedReceipt {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|ln| !ln.is_empty())
        .collect();

    let datetime_hint = parse_datetime_hint(text, tz);
    let merchant_name_hint = lines
        .first()
        .map(|first| first.chars().take(80).collect::<String>());

    let parsed_lines = lines
        .iter()
        .filter(|ln| !is_noise_line(ln))
        .map(|ln| parse_line(ln))
        .collect();

    ParsedReceipt {
        merchant_name_hint,
        datetime_hint,
        lines: parsed_lines,
    }
}

/// First DD.MM.YYYY-style date anywhere in the text, combined with the
/// first HH:MM if present (midnight otherwise).
fn parse_datetime_hint(text: &str, tz: &str) -> Option<DateTime<FixedOffset>> {
    let date = DATE.captures(text)?;
    let day: u32 = date[1].parse().ok()?;
    let month: u32 = date[2].parse().ok()?;
    let year: i32 = date[3].parse().ok()?;

    let (hour, minute) = match TIME.captures(text) {
        Some(time) => (time[1].parse().ok()?, time[2].parse().ok()?),
        None => (0, 0),
    };

    datetime_in(tz, year, month, day, hour, minute)
}

fn is_noise_line(line: &str) -> bool {
    let lower = line.to_lowercase();
    NOISE_MARKERS.iter().any(|marker| lower.contains(marker))
}

fn parse_line(line: &str) -> ParsedLine {
    let Some(price_match) = PRICE.captures(line) else {
        return ParsedLine::bare(line);
    };

    let price = parse_number(&price_match["price"]);
    let name_part = line[..price_match.get(0).unwrap().start()].trim();

    if let Some(qty_match) = QUANTITY.captures(name_part) {
        let quantity = parse_number(&qty_match["qty"]);
        let name = name_part[..qty_match.get(0).unwrap().start()].trim();
        if let (Some(quantity), Some(unit_price)) = (quantity, price) {
            return ParsedLine {
                name_raw: name.to_string(),
                quantity: Some(quantity),
                unit_price: Some(unit_price),
                total: Some(round2(quantity * unit_price)),
            };
        }
    }

    let name = if name_part.is_empty() { line } else { name_part };
    ParsedLine {
        name_raw: name.to_string(),
        quantity: Some(1.0),
        unit_price: price,
        total: price,
    }
}

/// German decimal notation: `.` is a thousands separator, `,` the decimal
/// point.
fn parse_number(value: &str) -> Option<f64> {
    value.trim().replace('.', "").replace(',', ".").parse().ok()
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_line_defaults_quantity_to_one() {
        let parsed = parse_receipt_text("Frosch Waschmittel 4,95", "Europe/Berlin");
        assert_eq!(parsed.lines.len(), 1);
        let line = &parsed.lines[0];
        assert_eq!(line.name_raw, "Frosch Waschmittel");
        assert_eq!(line.quantity, Some(1.0));
        assert_eq!(line.unit_price, Some(4.95));
        assert_eq!(line.total, Some(4.95));
    }

    #[test]
    fn trailing_quantity_pattern_computes_total() {
        let parsed = parse_receipt_text("Joghurt 2x 1,50", "Europe/Berlin");
        let line = &parsed.lines[0];
        assert_eq!(line.name_raw, "Joghurt");
        assert_eq!(line.quantity, Some(2.0));
        assert_eq!(line.unit_price, Some(1.5));
        assert_eq!(line.total, Some(3.0));
    }

    #[test]
    fn fractional_quantity_with_comma_decimal() {
        let parsed = parse_receipt_text("Hackfleisch 0,5x 7,98", "Europe/Berlin");
        let line = &parsed.lines[0];
        assert_eq!(line.quantity, Some(0.5));
        assert_eq!(line.total, Some(3.99));
    }

    #[test]
    fn asterisk_quantity_marker() {
        let parsed = parse_receipt_text("Brezel 3* 0,79", "Europe/Berlin");
        let line = &parsed.lines[0];
        assert_eq!(line.name_raw, "Brezel");
        assert_eq!(line.quantity, Some(3.0));
        assert_eq!(line.total, Some(2.37));
    }

    #[test]
    fn line_without_amount_is_emitted_bare() {
        let parsed = parse_receipt_text("Kundenkarte vorgelegt", "Europe/Berlin");
        let line = &parsed.lines[0];
        assert_eq!(line.name_raw, "Kundenkarte vorgelegt");
        assert!(line.quantity.is_none());
        assert!(line.unit_price.is_none());
        assert!(line.total.is_none());
    }

    #[test]
    fn dot_in_amount_is_treated_as_thousands_separator() {
        // German convention: comma is the decimal point, dot groups
        // thousands. "4.95" therefore reads as 495.
        let parsed = parse_receipt_text("Irgendwas 4.95", "Europe/Berlin");
        assert_eq!(parsed.lines[0].total, Some(495.0));
    }

    #[test]
    fn noise_lines_are_skipped_but_still_feed_the_merchant_hint() {
        let text = "Kaufland\n29.12.2025 12:07\nWaschmittel 2,99\nSumme 2,99\nEC-Karte";
        let parsed = parse_receipt_text(text, "Europe/Berlin");
        assert_eq!(parsed.merchant_name_hint.as_deref(), Some("Kaufland"));
        // "Summe" and "EC" lines are noise; the date line survives as a
        // bare name since it carries no trailing amount.
        let names: Vec<&str> = parsed.lines.iter().map(|l| l.name_raw.as_str()).collect();
        assert!(names.contains(&"Waschmittel"));
        assert!(!names.iter().any(|n| n.contains("Summe")));
        assert!(!names.iter().any(|n| n.contains("EC")));
    }

    #[test]
    fn date_and_time_hint_in_configured_zone() {
        let text = "Kaufland\n29.12.2025 12:07\nWaschmittel 2,99";
        let parsed = parse_receipt_text(text, "Europe/Berlin");
        let dt = parsed.datetime_hint.unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-12-29T12:07:00+01:00");
    }

    #[test]
    fn date_without_time_defaults_to_midnight() {
        let parsed = parse_receipt_text("Beleg vom 01/02/2024", "Europe/Berlin");
        let dt = parsed.datetime_hint.unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-02-01T00:00:00+01:00");
    }

    #[test]
    fn no_date_means_no_hint() {
        let parsed = parse_receipt_text("Waschmittel 2,99", "Europe/Berlin");
        assert!(parsed.datetime_hint.is_none());
    }

    #[test]
    fn invalid_calendar_date_means_no_hint() {
        let parsed = parse_receipt_text("Beleg vom 31.02.2024", "Europe/Berlin");
        assert!(parsed.datetime_hint.is_none());
    }

    #[test]
    fn merchant_hint_is_truncated_to_80_chars() {
        let long = "X".repeat(120);
        let parsed = parse_receipt_text(&long, "Europe/Berlin");
        assert_eq!(parsed.merchant_name_hint.as_ref().unwrap().len(), 80);
    }

    #[test]
    fn empty_text_has_no_hint_and_no_lines() {
        let parsed = parse_receipt_text("\n  \n", "Europe/Berlin");
        assert!(parsed.merchant_name_hint.is_none());
        assert!(parsed.lines.is_empty());
    }

    #[test]
    fn line_order_is_preserved() {
        let text = "A 1,00\nB 2,00\nC 3,00";
        let parsed = parse_receipt_text(text, "Europe/Berlin");
        let names: Vec<&str> = parsed.lines.iter().map(|l| l.name_raw.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }
}
