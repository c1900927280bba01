//! Merchant detection over free text
//!
//! First configured merchant whose cleaned name appears as a contiguous
//! substring of the cleaned text wins. No scoring.

use super::normalize::clean_text;
use super::{Merchant, MerchantRules};

pub fn detect_merchant<'a>(text: &str, rules: &'a MerchantRules) -> Option<&'a Merchant> {
    let haystack = clean_text(text);
    for merchant in &rules.merchants {
        for name in &merchant.names {
            let needle = clean_text(name);
            if !needle.is_empty() && haystack.contains(&needle) {
                return Some(merchant);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> MerchantRules {
        MerchantRules {
            merchants: vec![
                Merchant {
                    id: "kaufland".to_string(),
                    names: vec!["kaufland".to_string()],
                },
                Merchant {
                    id: "rewe".to_string(),
                    names: vec!["rewe".to_string(), "rewe city".to_string()],
                },
            ],
        }
    }

    #[test]
    fn detects_merchant_in_free_text() {
        let rules = rules();
        let m = detect_merchant("KAUFLAND Filiale 7450\nSumme 12,70", &rules).unwrap();
        assert_eq!(m.id, "kaufland");
    }

    #[test]
    fn first_configured_merchant_wins() {
        // Text mentions both; kaufland is configured first.
        let rules = rules();
        let m = detect_merchant("rewe neben kaufland", &rules).unwrap();
        assert_eq!(m.id, "kaufland");
    }

    #[test]
    fn matching_survives_punctuation_and_case() {
        let rules = rules();
        let m = detect_merchant("REWE-City: Markt 42", &rules).unwrap();
        assert_eq!(m.id, "rewe");
    }

    #[test]
    fn no_match_returns_none() {
        assert!(detect_merchant("unbekannter laden", &rules()).is_none());
    }

    #[test]
    fn empty_configured_name_never_matches() {
        let rules = MerchantRules {
            merchants: vec![Merchant {
                id: "broken".to_string(),
                names: vec!["???".to_string()],
            }],
        };
        assert!(detect_merchant("anything at all", &rules).is_none());
    }
}
