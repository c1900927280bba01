//! Category rule engine
//!
//! Evaluates the priority-ordered rule list against a normalized item.
//! First matching rule wins; a rule matches when any of its conditions
//! match. Failure to match is data, not an error: the item falls back to
//! the `"other"` category with no confidence.

use tracing::debug;

use super::{CategoryRule, CategoryRules, Condition};

/// Outcome of categorizing one item.
#[derive(Debug, Clone, PartialEq)]
pub struct Categorization {
    pub category: String,
    pub rule_id: Option<String>,
    pub confidence: Option<f64>,
    pub tags_add: Vec<String>,
}

impl Categorization {
    fn other() -> Self {
        Self {
            category: "other".to_string(),
            rule_id: None,
            confidence: None,
            tags_add: Vec::new(),
        }
    }
}

pub fn categorize(name_clean: &str, tokens: &[String], rules: &CategoryRules) -> Categorization {
    for rule in &rules.rules {
        if matches(rule, name_clean, tokens) {
            debug!(rule_id = %rule.id, category = %rule.category, "rule matched '{}'", name_clean);
            return Categorization {
                category: rule.category.clone(),
                rule_id: Some(rule.id.clone()),
                confidence: rule.confidence,
                tags_add: rule.tags_add.clone(),
            };
        }
    }
    Categorization::other()
}

fn matches(rule: &CategoryRule, name_clean: &str, tokens: &[String]) -> bool {
    rule.conditions.iter().any(|condition| match condition {
        Condition::Regex(re) => re.is_match(name_clean),
        Condition::ContainsAny(values) => values.iter().any(|v| {
            tokens.iter().any(|t| t == v) || (!v.is_empty() && name_clean.contains(v.as_str()))
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::tests::test_ruleset;

    fn toks(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn highest_priority_matching_rule_wins() {
        let ruleset = test_ruleset();
        // "pfand waschmittel" matches both deposit_pfand (200) and
        // household_detergent (90); the higher priority wins.
        let c = categorize(
            "pfand waschmittel",
            &toks(&["pfand", "waschmittel"]),
            &ruleset.categories,
        );
        assert_eq!(c.category, "groceries.deposit");
        assert_eq!(c.rule_id.as_deref(), Some("deposit_pfand"));
        assert_eq!(c.confidence, Some(0.99));
        assert_eq!(c.tags_add, vec!["deposit"]);
    }

    #[test]
    fn contains_any_matches_exact_token() {
        let ruleset = test_ruleset();
        let c = categorize("frosch citrus", &toks(&["frosch", "citrus"]), &ruleset.categories);
        assert_eq!(c.category, "household.cleaning");
        assert_eq!(c.confidence, Some(0.95));
    }

    #[test]
    fn contains_any_matches_substring_of_clean_name() {
        let ruleset = test_ruleset();
        // "pfandartikel" is not a configured token of the cleaned name's
        // token list here, but it is a substring match on name_clean.
        let c = categorize("leergut pfandartikel", &toks(&["leergut"]), &ruleset.categories);
        assert_eq!(c.category, "groceries.deposit");
    }

    #[test]
    fn regex_condition_matches_anywhere() {
        let ruleset = test_ruleset();
        let c = categorize("kiste pfand ruecknahme", &toks(&["kiste"]), &ruleset.categories);
        assert_eq!(c.rule_id.as_deref(), Some("deposit_pfand"));
    }

    #[test]
    fn no_match_falls_back_to_other() {
        let ruleset = test_ruleset();
        let c = categorize("apfel", &toks(&["apfel"]), &ruleset.categories);
        assert_eq!(c.category, "other");
        assert!(c.rule_id.is_none());
        assert!(c.confidence.is_none());
        assert!(c.tags_add.is_empty());
    }

    #[test]
    fn priority_ties_resolve_to_earliest_declared() {
        let ruleset = test_ruleset();
        // household_detergent and same_priority_first share priority 90;
        // an item matching both must resolve to the earlier declaration.
        let c = categorize("frosch zzz", &toks(&["frosch", "zzz"]), &ruleset.categories);
        assert_eq!(c.rule_id.as_deref(), Some("household_detergent"));
    }
}
