//! Rule documents: loading and strongly-typed rule sets
//!
//! Three YAML documents drive every heuristic in the pipeline:
//! `normalization.yml` (stopwords + synonyms), `merchants.yml` (known
//! merchants), `categories.yml` (priority-ordered categorization rules).
//!
//! Rules are loaded once at startup into an immutable [`RuleSet`] that is
//! shared read-only across all ingest calls. A malformed or missing
//! document is a fatal configuration error, never a per-request code path.
//! Reloading means constructing a new `RuleSet` and swapping the handle.

pub mod categorize;
pub mod merchants;
pub mod normalize;

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use regex::Regex;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Embedded default rule documents (compiled into the binary)
mod defaults {
    pub const NORMALIZATION: &str = include_str!("../../../../rules/normalization.yml");
    pub const MERCHANTS: &str = include_str!("../../../../rules/merchants.yml");
    pub const CATEGORIES: &str = include_str!("../../../../rules/categories.yml");
}

/// Stopwords and synonym substitutions for item name normalization.
#[derive(Debug, Clone)]
pub struct NormalizationRules {
    pub stopwords: HashSet<String>,
    /// (phrase, replacement) pairs in document order.
    pub synonyms: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct Merchant {
    pub id: String,
    pub names: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct MerchantRules {
    /// Ordered: first match wins.
    pub merchants: Vec<Merchant>,
}

/// A single condition of a category rule. Closed variant set so the
/// rule engine stays exhaustive.
#[derive(Debug, Clone)]
pub enum Condition {
    /// Matches when the pattern is found anywhere in the cleaned name.
    Regex(Regex),
    /// Matches when any value is an exact token or a substring of the
    /// cleaned name.
    ContainsAny(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct CategoryRule {
    pub id: String,
    pub priority: i64,
    pub conditions: Vec<Condition>,
    pub category: String,
    pub confidence: Option<f64>,
    pub tags_add: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CategoryRules {
    /// Sorted descending by priority at load time; ties keep document order.
    pub rules: Vec<CategoryRule>,
}

/// The combined normalization/merchant/category configuration driving all
/// heuristics. Immutable after load; share via `Arc<RuleSet>`.
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub normalization: NormalizationRules,
    pub merchants: MerchantRules,
    pub categories: CategoryRules,
}

impl RuleSet {
    /// Load the three rule documents from a rules directory.
    pub fn load_from_dir(rules_dir: &Path) -> Result<Self> {
        let normalization = read_doc(&rules_dir.join("normalization.yml"))?;
        let merchants = read_doc(&rules_dir.join("merchants.yml"))?;
        let categories = read_doc(&rules_dir.join("categories.yml"))?;
        Self::from_documents(&normalization, &merchants, &categories)
    }

    /// Build from the embedded default documents.
    pub fn load_default() -> Result<Self> {
        Self::from_documents(
            defaults::NORMALIZATION,
            defaults::MERCHANTS,
            defaults::CATEGORIES,
        )
    }

    /// Parse and compile the three YAML documents into a rule set.
    pub fn from_documents(normalization: &str, merchants: &str, categories: &str) -> Result<Self> {
        let normalization_doc: NormalizationDoc = serde_yaml::from_str(normalization)?;
        let merchants_doc: MerchantsDoc = serde_yaml::from_str(merchants)?;
        let categories_doc: CategoriesDoc = serde_yaml::from_str(categories)?;

        let normalization = NormalizationRules {
            stopwords: normalization_doc.stopwords.into_iter().collect(),
            synonyms: mapping_to_pairs(normalization_doc.synonyms)?,
        };

        let merchants = MerchantRules {
            merchants: merchants_doc
                .merchants
                .into_iter()
                .map(|m| Merchant {
                    id: m.id,
                    names: m.names,
                })
                .collect(),
        };

        let mut rules = Vec::with_capacity(categories_doc.rules.len());
        for raw in categories_doc.rules {
            let mut conditions = Vec::with_capacity(raw.when.any.len());
            for condition in raw.when.any {
                conditions.push(match condition {
                    RawCondition::Regex(pattern) => Condition::Regex(
                        Regex::new(&pattern).map_err(|e| {
                            Error::Config(format!("rule '{}': bad regex: {}", raw.id, e))
                        })?,
                    ),
                    RawCondition::ContainsAny(values) => Condition::ContainsAny(values),
                });
            }
            rules.push(CategoryRule {
                id: raw.id,
                priority: raw.priority,
                conditions,
                category: raw.then.category,
                confidence: raw.then.confidence,
                tags_add: raw.then.tags_add,
            });
        }
        // Stable sort: equal priorities keep their declaration order.
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));

        Ok(Self {
            normalization,
            merchants,
            categories: CategoryRules { rules },
        })
    }
}

fn read_doc(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(Error::Config(format!(
            "missing rule document: {}",
            path.display()
        )));
    }
    Ok(fs::read_to_string(path)?)
}

fn mapping_to_pairs(mapping: serde_yaml::Mapping) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::with_capacity(mapping.len());
    for (key, value) in mapping {
        let (Some(key), Some(value)) = (key.as_str(), value.as_str()) else {
            return Err(Error::Config(
                "synonyms must be a string -> string mapping".to_string(),
            ));
        };
        pairs.push((key.to_string(), value.to_string()));
    }
    Ok(pairs)
}

// Raw document shapes as they appear in YAML.

#[derive(Debug, Deserialize)]
struct NormalizationDoc {
    #[serde(default)]
    stopwords: Vec<String>,
    #[serde(default)]
    synonyms: serde_yaml::Mapping,
}

#[derive(Debug, Deserialize)]
struct MerchantsDoc {
    #[serde(default)]
    merchants: Vec<MerchantDoc>,
}

#[derive(Debug, Deserialize)]
struct MerchantDoc {
    id: String,
    #[serde(default)]
    names: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CategoriesDoc {
    #[serde(default)]
    rules: Vec<CategoryRuleDoc>,
}

#[derive(Debug, Deserialize)]
struct CategoryRuleDoc {
    id: String,
    #[serde(default)]
    priority: i64,
    #[serde(default)]
    when: WhenDoc,
    then: ThenDoc,
}

#[derive(Debug, Default, Deserialize)]
struct WhenDoc {
    #[serde(default, with = "serde_yaml::with::singleton_map_recursive")]
    any: Vec<RawCondition>,
}

#[derive(Debug, Deserialize)]
enum RawCondition {
    #[serde(rename = "regex")]
    Regex(String),
    #[serde(rename = "contains_any")]
    ContainsAny(Vec<String>),
}

#[derive(Debug, Deserialize)]
struct ThenDoc {
    #[serde(default = "default_category")]
    category: String,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    tags_add: Vec<String>,
}

fn default_category() -> String {
    "other".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NORMALIZATION: &str = "\
version: 1
stopwords: [k, kbio, bio]
synonyms:
  h-milch: milch
  voll milch: milch
";

    const MERCHANTS: &str = "\
version: 1
merchants:
  - id: kaufland
    names: [kaufland]
  - id: rewe
    names: [rewe, rewe city]
";

    const CATEGORIES: &str = "\
version: 1
rules:
  - id: deposit_pfand
    priority: 200
    when:
      any:
        - contains_any: [pfand, pfandartikel]
        - regex: \"\\\\bpfand\\\\b\"
    then:
      category: groceries.deposit
      tags_add: [deposit]
      confidence: 0.99
  - id: household_detergent
    priority: 90
    when:
      any:
        - contains_any: [waschmittel, reiniger, frosch]
    then:
      category: household.cleaning
      confidence: 0.95
  - id: same_priority_first
    priority: 90
    when:
      any:
        - contains_any: [zzz]
    then:
      category: first.declared
";

    pub(crate) fn test_ruleset() -> RuleSet {
        RuleSet::from_documents(NORMALIZATION, MERCHANTS, CATEGORIES).unwrap()
    }

    #[test]
    fn loads_and_sorts_by_priority_descending() {
        let ruleset = test_ruleset();
        let ids: Vec<&str> = ruleset
            .categories
            .rules
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(
            ids,
            vec!["deposit_pfand", "household_detergent", "same_priority_first"]
        );
    }

    #[test]
    fn synonyms_keep_document_order() {
        let ruleset = test_ruleset();
        assert_eq!(
            ruleset.normalization.synonyms,
            vec![
                ("h-milch".to_string(), "milch".to_string()),
                ("voll milch".to_string(), "milch".to_string()),
            ]
        );
    }

    #[test]
    fn bad_regex_is_a_config_error() {
        let categories = "\
rules:
  - id: broken
    when:
      any:
        - regex: \"(\"
    then:
      category: x
";
        let err = RuleSet::from_documents(NORMALIZATION, MERCHANTS, categories).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn non_mapping_document_fails_to_load() {
        let err = RuleSet::from_documents("- just\n- a\n- list\n", MERCHANTS, CATEGORIES)
            .unwrap_err();
        assert!(matches!(err, Error::Yaml(_)));
    }

    #[test]
    fn missing_document_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = RuleSet::load_from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn embedded_defaults_compile() {
        let ruleset = RuleSet::load_default().unwrap();
        assert!(!ruleset.merchants.merchants.is_empty());
        assert!(!ruleset.categories.rules.is_empty());
    }

    #[test]
    fn default_priority_is_zero_and_category_defaults_to_other() {
        let categories = "\
rules:
  - id: bare
    when:
      any:
        - contains_any: [x]
    then: {}
";
        let ruleset = RuleSet::from_documents(NORMALIZATION, MERCHANTS, categories).unwrap();
        let rule = &ruleset.categories.rules[0];
        assert_eq!(rule.priority, 0);
        assert_eq!(rule.category, "other");
        assert!(rule.confidence.is_none());
        assert!(rule.tags_add.is_empty());
    }
}
