//! Item name normalization
//!
//! `clean_text` is the shared cleaning primitive used by the merchant
//! matcher and receipt detector as well: casefold, strip diacritics via
//! NFKD decomposition, squeeze every non-alphanumeric run to a single
//! space. It is deterministic and idempotent.

use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::NormalizationRules;

/// Result of normalizing a raw item name against the normalization rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedName {
    /// Cleaned text after synonym substitution.
    pub name_clean: String,
    /// Tokens surviving the stopword filter, in order.
    pub tokens: Vec<String>,
    /// Tokens joined with `_`; empty when none survive.
    pub name_norm: String,
}

/// Casefold, decompose, strip combining marks, squeeze non-alphanumeric
/// runs to single spaces, trim.
pub fn clean_text(value: &str) -> String {
    let decomposed: String = value
        .to_lowercase()
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect();

    decomposed
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split cleaned text on spaces, dropping empty tokens.
pub fn tokenize(clean_value: &str) -> Vec<String> {
    clean_value
        .split(' ')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Clean a raw name, apply synonym substitutions in document order, then
/// tokenize and drop stopwords.
pub fn normalize_name(name_raw: &str, rules: &NormalizationRules) -> NormalizedName {
    let cleaned = clean_text(name_raw);
    let name_clean = apply_synonyms(&cleaned, rules);

    let tokens: Vec<String> = tokenize(&name_clean)
        .into_iter()
        .filter(|t| !rules.stopwords.contains(t))
        .collect();

    let name_norm = tokens.join("_");
    NormalizedName {
        name_clean,
        tokens,
        name_norm,
    }
}

/// Whole-phrase substitution: each synonym key matches only at word
/// boundaries, with its parts separated by arbitrary whitespace.
fn apply_synonyms(name_clean: &str, rules: &NormalizationRules) -> String {
    let mut out = name_clean.to_string();
    for (raw_key, raw_value) in &rules.synonyms {
        let key = clean_text(raw_key);
        let value = clean_text(raw_value);
        if key.is_empty() || value.is_empty() {
            continue;
        }
        let parts: Vec<String> = key.split(' ').map(regex::escape).collect();
        let pattern = format!(r"\b{}\b", parts.join(r"\s+"));
        // Escaped literal parts, so the pattern always compiles.
        if let Ok(re) = Regex::new(&pattern) {
            out = re.replace_all(&out, value.as_str()).into_owned();
        }
        out = out.split_whitespace().collect::<Vec<_>>().join(" ");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn rules(stopwords: &[&str], synonyms: &[(&str, &str)]) -> NormalizationRules {
        NormalizationRules {
            stopwords: stopwords.iter().map(|s| s.to_string()).collect::<HashSet<_>>(),
            synonyms: synonyms
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn clean_is_idempotent() {
        for input in ["  Frosch-Waschmittel 4,95 ", "KBio H-Milch", "über & drüber!!"] {
            let once = clean_text(input);
            assert_eq!(clean_text(&once), once);
        }
    }

    #[test]
    fn clean_is_case_insensitive() {
        assert_eq!(clean_text("ABC"), clean_text("abc"));
        assert_eq!(clean_text("Joghurt"), "joghurt");
    }

    #[test]
    fn clean_strips_diacritics() {
        assert_eq!(clean_text("Müsli"), "musli");
        assert_eq!(clean_text("Café"), "cafe");
    }

    #[test]
    fn clean_squeezes_punctuation_runs() {
        assert_eq!(clean_text("Frosch--Waschmittel!!4,95"), "frosch waschmittel 4 95");
    }

    #[test]
    fn tokenize_drops_empty_tokens() {
        assert_eq!(tokenize(""), Vec::<String>::new());
        assert_eq!(tokenize("a b"), vec!["a", "b"]);
    }

    #[test]
    fn normalize_applies_synonyms_and_stopwords() {
        let rules = rules(&["k", "kbio", "bio"], &[("h-milch", "milch")]);
        let n = normalize_name("KBio H-Milch", &rules);
        assert_eq!(n.name_clean, "kbio milch");
        assert_eq!(n.tokens, vec!["milch"]);
        assert_eq!(n.name_norm, "milch");
    }

    #[test]
    fn synonym_respects_word_boundaries() {
        let rules = rules(&[], &[("milch", "moo")]);
        let n = normalize_name("Milchreis", &rules);
        // "milch" is not a whole word inside "milchreis"
        assert_eq!(n.name_clean, "milchreis");
    }

    #[test]
    fn multi_word_synonym_matches_across_spaces() {
        let rules = rules(&[], &[("voll milch", "milch")]);
        let n = normalize_name("Voll  Milch 3,5%", &rules);
        assert!(n.name_clean.starts_with("milch"));
    }

    #[test]
    fn empty_name_norm_when_all_tokens_are_stopwords() {
        let rules = rules(&["bio"], &[]);
        let n = normalize_name("Bio", &rules);
        assert!(n.tokens.is_empty());
        assert_eq!(n.name_norm, "");
    }
}
