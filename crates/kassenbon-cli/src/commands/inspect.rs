//! Read-only inspection commands: detect, categorize, rules

use std::path::Path;

use anyhow::Result;
use kassenbon_core::{categorize, detect_receipt, normalize_name, Condition};

use crate::cli::Cli;

use super::{data_paths, load_ruleset, read_input};

pub fn cmd_detect(cli: &Cli, file: Option<&Path>) -> Result<()> {
    let text = read_input(file)?;
    let ruleset = load_ruleset(&data_paths(cli))?;

    let detection = detect_receipt(&text, &ruleset);
    tracing::debug!(
        score = detection.score,
        is_receipt = detection.is_receipt,
        "detection finished"
    );
    let verdict = if detection.is_receipt {
        "🧾 Looks like a receipt"
    } else {
        "🚫 Does not look like a receipt"
    };
    println!("{} (score {:.2})", verdict, detection.score);
    println!("   {}", detection.reason);
    Ok(())
}

pub fn cmd_categorize(cli: &Cli, name: &str) -> Result<()> {
    let ruleset = load_ruleset(&data_paths(cli))?;

    let normalized = normalize_name(name, &ruleset.normalization);
    let categorization = categorize(&normalized.name_clean, &normalized.tokens, &ruleset.categories);
    tracing::debug!(
        category = categorization.category.as_str(),
        rule_id = categorization.rule_id.as_deref(),
        "categorized item name"
    );

    println!("🏷️  {}", name);
    println!("   cleaned:    {}", normalized.name_clean);
    println!("   normalized: {}", normalized.name_norm);
    println!("   category:   {}", categorization.category);
    if let Some(rule_id) = &categorization.rule_id {
        println!("   rule:       {}", rule_id);
    }
    if let Some(confidence) = categorization.confidence {
        println!("   confidence: {:.2}", confidence);
    }
    if !categorization.tags_add.is_empty() {
        println!("   tags:       {}", categorization.tags_add.join(", "));
    }
    Ok(())
}

pub fn cmd_rules(cli: &Cli) -> Result<()> {
    let paths = data_paths(cli);
    let ruleset = load_ruleset(&paths)?;

    println!("📋 Rule set ({})", paths.rules_dir.display());
    println!(
        "   {} stopword(s), {} synonym(s)",
        ruleset.normalization.stopwords.len(),
        ruleset.normalization.synonyms.len()
    );

    println!("   {} merchant(s):", ruleset.merchants.merchants.len());
    for merchant in &ruleset.merchants.merchants {
        println!("     {:<12} {}", merchant.id, merchant.names.join(", "));
    }

    println!("   {} category rule(s):", ruleset.categories.rules.len());
    for rule in &ruleset.categories.rules {
        let kinds: Vec<&str> = rule
            .conditions
            .iter()
            .map(|c| match c {
                Condition::Regex(_) => "regex",
                Condition::ContainsAny(_) => "contains_any",
            })
            .collect();
        println!(
            "     [{:>4}] {:<24} -> {:<22} ({})",
            rule.priority,
            rule.id,
            rule.category,
            kinds.join("|")
        );
    }
    Ok(())
}
