//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `ingest` - Ingestion commands (text, structured JSON, images)
//! - `inspect` - Read-only commands (detect, categorize, rules)

pub mod ingest;
pub mod inspect;

// Re-export command functions for main.rs
pub use ingest::*;
pub use inspect::*;

use std::fs;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use kassenbon_core::{DataPaths, IngestOrchestrator, RemoteCanonicalizer, RuleSet};

use crate::cli::Cli;

/// Resolve the data layout from --data-dir or the platform default.
pub fn data_paths(cli: &Cli) -> DataPaths {
    match &cli.data_dir {
        Some(root) => DataPaths::from_root(root),
        None => DataPaths::detect(),
    }
}

/// Load the rule set from the rules directory, falling back to the
/// embedded defaults when no documents have been installed there.
pub fn load_ruleset(paths: &DataPaths) -> Result<Arc<RuleSet>> {
    let ruleset = if paths.rules_dir.join("normalization.yml").exists() {
        tracing::debug!(rules_dir = %paths.rules_dir.display(), "loading installed rules");
        RuleSet::load_from_dir(&paths.rules_dir).with_context(|| {
            format!("Failed to load rules from {}", paths.rules_dir.display())
        })?
    } else {
        tracing::debug!("no installed rules, using embedded defaults");
        RuleSet::load_default().context("Failed to load embedded default rules")?
    };
    Ok(Arc::new(ruleset))
}

/// Build an orchestrator honoring the global remote/fallback flags.
pub fn orchestrator(cli: &Cli) -> Result<IngestOrchestrator> {
    let paths = data_paths(cli);
    let ruleset = load_ruleset(&paths)?;
    let mut orchestrator = IngestOrchestrator::new(paths, ruleset, &cli.tz)
        .context("Failed to set up data directories")?
        .with_local_fallback(!cli.no_fallback);

    if !cli.no_remote {
        if let Some(remote) = RemoteCanonicalizer::from_env() {
            orchestrator = orchestrator.with_remote(remote);
        }
    }
    Ok(orchestrator)
}

/// Read input from a file, or from stdin when no file is given.
pub fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
        }
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read stdin")?;
            Ok(buffer)
        }
    }
}
