//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::commands;

fn cli_with_data_dir(args: &[&str], data_dir: &std::path::Path) -> Cli {
    let mut full = vec!["kassenbon", "--data-dir", data_dir.to_str().unwrap()];
    full.extend_from_slice(args);
    Cli::parse_from(full)
}

// ========== Argument Parsing ==========

#[test]
fn parses_ingest_with_file_and_source() {
    let cli = Cli::parse_from(["kassenbon", "ingest", "--file", "bon.txt", "--source", "inbox"]);
    match cli.command {
        Commands::Ingest { file, source } => {
            assert_eq!(file.unwrap().to_str(), Some("bon.txt"));
            assert_eq!(source.as_deref(), Some("inbox"));
        }
        _ => panic!("expected ingest command"),
    }
}

#[test]
fn parses_global_flags() {
    let cli = Cli::parse_from([
        "kassenbon",
        "--no-remote",
        "--no-fallback",
        "--tz",
        "Europe/Vienna",
        "rules",
    ]);
    assert!(cli.no_remote);
    assert!(cli.no_fallback);
    assert_eq!(cli.tz, "Europe/Vienna");
    assert!(matches!(cli.command, Commands::Rules));
}

#[test]
fn categorize_takes_a_positional_name() {
    let cli = Cli::parse_from(["kassenbon", "categorize", "K-Bio H-Milch"]);
    match cli.command {
        Commands::Categorize { name } => assert_eq!(name, "K-Bio H-Milch"),
        _ => panic!("expected categorize command"),
    }
}

#[test]
fn ingest_image_requires_a_file() {
    let result = Cli::try_parse_from(["kassenbon", "ingest-image"]);
    assert!(result.is_err());
}

// ========== Command Execution ==========

#[tokio::test]
async fn ingest_text_file_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let bon = dir.path().join("bon.txt");
    std::fs::write(&bon, "KAUFLAND\n29.12.2025 12:07\nWaschmittel 2,99\nSUMME 2,99").unwrap();

    let cli = cli_with_data_dir(
        &["--no-remote", "ingest", "--file", bon.to_str().unwrap()],
        dir.path(),
    );

    let result = match &cli.command {
        Commands::Ingest { file, source } => {
            commands::cmd_ingest(&cli, file.as_deref(), source.as_deref()).await
        }
        _ => unreachable!(),
    };
    assert!(result.is_ok());
    assert!(dir.path().join("data/raw/ingest_events").read_dir().unwrap().count() == 1);
    assert!(dir.path().join("data/canonical/receipts/2025").is_dir());
}

#[test]
fn categorize_runs_against_embedded_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cli = cli_with_data_dir(&["categorize", "Frosch Waschmittel"], dir.path());
    match &cli.command {
        Commands::Categorize { name } => {
            assert!(commands::cmd_categorize(&cli, name).is_ok());
        }
        _ => unreachable!(),
    }
}

#[test]
fn detect_reads_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let bon = dir.path().join("bon.txt");
    std::fs::write(&bon, "SUMME 12,99\nMwSt 19%").unwrap();

    let cli = cli_with_data_dir(&["detect"], dir.path());
    assert!(commands::cmd_detect(&cli, Some(&bon)).is_ok());
}

#[test]
fn rules_command_lists_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cli = cli_with_data_dir(&["rules"], dir.path());
    assert!(commands::cmd_rules(&cli).is_ok());
}
