//! CLI entry point for the Rubric Rater tool.
//!
//! Provides subcommands for importing rating spreadsheets against a rubric,
//! classifying score pairs into quadrants, correlating measures per scope, and
//! testing agreement between rater groups.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rubric_rater::analyzers::aggregate::{ImportRequest, aggregate_ratings};
use rubric_rater::analyzers::agreement::{all_group_pairs, compare_groups};
use rubric_rater::analyzers::analyzer::{
    analyze_quadrants, load_agreement_rows, load_ratings, load_score_pairs,
};
use rubric_rater::analyzers::correlation::correlate_by_scope;
use rubric_rater::analyzers::types::{
    GroupPair, ImportCommit, ImportMode, ImportResult, RatingEntry, Report,
};
use rubric_rater::config::Catalog;
use rubric_rater::output::{print_json, write_records};
use rubric_rater::parser::{TextEncoding, parse_table};
use rubric_rater::store::{ApplySummary, apply_commit};
use serde::Serialize;
use std::ffi::OsStr;
use std::path::Path;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "rubric_rater")]
#[command(about = "Import rubric ratings and analyze quiz scores", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Preview or commit a ratings spreadsheet against a rubric
    Import {
        /// Ratings CSV with a "Problem" column and one column per criterion
        #[arg(value_name = "FILE")]
        source: String,

        /// JSON file describing the rubric and problem bank
        #[arg(short, long)]
        catalog: String,

        /// Rater the imported ratings are recorded for
        #[arg(short, long, env = "RUBRIC_RATER_ID")]
        rater: String,

        /// Text encoding of the ratings file
        #[arg(short, long, value_enum, default_value_t = TextEncoding::Utf8)]
        encoding: TextEncoding,

        /// Write the ratings instead of previewing them
        #[arg(long, default_value_t = false)]
        commit: bool,

        /// CSV file holding stored ratings
        #[arg(short, long, default_value = "ratings.csv")]
        store: String,
    },
    /// Classify score pairs into quadrants by median split
    Quadrants {
        /// CSV with scope,subject,a,b columns
        #[arg(value_name = "SCORES")]
        scores: String,
    },
    /// Correlate the two measures within each scope
    Correlate {
        /// CSV with scope,subject,a,b columns
        #[arg(value_name = "SCORES")]
        scores: String,

        /// Optional CSV file to write the correlation records to
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Compare rater groups with a paired t-test per criterion
    Agreement {
        /// CSV with group,criterion,subject,value columns
        #[arg(value_name = "RATINGS")]
        ratings: String,

        /// Group pair to compare as FIRST:SECOND (repeatable; defaults to every pair)
        #[arg(short, long = "pair", value_parser = parse_group_pair)]
        pairs: Vec<GroupPair>,

        /// Optional CSV file to write the agreement records to
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[derive(Serialize)]
struct CommitOutcome<'a> {
    summary: ApplySummary,
    commit: &'a ImportCommit,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/rubric_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("rubric_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive(LevelFilter::INFO.into()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive(LevelFilter::DEBUG.into()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Import {
            source,
            catalog,
            rater,
            encoding,
            commit,
            store,
        } => {
            let mode = if commit {
                ImportMode::Commit
            } else {
                ImportMode::Preview
            };
            import(&source, &catalog, &rater, encoding, mode, &store)?;
        }
        Commands::Quadrants { scores } => {
            let pairs = load_score_pairs(&scores)?;
            let report = analyze_quadrants(&pairs);

            info!(
                masters = report.global.masters,
                implementers = report.global.implementers,
                conceptualizers = report.global.conceptualizers,
                strugglers = report.global.strugglers,
                scopes = report.scopes.len(),
                "Quadrant totals"
            );
            print_json(&Report::new(report))?;
        }
        Commands::Correlate { scores, output } => {
            let pairs = load_score_pairs(&scores)?;
            let records = correlate_by_scope(&pairs);

            info!(scopes = records.len(), "Correlation computed");
            if let Some(path) = output {
                write_records(&path, &records)?;
            }
            print_json(&Report::new(&records))?;
        }
        Commands::Agreement {
            ratings,
            pairs,
            output,
        } => {
            let rows = load_agreement_rows(&ratings)?;
            let pairs = if pairs.is_empty() {
                all_group_pairs(&rows)
            } else {
                pairs
            };
            let records = compare_groups(&rows, &pairs);

            info!(
                pairs = pairs.len(),
                records = records.len(),
                "Agreement computed"
            );
            if let Some(path) = output {
                write_records(&path, &records)?;
            }
            print_json(&Report::new(&records))?;
        }
    }

    Ok(())
}

/// Parses a ratings file, resolves it against the catalog and either prints the
/// preview or applies the ratings to the CSV store.
#[tracing::instrument(skip(catalog_path, store_path))]
fn import(
    source: &str,
    catalog_path: &str,
    rater: &str,
    encoding: TextEncoding,
    mode: ImportMode,
    store_path: &str,
) -> Result<()> {
    let bytes = std::fs::read(source).with_context(|| format!("failed to read '{source}'"))?;
    let table = parse_table(&bytes, encoding)?;
    let catalog = Catalog::load(catalog_path)?;

    let result = aggregate_ratings(&ImportRequest {
        table: &table,
        rubric: &catalog.rubric,
        bank: &catalog.bank,
        rater,
        mode,
    });

    match result {
        ImportResult::Preview(preview) => print_json(&preview)?,
        ImportResult::Commit(commit) => {
            let mut store = load_ratings(store_path)?;
            let summary = apply_commit(&mut store, &commit)?;

            let entries: Vec<RatingEntry> = store.entries().cloned().collect();
            write_records(store_path, &entries)?;
            info!(path = store_path, stored = entries.len(), "Rating store saved");

            print_json(&CommitOutcome {
                summary,
                commit: &commit,
            })?;
        }
    }

    Ok(())
}

fn parse_group_pair(s: &str) -> Result<GroupPair, String> {
    match s.split_once(':') {
        Some((first, second)) if !first.trim().is_empty() && !second.trim().is_empty() => {
            Ok(GroupPair::new(first.trim(), second.trim()))
        }
        _ => Err(format!("expected FIRST:SECOND, got '{s}'")),
    }
}
