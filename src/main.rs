/*============================================================
  Synavera Project: Deb-Diff
  Module: debdiff_core::main
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Entry point for Deb-Diff Core. Loads the new and old
    Packages.gz indexes, pairs their records, and reports the
    added, removed and common packages with byte totals.

  Security / Safety Notes:
    Operates within user privileges. Reads local index files
    and writes only the report, summary and log paths given.

  Dependencies:
    clap for CLI parsing, tokio for the concurrent loads,
    chrono for session stamps.

  Operational Scope:
    Invoked by mirroring jobs to decide which pool files must
    be fetched, kept or pruned between repository snapshots.

  Revision History:
    2026-03-02 COD  Authored Deb-Diff Core runtime.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Result-first error handling with deterministic exits
    - Structured logging following Synavera cadence
    - Configurable execution via CLI and config file
============================================================*/

mod config;
mod error;
mod index;
mod logger;
mod matchup;
mod package_info;
mod report;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use chrono::Utc;
use clap::{ArgAction, Parser};

use config::{DiffConfig, LoaderOptions, StanzaTermination, STRICT_MINIMUM_PATH_LENGTH};
use error::{DiffError, Result};
use index::load_index;
use logger::Logger;
use matchup::{matchup, Category};
use package_info::{PackageCollection, Side};
use report::{build_summary, write_report, write_summary, ReportContext};

/// Command-line arguments for Deb-Diff-Core.
#[derive(Debug, Parser)]
#[command(
    name = "Deb-Diff-Core",
    version,
    author = "Synavera Systems",
    about = "Compare two Packages.gz indexes for mirror planning"
)]
struct Cli {
    /// Newer Packages.gz file, or repository directory holding it.
    #[arg(long, value_name = "PATH", default_value = "NEW_Packages.gz")]
    new: String,
    /// Older Packages.gz file, or repository directory holding it.
    #[arg(long, value_name = "PATH", default_value = "OLD_Packages.gz")]
    old: String,
    /// Repository path used to prefix listed files.
    #[arg(long, value_name = "PATH")]
    repo: Option<String>,
    /// Report destination; `-` writes to stdout.
    #[arg(long, value_name = "PATH", default_value = "-")]
    output: String,
    /// List packages only present in the new index.
    #[arg(long, action = ArgAction::SetTrue)]
    show_added: bool,
    /// List packages only present in the old index.
    #[arg(long, action = ArgAction::SetTrue)]
    show_removed: bool,
    /// List packages present in both indexes.
    #[arg(long, action = ArgAction::SetTrue)]
    show_common: bool,
    /// Write a JSON summary of the shown categories.
    #[arg(long, value_name = "PATH")]
    summary: Option<PathBuf>,
    /// Require paths of at least six characters and end stanzas at stray lines.
    #[arg(long, action = ArgAction::SetTrue)]
    strict: bool,
    /// End stanzas at the first line that is not a field.
    #[arg(long, action = ArgAction::SetTrue)]
    field_run: bool,
    /// Include the Version field in package identity.
    #[arg(long, action = ArgAction::SetTrue)]
    capture_version: bool,
    /// Override configuration file path.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Explicit log file path.
    #[arg(long, value_name = "PATH")]
    log: Option<PathBuf>,
    /// Enable verbose logging to stderr.
    #[arg(long, action = ArgAction::SetTrue)]
    verbose: bool,
    /// Emit per-stanza debug entries.
    #[arg(long, action = ArgAction::SetTrue)]
    debug: bool,
}

impl Cli {
    fn categories(&self) -> Vec<Category> {
        [
            (self.show_added, Category::Added),
            (self.show_removed, Category::Removed),
            (self.show_common, Category::Common),
        ]
        .into_iter()
        .filter_map(|(shown, category)| shown.then_some(category))
        .collect()
    }

    fn loader_options(&self, config: &DiffConfig) -> Result<LoaderOptions> {
        let mut options = config.loader_options()?;
        if self.strict {
            options.minimum_path_length =
                options.minimum_path_length.max(STRICT_MINIMUM_PATH_LENGTH);
        }
        if self.strict || self.field_run {
            options.termination = StanzaTermination::FieldRun;
        }
        options.capture_version |= self.capture_version;
        options.debug_logging |= self.debug;
        Ok(options)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("[Deb-Diff-Core] {}", err);
            err.exit_code()
        }
    }
}

async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = DiffConfig::load_from_optional_path(cli.config.as_deref())?;
    let options = cli.loader_options(&config)?;

    let session_stamp = Utc::now().format("%Y-%m-%d_%H-%M-%S").to_string();
    let log_path = cli.log.clone().or_else(|| {
        config
            .log_dir
            .as_ref()
            .map(|_| config.log_dir().join(format!("diff_{session_stamp}.log")))
    });
    let logger = Arc::new(Logger::new(log_path, cli.verbose, options.debug_logging)?);
    logger.info("INIT", "Deb-Diff Core awakening.");

    let new_path = resolve_index_path(&cli.new, config.index_file_name());
    let old_path = resolve_index_path(&cli.old, config.index_file_name());

    let options = Arc::new(options);
    let new_task = spawn_load(new_path.clone(), Side::New, &options, &logger);
    let old_task = spawn_load(old_path.clone(), Side::Old, &options, &logger);
    let (new_records, old_records) = tokio::join!(new_task, old_task);
    let new_records = settle(new_records, &logger)?;
    let old_records = settle(old_records, &logger)?;

    logger.info("MATCHUP", "Doing matchups.");
    let result = matchup(&new_records, &old_records);
    let categories = cli.categories();

    let context = ReportContext {
        new_source: display_source(new_path.as_deref()),
        old_source: display_source(old_path.as_deref()),
        repo_path: cli
            .repo
            .clone()
            .unwrap_or_else(|| config.repo_path().to_string()),
    };

    let mut out = open_output(&cli.output)?;
    write_report(&mut out, &result, &context, &categories).map_err(|err| {
        DiffError::Filesystem(format!("Failed to write report to {}: {err}", cli.output))
    })?;

    if let Some(summary_path) = &cli.summary {
        write_summary(&build_summary(&result, &context, &categories), summary_path)?;
        logger.info(
            "SUMMARY",
            format!("Summary written to {}", summary_path.display()),
        );
    }

    let totals = result.totals(&Category::ALL);
    logger.info(
        "TOTALS",
        format!(
            "new={} old={} added={} removed={} common={}",
            new_records.len(),
            old_records.len(),
            totals.added.map_or(0, |t| t.records),
            totals.removed.map_or(0, |t| t.records),
            totals.common.map_or(0, |t| t.records),
        ),
    );
    logger.info("COMPLETE", "Indexes reconciled.");
    logger.finalize()?;

    Ok(ExitCode::SUCCESS)
}

/// Empty input means no index for that side; directories resolve to their index file.
fn resolve_index_path(input: &str, index_file_name: &str) -> Option<PathBuf> {
    if input.is_empty() {
        return None;
    }
    let path = PathBuf::from(input);
    if path.is_dir() {
        Some(path.join(index_file_name))
    } else {
        Some(path)
    }
}

fn display_source(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string()).unwrap_or_default()
}

fn spawn_load(
    path: Option<PathBuf>,
    side: Side,
    options: &Arc<LoaderOptions>,
    logger: &Arc<Logger>,
) -> tokio::task::JoinHandle<Result<PackageCollection>> {
    let options = Arc::clone(options);
    let logger = Arc::clone(logger);
    tokio::task::spawn_blocking(move || match path {
        Some(path) => load_index(&path, side, &options, &logger),
        None => {
            logger.warn("EMPTY", format!("No {side} index given; treating it as empty"));
            Ok(PackageCollection::new())
        }
    })
}

fn settle(
    joined: std::result::Result<Result<PackageCollection>, tokio::task::JoinError>,
    logger: &Logger,
) -> Result<PackageCollection> {
    let loaded = joined.map_err(|err| DiffError::Runtime(format!("Index load task failed: {err}")))?;
    loaded.map_err(|err| {
        logger.error("LOAD", err.to_string());
        err
    })
}

fn open_output(target: &str) -> Result<Box<dyn Write>> {
    if target == "-" {
        return Ok(Box::new(BufWriter::new(io::stdout().lock())));
    }
    let file = File::create(target).map_err(|err| {
        DiffError::Filesystem(format!("Failed to create output file {target}: {err}"))
    })?;
    Ok(Box::new(BufWriter::new(file)))
}
