/*============================================================
  Synavera Project: Deb-Diff
  Module: debdiff_core::report
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Render a matchup as the line-oriented comparison report and
    as a JSON summary document.

  Security / Safety Notes:
    Output is written to operator-controlled paths or stdout;
    no privileged operations are performed.

  Dependencies:
    serde/serde_json for the summary, chrono for its timestamp.

  Operational Scope:
    Consumed by mirroring scripts that fetch or prune the listed
    pool files.

  Revision History:
    2026-03-02 COD  Authored report writer and summary.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Deterministic ordering for reproducible reports
    - Explicit attribution of inputs in every report
============================================================*/

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::error::{DiffError, Result};
use crate::matchup::{Category, Matchup, Totals};

/// Leading repo path components kept in front of every record path.
pub const REPO_PREFIX_DEPTH: usize = 2;

/// Order in which categories are listed in a report.
const REPORT_ORDER: [Category; 3] = [Category::Added, Category::Common, Category::Removed];

/// Inputs that identify one comparison run.
#[derive(Debug, Clone, Serialize)]
pub struct ReportContext {
    pub new_source: String,
    pub old_source: String,
    pub repo_path: String,
}

/// Write header comments, one line per record of each shown category, then totals.
pub fn write_report<W: Write>(
    out: &mut W,
    matchup: &Matchup<'_>,
    context: &ReportContext,
    categories: &[Category],
) -> io::Result<()> {
    writeln!(
        out,
        "# Deb-diff matchup, version: {}",
        env!("CARGO_PKG_VERSION")
    )?;
    writeln!(
        out,
        "# new: {} old: {}",
        context.new_source, context.old_source
    )?;
    writeln!(out, "# repodir: {}", context.repo_path)?;

    let prefix = repo_prefix(&context.repo_path, REPO_PREFIX_DEPTH);
    let shown: Vec<Category> = REPORT_ORDER
        .into_iter()
        .filter(|category| categories.contains(category))
        .collect();

    for category in &shown {
        for record in matchup.records(*category) {
            writeln!(
                out,
                "{} {} {}",
                record.content_hash(),
                record.size_bytes(),
                join_prefix(&prefix, record.relative_path())
            )?;
        }
    }

    let totals = matchup.totals(&shown);
    for category in &shown {
        if let Some(total) = totals.get(*category) {
            writeln!(
                out,
                "# {category}: {} packages, {} ({} bytes)",
                total.records,
                format_bytes(total.bytes),
                total.bytes
            )?;
        }
    }
    out.flush()
}

/// First `depth` components of `repo_path`, without a leading separator.
/// Paths with fewer than `depth` components give an empty prefix.
pub fn repo_prefix(repo_path: &str, depth: usize) -> String {
    let segments: Vec<&str> = repo_path
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect();
    if segments.len() < depth {
        return String::new();
    }
    segments[..depth].join("/")
}

fn join_prefix(prefix: &str, relative_path: &str) -> String {
    if prefix.is_empty() {
        relative_path.to_string()
    } else {
        format!("{prefix}/{relative_path}")
    }
}

/// Render a byte count with binary units, e.g. `1.5 MiB`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

/// JSON document summarising one comparison.
#[derive(Debug, Serialize)]
pub struct SummaryDocument {
    pub metadata: SummaryMetadata,
    pub totals: Totals,
}

#[derive(Debug, Serialize)]
pub struct SummaryMetadata {
    pub generated_at: String,
    pub generated_by: String,
    #[serde(flatten)]
    pub context: ReportContext,
    pub new_records: usize,
    pub old_records: usize,
}

/// Summarise the requested categories of a matchup.
pub fn build_summary(
    matchup: &Matchup<'_>,
    context: &ReportContext,
    categories: &[Category],
) -> SummaryDocument {
    SummaryDocument {
        metadata: SummaryMetadata {
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            generated_by: format!("debdiff_core {}", env!("CARGO_PKG_VERSION")),
            context: context.clone(),
            new_records: matchup.new_markers().len(),
            old_records: matchup.old_markers().len(),
        },
        totals: matchup.totals(categories),
    }
}

/// Persist the summary to the given path.
pub fn write_summary(document: &SummaryDocument, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|err| {
            DiffError::Filesystem(format!(
                "Failed to create summary directory {}: {err}",
                parent.display()
            ))
        })?;
    }
    let file = File::create(path).map_err(|err| {
        DiffError::Filesystem(format!(
            "Failed to create summary file {}: {err}",
            path.display()
        ))
    })?;
    serde_json::to_writer_pretty(file, document).map_err(|err| {
        DiffError::Filesystem(format!("Failed to write summary {}: {err}", path.display()))
    })
}
