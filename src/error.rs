/*============================================================
  Synavera Project: Deb-Diff
  Module: debdiff_core::error
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Centralise Deb-Diff error types so index loading and report
    emission share one taxonomy and one set of exit codes.

  Security / Safety Notes:
    Errors expose index paths and line numbers only; field
    values are echoed verbatim solely for the failing field.

  Dependencies:
    thiserror for ergonomic error definitions.

  Operational Scope:
    Used across modules to propagate fatal load failures and
    consolidate exit codes for the binary entry point.

  Revision History:
    2026-03-02 COD  Derived taxonomy for index comparison.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Explicit error taxonomy with actionable context
    - No silent failure paths
    - Stable exit codes for operational tooling
============================================================*/

use std::io;
use std::process::ExitCode;

use thiserror::Error;

use crate::package_info::Side;

/// Result alias for Deb-Diff operations.
pub type Result<T> = std::result::Result<T, DiffError>;

/// Enumerates high-level error domains surfaced by Deb-Diff.
#[derive(Debug, Error)]
pub enum DiffError {
    #[error("Configuration: {0}")]
    Config(String),
    #[error("{side} index {path}: cannot open: {source}")]
    Source {
        side: Side,
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("{side} index {path}: cannot decompress: {source}")]
    Decompress {
        side: Side,
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("Index stream: {0}")]
    Stream(#[source] io::Error),
    #[error("Line {line}: field `{field}` has invalid value `{value}`")]
    FieldParse {
        line: usize,
        field: String,
        value: String,
    },
    #[error("{side} index {path}: {message}")]
    Parse {
        side: Side,
        path: String,
        message: String,
    },
    #[error("Filesystem: {0}")]
    Filesystem(String),
    #[error("Runtime: {0}")]
    Runtime(String),
}

impl DiffError {
    /// Map error category to a deterministic exit code.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            DiffError::Config(_) => ExitCode::from(20),
            DiffError::Source { .. } => ExitCode::from(40),
            DiffError::Decompress { .. } | DiffError::Stream(_) => ExitCode::from(41),
            DiffError::FieldParse { .. } | DiffError::Parse { .. } => ExitCode::from(42),
            DiffError::Filesystem(_) => ExitCode::from(43),
            DiffError::Runtime(_) => ExitCode::from(50),
        }
    }

    /// Attach the failing side and path to an error raised while parsing a stream.
    pub fn for_side(self, side: Side, path: &str) -> Self {
        match self {
            DiffError::Stream(source) => DiffError::Decompress {
                side,
                path: path.to_string(),
                source,
            },
            DiffError::FieldParse { .. } => DiffError::Parse {
                side,
                path: path.to_string(),
                message: self.to_string(),
            },
            other => other,
        }
    }
}
