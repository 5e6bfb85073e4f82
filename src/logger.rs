/*============================================================
  Synavera Project: Deb-Diff
  Module: debdiff_core::logger
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1
  ------------------------------------------------------------
  Purpose:
    Structured, append-only logging for index loads and the
    matchup, with an optional session log and integrity digest.

  Security / Safety Notes:
    Only paths, counts and field names are logged; package
    digests appear solely in debug entries.

  Dependencies:
    chrono for UTC stamps, sha2 for the session digest.

  Operational Scope:
    Shared by reference between the loader tasks and the entry
    point; writes are serialised through a mutex.

  Revision History:
    2026-03-02 COD  Adapted logger for Deb-Diff sessions.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Append-only logging with UTC timestamps
    - Deterministic formatting for auditability
    - Graceful error propagation on I/O failures
============================================================*/

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{SecondsFormat, Utc};
use sha2::{Digest, Sha256};

use crate::error::{DiffError, Result};

/// Structured log level for Deb-Diff events.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    Debug,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Debug => "DEBUG",
        }
    }
}

/// Shared logger emitting `{stamp} [LEVEL] [CODE] message` lines.
pub struct Logger {
    file: Option<Mutex<BufWriter<File>>>,
    path: Option<PathBuf>,
    verbose: bool,
    debug: bool,
}

impl Logger {
    /// Build a logger writing to stderr and, when `path` is set, to a file.
    pub fn new(path: Option<PathBuf>, verbose: bool, debug: bool) -> Result<Self> {
        let file = match path.as_deref() {
            Some(file_path) => Some(Mutex::new(BufWriter::new(open_log(file_path)?))),
            None => None,
        };
        Ok(Self {
            file,
            path,
            verbose,
            debug,
        })
    }

    /// Logger that only reports warnings and errors on stderr.
    pub fn quiet() -> Self {
        Self {
            file: None,
            path: None,
            verbose: false,
            debug: false,
        }
    }

    pub fn log<S: AsRef<str>>(&self, level: LogLevel, code: &str, message: S) {
        if level == LogLevel::Debug && !self.debug {
            return;
        }
        let payload = format_entry(level, code, message.as_ref());

        if self.verbose || matches!(level, LogLevel::Error | LogLevel::Warn) {
            eprintln!("{payload}");
        }

        let Some(file) = &self.file else {
            return;
        };
        if let Ok(mut guard) = file.lock() {
            let written = writeln!(guard, "{payload}").and_then(|_| guard.flush());
            if written.is_err() {
                eprintln!(
                    "{}",
                    format_entry(LogLevel::Error, "LOGGER", "Failed to write to log file")
                );
            }
        }
    }

    pub fn info<S: AsRef<str>>(&self, code: &str, message: S) {
        self.log(LogLevel::Info, code, message);
    }

    pub fn warn<S: AsRef<str>>(&self, code: &str, message: S) {
        self.log(LogLevel::Warn, code, message);
    }

    pub fn error<S: AsRef<str>>(&self, code: &str, message: S) {
        self.log(LogLevel::Error, code, message);
    }

    pub fn debug<S: AsRef<str>>(&self, code: &str, message: S) {
        self.log(LogLevel::Debug, code, message);
    }

    /// Return the path backing this logger, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Write `<log>.hash` holding the SHA-256 of the session log.
    pub fn finalize(&self) -> Result<()> {
        let Some(path) = self.path() else {
            return Ok(());
        };
        let data = std::fs::read(path).map_err(|err| {
            DiffError::Filesystem(format!(
                "Failed to read log for hashing {}: {err}",
                path.display()
            ))
        })?;
        let digest = Sha256::digest(&data);
        let mut hash_os = path.as_os_str().to_os_string();
        hash_os.push(".hash");
        let hash_path = PathBuf::from(hash_os);
        let line = format!(
            "{:x}  {}\n",
            digest,
            path.file_name().unwrap_or_default().to_string_lossy()
        );
        std::fs::write(&hash_path, line).map_err(|err| {
            DiffError::Filesystem(format!(
                "Failed to write hash file {}: {err}",
                hash_path.display()
            ))
        })
    }
}

fn open_log(file_path: &Path) -> Result<File> {
    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent).map_err(|err| {
            DiffError::Filesystem(format!(
                "Failed to create log directory {}: {err}",
                parent.display()
            ))
        })?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(file_path)
        .map_err(|err| {
            DiffError::Filesystem(format!(
                "Failed to open log file {}: {err}",
                file_path.display()
            ))
        })
}

fn format_entry(level: LogLevel, code: &str, message: &str) -> String {
    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    format!("{timestamp} [{}] [{code}] {message}", level.as_str())
}
