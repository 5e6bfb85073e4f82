/*============================================================
  Synavera Project: Deb-Diff
  Module: debdiff_core::config
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Load operator configuration and derive the explicit loader
    options passed to every index parse.

  Security / Safety Notes:
    Reads a single TOML file from an operator-controlled path;
    no values are executed or expanded.

  Dependencies:
    serde + toml for parsing, dirs for XDG locations.

  Operational Scope:
    Resolved once at start-up; CLI flags override file values.

  Revision History:
    2026-03-02 COD  Authored configuration layer.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Explicit configuration values instead of ambient state
    - Validation before use
============================================================*/

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DiffError, Result};
use crate::package_info::HashAlgorithm;

/// Shortest path accepted by the strict admission rule.
pub const STRICT_MINIMUM_PATH_LENGTH: usize = 6;

const DEFAULT_INDEX_FILE: &str = "Packages.gz";
const DEFAULT_REPO_PATH: &str = "dists/Debian11.2/main/binary-amd64";

/// How a stanza is delimited from the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StanzaTermination {
    /// Only blank lines end a stanza; stray lines without a colon are skipped.
    #[default]
    BlankLine,
    /// A stanza is an unbroken run of field lines; any other line ends it.
    FieldRun,
}

/// Which of several hash fields in one stanza is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HashSelection {
    /// Last recognised field wins. Indexes list digests weakest first.
    #[default]
    LastSeen,
    /// Highest entry of the preference order wins regardless of position.
    Strongest,
}

/// Parser knobs passed into every index load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderOptions {
    /// Recognised hash fields, weakest first.
    pub hash_fields: Vec<HashAlgorithm>,
    pub hash_selection: HashSelection,
    pub minimum_path_length: usize,
    pub termination: StanzaTermination,
    /// Read `Version` into the record. Off keeps every version empty.
    pub capture_version: bool,
    pub debug_logging: bool,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            hash_fields: HashAlgorithm::ALL.to_vec(),
            hash_selection: HashSelection::default(),
            minimum_path_length: 1,
            termination: StanzaTermination::default(),
            capture_version: false,
            debug_logging: false,
        }
    }
}

impl LoaderOptions {
    /// Options matching the stricter tool variant.
    pub fn strict() -> Self {
        Self {
            minimum_path_length: STRICT_MINIMUM_PATH_LENGTH,
            termination: StanzaTermination::FieldRun,
            ..Self::default()
        }
    }

    /// Preference rank of an algorithm, or `None` when it is not recognised.
    pub fn hash_rank(&self, algorithm: HashAlgorithm) -> Option<usize> {
        self.hash_fields.iter().position(|alg| *alg == algorithm)
    }

    pub fn validate(&self) -> Result<()> {
        if self.hash_fields.is_empty() {
            return Err(DiffError::Config(
                "loader.hash_fields must name at least one field".into(),
            ));
        }
        if self.minimum_path_length == 0 {
            return Err(DiffError::Config(
                "loader.minimum_path_length must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// `[loader]` table as written in the config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderSection {
    pub hash_fields: Option<Vec<HashAlgorithm>>,
    pub hash_selection: Option<HashSelection>,
    pub strict: bool,
    pub minimum_path_length: Option<usize>,
    pub termination: Option<StanzaTermination>,
    pub capture_version: bool,
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiffConfig {
    pub index_file_name: Option<String>,
    pub repo_path: Option<String>,
    pub log_dir: Option<PathBuf>,
    pub debug_logging: bool,
    pub loader: LoaderSection,
}

impl DiffConfig {
    /// Load from an explicit path, or from the default location when present.
    pub fn load_from_optional_path(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => match default_config_path() {
                Some(path) if path.is_file() => Self::load(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            DiffError::Config(format!("Failed to read {}: {err}", path.display()))
        })?;
        Self::from_toml(&raw)
            .map_err(|err| DiffError::Config(format!("{}: {err}", path.display())))
    }

    pub fn from_toml(raw: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    pub fn index_file_name(&self) -> &str {
        self.index_file_name.as_deref().unwrap_or(DEFAULT_INDEX_FILE)
    }

    pub fn repo_path(&self) -> &str {
        self.repo_path.as_deref().unwrap_or(DEFAULT_REPO_PATH)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(|| {
            dirs::state_dir()
                .or_else(dirs::cache_dir)
                .unwrap_or_else(std::env::temp_dir)
                .join("debdiff")
                .join("logs")
        })
    }

    /// Resolve loader options; `strict` seeds the strict variant before overrides.
    pub fn loader_options(&self) -> Result<LoaderOptions> {
        let section = &self.loader;
        let mut options = if section.strict {
            LoaderOptions::strict()
        } else {
            LoaderOptions::default()
        };
        if let Some(fields) = &section.hash_fields {
            options.hash_fields = fields.clone();
        }
        if let Some(selection) = section.hash_selection {
            options.hash_selection = selection;
        }
        if let Some(length) = section.minimum_path_length {
            options.minimum_path_length = length;
        }
        if let Some(termination) = section.termination {
            options.termination = termination;
        }
        options.capture_version = section.capture_version;
        options.debug_logging = self.debug_logging;
        options.validate()?;
        Ok(options)
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("debdiff").join("config.toml"))
}
