/*============================================================
  Synavera Project: Deb-Diff
  Module: debdiff_core::package_info
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Shared structures describing package records parsed from
    a repository index and the hash algorithms they carry.

  Security / Safety Notes:
    Pure data container; no I/O performed in this module.

  Dependencies:
    serde for configuration and summary (de)serialization.

  Operational Scope:
    Used by the index loader, the matchup engine and the report
    writer to pass immutable package records.

  Revision History:
    2026-03-02 COD  Introduced PackageRecord and HashAlgorithm.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Clear data contracts between modules
    - Immutable records after construction
============================================================*/

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which input an index was loaded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    New,
    Old,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::New => f.write_str("new"),
            Side::Old => f.write_str("old"),
        }
    }
}

/// Digest fields recognised in an index stanza, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HashAlgorithm {
    #[serde(rename = "MD5sum")]
    Md5,
    #[serde(rename = "SHA1")]
    Sha1,
    #[serde(rename = "SHA256")]
    Sha256,
    #[serde(rename = "SHA512")]
    Sha512,
}

impl HashAlgorithm {
    /// Every algorithm in ascending preference order.
    pub const ALL: [HashAlgorithm; 4] = [
        HashAlgorithm::Md5,
        HashAlgorithm::Sha1,
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha512,
    ];

    /// Stanza field name carrying this digest.
    pub fn field_name(self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "MD5sum",
            HashAlgorithm::Sha1 => "SHA1",
            HashAlgorithm::Sha256 => "SHA256",
            HashAlgorithm::Sha512 => "SHA512",
        }
    }

    /// Tag written between braces in front of the digest.
    pub fn tag(self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha512 => "sha512",
        }
    }

    pub fn from_field(field: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|alg| alg.field_name() == field)
    }

    /// Render `{tag}digest`.
    pub fn tagged(self, digest: &str) -> String {
        format!("{{{}}}{}", self.tag(), digest)
    }
}

/// One package stanza reduced to the fields that decide identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRecord {
    content_hash: String,
    relative_path: String,
    size_bytes: u64,
    version: String,
}

impl PackageRecord {
    /// Build a record; a leading `/` on the path is stripped.
    pub fn new(
        content_hash: String,
        relative_path: &str,
        size_bytes: u64,
        version: String,
    ) -> Self {
        Self {
            content_hash,
            relative_path: relative_path.strip_prefix('/').unwrap_or(relative_path).to_string(),
            size_bytes,
            version,
        }
    }

    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Borrowed tuple compared by the identity predicate.
    pub fn identity(&self) -> IdentityKey<'_> {
        IdentityKey {
            content_hash: &self.content_hash,
            relative_path: &self.relative_path,
            size_bytes: self.size_bytes,
            version: &self.version,
        }
    }
}

/// Hash, path, size and version of a record; equal keys mean the same artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdentityKey<'a> {
    pub content_hash: &'a str,
    pub relative_path: &'a str,
    pub size_bytes: u64,
    pub version: &'a str,
}

/// Records of one index in source order.
pub type PackageCollection = Vec<PackageRecord>;
