/*============================================================
  Synavera Project: Deb-Diff
  Module: debdiff_core::matchup
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Pair records of the new and old index under the identity
    predicate and classify them as added, removed or common.

  Security / Safety Notes:
    Pure computation over in-memory collections; no I/O.

  Dependencies:
    serde for the serializable totals.

  Operational Scope:
    Runs once both collections are fully loaded; feeds the
    report writer and the JSON summary.

  Revision History:
    2026-03-02 COD  Authored matchup engine.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Deterministic ordering for reproducible reports
    - Infallible once inputs are valid
============================================================*/

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::package_info::{IdentityKey, PackageRecord};

/// Classification bucket of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Added,
    Removed,
    Common,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Added, Category::Removed, Category::Common];
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Category::Added => "added",
            Category::Removed => "removed",
            Category::Common => "common",
        })
    }
}

/// Record count and byte total of one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CategoryTotal {
    pub records: usize,
    pub bytes: u64,
}

/// Totals for the categories a caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Totals {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added: Option<CategoryTotal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed: Option<CategoryTotal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub common: Option<CategoryTotal>,
}

impl Totals {
    pub fn get(&self, category: Category) -> Option<CategoryTotal> {
        match category {
            Category::Added => self.added,
            Category::Removed => self.removed,
            Category::Common => self.common,
        }
    }
}

/// Outcome of pairing two collections; marker vectors run parallel to the inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matchup<'a> {
    new: &'a [PackageRecord],
    old: &'a [PackageRecord],
    new_matched: Vec<bool>,
    old_matched: Vec<bool>,
}

/// Mark every new record that has an identical old record, and that partner.
///
/// The partner is always the first identical record of the old side, whether
/// or not an earlier new record already claimed it. Indexing the old side by
/// identity key gives the same markers as scanning it front to back for every
/// new record. Duplicates on the new side all match; later duplicates on the
/// old side stay unmatched.
pub fn matchup<'a>(new: &'a [PackageRecord], old: &'a [PackageRecord]) -> Matchup<'a> {
    let mut first_seen: HashMap<IdentityKey<'a>, usize> = HashMap::with_capacity(old.len());
    for (index, record) in old.iter().enumerate() {
        first_seen.entry(record.identity()).or_insert(index);
    }

    let mut new_matched = vec![false; new.len()];
    let mut old_matched = vec![false; old.len()];
    for (index, record) in new.iter().enumerate() {
        if let Some(&partner) = first_seen.get(&record.identity()) {
            new_matched[index] = true;
            old_matched[partner] = true;
        }
    }

    Matchup {
        new,
        old,
        new_matched,
        old_matched,
    }
}

impl<'a> Matchup<'a> {
    /// Per-record marker for the new collection.
    pub fn new_markers(&self) -> &[bool] {
        &self.new_matched
    }

    /// Per-record marker for the old collection.
    pub fn old_markers(&self) -> &[bool] {
        &self.old_matched
    }

    /// Records of one category in source order.
    pub fn records(&self, category: Category) -> impl Iterator<Item = &'a PackageRecord> + '_ {
        let (records, markers, wanted) = match category {
            Category::Added => (self.new, &self.new_matched, false),
            Category::Common => (self.new, &self.new_matched, true),
            Category::Removed => (self.old, &self.old_matched, false),
        };
        records
            .iter()
            .zip(markers.iter())
            .filter(move |(_, matched)| **matched == wanted)
            .map(|(record, _)| record)
    }

    pub fn total(&self, category: Category) -> CategoryTotal {
        self.records(category)
            .fold(CategoryTotal::default(), |acc, record| CategoryTotal {
                records: acc.records + 1,
                bytes: acc.bytes.saturating_add(record.size_bytes()),
            })
    }

    /// Totals for the requested categories only.
    pub fn totals(&self, categories: &[Category]) -> Totals {
        let mut totals = Totals::default();
        for category in categories {
            let total = Some(self.total(*category));
            match category {
                Category::Added => totals.added = total,
                Category::Removed => totals.removed = total,
                Category::Common => totals.common = total,
            }
        }
        totals
    }
}
