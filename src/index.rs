/*============================================================
  Synavera Project: Deb-Diff
  Module: debdiff_core::index
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Decompress a Packages.gz index and reduce its RFC822-style
    stanzas to PackageRecord values in source order.

  Security / Safety Notes:
    Reads operator-supplied files only. Input is treated as
    untrusted text; malformed stanzas are dropped, malformed
    sizes and streams abort the load.

  Dependencies:
    flate2 for gzip decoding.

  Operational Scope:
    Invoked once per comparison side before the matchup.

  Revision History:
    2026-03-02 COD  Authored stanza loader.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Structured parsing with clear failure modes
    - Configurable behaviour passed explicitly per call
============================================================*/

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use flate2::read::MultiGzDecoder;

use crate::config::{HashSelection, LoaderOptions, StanzaTermination};
use crate::error::{DiffError, Result};
use crate::logger::Logger;
use crate::package_info::{HashAlgorithm, PackageCollection, PackageRecord, Side};

/// Open `path` as a gzip index and parse every stanza.
pub fn load_index(
    path: &Path,
    side: Side,
    options: &LoaderOptions,
    logger: &Logger,
) -> Result<PackageCollection> {
    let display = path.display().to_string();
    let file = File::open(path).map_err(|source| DiffError::Source {
        side,
        path: display.clone(),
        source,
    })?;
    logger.info("LOAD", format!("Reading {side} index {display}"));

    let records = parse_index(BufReader::new(file), options, logger)
        .map_err(|err| err.for_side(side, &display))?;
    logger.info(
        "LOAD",
        format!("{side} index {display}: {} records", records.len()),
    );
    Ok(records)
}

/// Parse a gzip-compressed index from any byte source.
///
/// Concatenated gzip members are read as one stream; bytes after the last
/// member that do not form a gzip header fail the load.
pub fn parse_index<R: Read>(
    reader: R,
    options: &LoaderOptions,
    logger: &Logger,
) -> Result<PackageCollection> {
    parse_stanzas(BufReader::new(MultiGzDecoder::new(reader)), options, logger)
}

/// Parse already-decompressed stanza text.
pub fn parse_stanzas<R: BufRead>(
    mut reader: R,
    options: &LoaderOptions,
    logger: &Logger,
) -> Result<PackageCollection> {
    let mut records = PackageCollection::new();
    let mut stanza = StanzaBuilder::default();
    let mut line = String::new();
    let mut line_no = 0usize;
    let mut dropped = 0usize;

    loop {
        line.clear();
        let read = reader.read_line(&mut line).map_err(DiffError::Stream)?;
        if read == 0 {
            break;
        }
        line_no += 1;
        let text = line.trim_end_matches(['\n', '\r']);

        let terminates = match classify(text) {
            Line::Blank => true,
            Line::Continuation => false,
            Line::Field(field, value) => {
                stanza.apply(field, value, line_no, options)?;
                false
            }
            Line::Stray => {
                if options.debug_logging {
                    logger.debug("STANZA", format!("line {line_no}: ignoring `{text}`"));
                }
                options.termination == StanzaTermination::FieldRun
            }
        };

        if terminates {
            flush(&mut stanza, &mut records, &mut dropped, line_no, options, logger);
        }
    }
    flush(&mut stanza, &mut records, &mut dropped, line_no, options, logger);

    if dropped > 0 {
        logger.debug(
            "STANZA",
            format!("Dropped {dropped} stanzas below the path threshold"),
        );
    }
    Ok(records)
}

enum Line<'a> {
    Blank,
    Continuation,
    Field(&'a str, &'a str),
    Stray,
}

fn classify(text: &str) -> Line<'_> {
    if text.trim().is_empty() {
        return Line::Blank;
    }
    if text.starts_with([' ', '\t']) {
        return Line::Continuation;
    }
    match text.split_once(':') {
        Some((field, value)) => Line::Field(field, value.trim()),
        None => Line::Stray,
    }
}

fn flush(
    stanza: &mut StanzaBuilder,
    records: &mut PackageCollection,
    dropped: &mut usize,
    line_no: usize,
    options: &LoaderOptions,
    logger: &Logger,
) {
    let current = std::mem::take(stanza);
    if current.is_empty() {
        return;
    }
    match current.finish(options) {
        Some(record) => {
            if options.debug_logging {
                logger.debug(
                    "RECORD",
                    format!(
                        "{} {} {} version=`{}`",
                        record.content_hash(),
                        record.size_bytes(),
                        record.relative_path(),
                        record.version()
                    ),
                );
            }
            records.push(record);
        }
        None => {
            *dropped += 1;
            if options.debug_logging {
                logger.debug("STANZA", format!("stanza ending at line {line_no} dropped"));
            }
        }
    }
}

/// Fields collected while scanning one stanza.
#[derive(Debug, Default)]
struct StanzaBuilder {
    fields: usize,
    path: String,
    size: u64,
    hash: Option<(HashAlgorithm, String)>,
    version: String,
}

impl StanzaBuilder {
    fn is_empty(&self) -> bool {
        self.fields == 0
    }

    fn apply(
        &mut self,
        field: &str,
        value: &str,
        line_no: usize,
        options: &LoaderOptions,
    ) -> Result<()> {
        self.fields += 1;
        match field {
            "Filename" => self.path = value.to_string(),
            "Size" => {
                self.size = value.parse().map_err(|_| DiffError::FieldParse {
                    line: line_no,
                    field: field.to_string(),
                    value: value.to_string(),
                })?;
            }
            "Version" if options.capture_version => self.version = value.to_string(),
            _ => {
                if let Some(algorithm) = HashAlgorithm::from_field(field) {
                    self.offer_hash(algorithm, value, options);
                }
            }
        }
        Ok(())
    }

    fn offer_hash(&mut self, algorithm: HashAlgorithm, digest: &str, options: &LoaderOptions) {
        let Some(rank) = options.hash_rank(algorithm) else {
            return;
        };
        let replace = match (&self.hash, options.hash_selection) {
            (None, _) | (_, HashSelection::LastSeen) => true,
            (Some((current, _)), HashSelection::Strongest) => {
                options.hash_rank(*current).map_or(true, |held| rank >= held)
            }
        };
        if replace {
            self.hash = Some((algorithm, digest.to_string()));
        }
    }

    fn finish(self, options: &LoaderOptions) -> Option<PackageRecord> {
        let record = PackageRecord::new(
            self.hash
                .map(|(algorithm, digest)| algorithm.tagged(&digest))
                .unwrap_or_default(),
            &self.path,
            self.size,
            self.version,
        );
        let admitted = !record.relative_path().is_empty()
            && record.relative_path().len() >= options.minimum_path_length;
        admitted.then_some(record)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::write::GzEncoder;
    use flate2::Compression;

    use super::*;

    fn gzip(text: &str) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(text.as_bytes()).unwrap();
        encoder.finish().unwrap()
    }

    fn parse(text: &str, options: &LoaderOptions) -> Result<PackageCollection> {
        parse_index(gzip(text).as_slice(), options, &Logger::quiet())
    }

    const INDEX: &str = "\
Package: aiccu
Version: 20070115-14.1ubuntu3.1
Depends: debconf (>= 0.5) | debconf-2.0,
 upstart-job
Filename: pool/universe/a/aiccu/aiccu_20070115-14.1ubuntu3.1_amd64.deb
Size: 51220
MD5sum: 079e10cb6983b13f0a998079df62135b
SHA1: 7f2c6dc25a41c3fc4dbf406ebe81016609dca166
SHA256: 2c31e52c6be536f98d7d24793d9c9c92d0a9720030d290c86dbd858b53fac803
Description: SixXS Automatic IPv6 Connectivity Client Utility

Package: zile
Filename: /pool/main/z/zile/zile_2.4_amd64.deb
Size: 300
SHA1: 0123
";

    #[test]
    fn parses_stanzas_in_source_order() {
        let records = parse(INDEX, &LoaderOptions::default()).unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(
            first.relative_path(),
            "pool/universe/a/aiccu/aiccu_20070115-14.1ubuntu3.1_amd64.deb"
        );
        assert_eq!(first.size_bytes(), 51220);
        assert_eq!(
            first.content_hash(),
            "{sha256}2c31e52c6be536f98d7d24793d9c9c92d0a9720030d290c86dbd858b53fac803"
        );
        assert_eq!(first.version(), "");

        let last = &records[1];
        assert_eq!(last.relative_path(), "pool/main/z/zile/zile_2.4_amd64.deb");
        assert_eq!(last.content_hash(), "{sha1}0123");
    }

    #[test]
    fn later_hash_field_overrides_weaker_one() {
        let records = parse(
            "Filename: pool/a.deb\nMD5sum: abc\nSHA256: def\n\n",
            &LoaderOptions::default(),
        )
        .unwrap();
        assert_eq!(records[0].content_hash(), "{sha256}def");
    }

    #[test]
    fn last_seen_follows_encounter_order() {
        let text = "Filename: pool/a.deb\nSHA256: def\nMD5sum: abc\n";
        let records = parse(text, &LoaderOptions::default()).unwrap();
        assert_eq!(records[0].content_hash(), "{md5}abc");

        let options = LoaderOptions {
            hash_selection: HashSelection::Strongest,
            ..LoaderOptions::default()
        };
        let records = parse(text, &options).unwrap();
        assert_eq!(records[0].content_hash(), "{sha256}def");
    }

    #[test]
    fn unlisted_hash_fields_are_ignored() {
        let options = LoaderOptions {
            hash_fields: vec![HashAlgorithm::Sha1, HashAlgorithm::Sha256],
            ..LoaderOptions::default()
        };
        let records = parse("Filename: pool/a.deb\nSHA1: aa\nSHA512: ff\n", &options).unwrap();
        assert_eq!(records[0].content_hash(), "{sha1}aa");

        let records = parse("Filename: pool/a.deb\nMD5sum: aa\n", &options).unwrap();
        assert_eq!(records[0].content_hash(), "");
    }

    #[test]
    fn final_stanza_without_trailing_blank_line_is_kept() {
        let records = parse(
            "Filename: pool/a.deb\nSize: 1\n\nFilename: pool/b.deb\nSize: 2",
            &LoaderOptions::default(),
        )
        .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].relative_path(), "pool/b.deb");
        assert_eq!(records[1].size_bytes(), 2);
    }

    #[test]
    fn stanza_without_filename_is_dropped() {
        let records = parse(
            "Package: ghost\nSize: 10\nSHA256: aa\n\n\n\nFilename: pool/real.deb\n",
            &LoaderOptions::default(),
        )
        .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].relative_path(), "pool/real.deb");
    }

    #[test]
    fn strict_threshold_drops_short_paths() {
        let text = "Filename: a.deb\n\nFilename: pool/b.deb\n";
        assert_eq!(parse(text, &LoaderOptions::default()).unwrap().len(), 2);

        let records = parse(text, &LoaderOptions::strict()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].relative_path(), "pool/b.deb");
    }

    #[test]
    fn non_numeric_size_is_fatal() {
        let err = parse("Filename: pool/a.deb\nSize: 12k\n", &LoaderOptions::default())
            .unwrap_err();
        match err {
            DiffError::FieldParse { line, field, value } => {
                assert_eq!(line, 2);
                assert_eq!(field, "Size");
                assert_eq!(value, "12k");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn corrupt_stream_is_fatal() {
        let mut bytes = gzip(INDEX);
        bytes.truncate(bytes.len() / 2);
        let err = parse_index(bytes.as_slice(), &LoaderOptions::default(), &Logger::quiet())
            .unwrap_err();
        assert!(matches!(err, DiffError::Stream(_)));

        let err = parse_index(
            &b"Filename: plain text\n"[..],
            &LoaderOptions::default(),
            &Logger::quiet(),
        )
        .unwrap_err();
        assert!(matches!(err, DiffError::Stream(_)));
    }

    #[test]
    fn concatenated_members_are_read_in_full() {
        let mut bytes = gzip("Filename: pool/a.deb\nSize: 1\n\n");
        bytes.extend(gzip("Filename: pool/b.deb\nSize: 2\n"));
        let records =
            parse_index(bytes.as_slice(), &LoaderOptions::default(), &Logger::quiet()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].relative_path(), "pool/b.deb");
    }

    #[test]
    fn trailing_bytes_after_stream_are_fatal() {
        let mut bytes = gzip("Filename: pool/a.deb\nSize: 1\n");
        bytes.extend_from_slice(b"garbage trailing bytes");
        let err = parse_index(bytes.as_slice(), &LoaderOptions::default(), &Logger::quiet())
            .unwrap_err();
        assert!(matches!(err, DiffError::Stream(_)));
    }

    #[test]
    fn field_name_is_taken_verbatim_before_colon() {
        let records = parse(
            "Filename : pool/a.deb\n\nFilename: pool/b.deb\nSize : 12k\n",
            &LoaderOptions::default(),
        )
        .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].relative_path(), "pool/b.deb");
        assert_eq!(records[0].size_bytes(), 0);
    }

    #[test]
    fn field_run_termination_splits_on_stray_lines() {
        let text = "Filename: pool/a.deb\nSize: 5\nnot a field\nSHA256: ff\n";

        let records = parse(text, &LoaderOptions::default()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].content_hash(), "{sha256}ff");

        let options = LoaderOptions {
            termination: StanzaTermination::FieldRun,
            ..LoaderOptions::default()
        };
        let records = parse(text, &options).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].content_hash(), "");
        assert_eq!(records[0].size_bytes(), 5);
    }

    #[test]
    fn version_is_empty_unless_captured() {
        let text = "Filename: pool/a.deb\nVersion: 1.2-3\n";
        let records = parse(text, &LoaderOptions::default()).unwrap();
        assert_eq!(records[0].version(), "");

        let options = LoaderOptions {
            capture_version: true,
            ..LoaderOptions::default()
        };
        let records = parse(text, &options).unwrap();
        assert_eq!(records[0].version(), "1.2-3");
    }

    #[test]
    fn crlf_and_whitespace_only_separators() {
        let text = "Filename: pool/a.deb\r\nSize: 7\r\n \t\r\nFilename: pool/b.deb\r\n";
        let records = parse(text, &LoaderOptions::default()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].size_bytes(), 7);
    }

    #[test]
    fn load_index_reports_side_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("Packages.gz");
        let err = load_index(&missing, Side::Old, &LoaderOptions::default(), &Logger::quiet())
            .unwrap_err();
        assert!(matches!(err, DiffError::Source { side: Side::Old, .. }));

        std::fs::write(&missing, gzip("Filename: pool/a.deb\nSize: x\n")).unwrap();
        let err = load_index(&missing, Side::New, &LoaderOptions::default(), &Logger::quiet())
            .unwrap_err();
        assert!(err.to_string().starts_with("new index "));
    }
}
