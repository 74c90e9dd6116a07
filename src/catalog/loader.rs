//! Catalog Loader
//!
//! Transforms the raw catalog file into populated index structures, once,
//! synchronously, before the HTTP listener starts. Malformed lines are
//! skipped and counted, never fatal; a missing source file leaves the
//! service running in a degraded, data-less state.

use super::index::CatalogIndex;
use super::types::{CatalogEntry, Settlement};
use anyhow::{Context, Result};
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

const FIELD_DELIMITER: char = '|';
/// First two lines of the source file are reserved (metadata + header).
const HEADER_LINES: usize = 2;
const MIN_COLUMNS: usize = 6;
/// Records with at least this many columns carry the zone type second to
/// last; shorter records carry it in the last column.
const WIDE_RECORD_COLUMNS: usize = 15;
/// Only this many malformed lines are reported individually; the rest are
/// suppressed behind a single summary notice.
const MAX_REPORTED_ERRORS: u64 = 100;
/// Bytes inspected to distinguish Latin-1 from UTF-8 input.
const ENCODING_SAMPLE_BYTES: usize = 4096;

const COL_CODE: usize = 0;
const COL_SETTLEMENT_NAME: usize = 1;
const COL_SETTLEMENT_TYPE: usize = 2;
const COL_SUBREGION: usize = 3;
const COL_REGION: usize = 4;
const COL_LOCALITY: usize = 5;

static CODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{5}$").expect("code pattern is valid"));

/// The loaded catalog handed to the query layer. `data_loaded` is the
/// external readiness signal: it turns true only after the full stream was
/// consumed without a fatal I/O failure.
pub struct Catalog {
    pub index: CatalogIndex,
    pub data_loaded: bool,
    pub skipped_lines: u64,
}

impl Catalog {
    /// Degraded state: no source stream was found. Every query answers
    /// NotFound and the health endpoint reports down.
    pub fn unavailable() -> Self {
        Self {
            index: CatalogIndex::empty(),
            data_loaded: false,
            skipped_lines: 0,
        }
    }
}

/// Loads the catalog from `path`. A missing file degrades, an unreadable
/// existing file is a startup error.
pub fn load_catalog(path: &str) -> Result<Catalog> {
    if !Path::new(path).exists() {
        tracing::error!("no catalog source file found at {}, starting without data", path);
        return Ok(Catalog::unavailable());
    }

    tracing::info!("loading postal-code catalog from {}", path);
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read catalog file {path}"))?;

    Ok(parse_catalog(&bytes))
}

/// Parses a full source byte stream into a frozen catalog.
pub fn parse_catalog(bytes: &[u8]) -> Catalog {
    let encoding = detect_encoding(bytes);
    let (text, _, _) = encoding.decode(bytes);

    let mut entries: BTreeMap<String, CatalogEntry> = BTreeMap::new();
    let mut skipped: u64 = 0;

    for line in text.lines().skip(HEADER_LINES) {
        if line.trim().is_empty() {
            continue;
        }
        if let Err(reason) = process_line(line, &mut entries) {
            skipped += 1;
            if skipped <= MAX_REPORTED_ERRORS {
                tracing::warn!("skipping malformed catalog line ({}): {}", reason, line);
            } else if skipped == MAX_REPORTED_ERRORS + 1 {
                tracing::warn!(
                    "more than {} malformed lines, suppressing further reports",
                    MAX_REPORTED_ERRORS
                );
            }
        }
    }

    let index = CatalogIndex::freeze(entries);
    tracing::info!(
        "catalog loaded: {} postal codes, {} lines skipped",
        index.entry_count(),
        skipped
    );

    Catalog {
        index,
        data_loaded: true,
        skipped_lines: skipped,
    }
}

/// Inspects a bounded prefix of the input without consuming it. High-bit
/// bytes that form valid UTF-8 sequences select UTF-8; anything else,
/// including a purely ASCII sample, selects the Latin encoding
/// (windows-1252, the superset of ISO-8859-1 the original file ships in).
fn detect_encoding(bytes: &[u8]) -> &'static Encoding {
    let sample = &bytes[..bytes.len().min(ENCODING_SAMPLE_BYTES)];

    let mut saw_multibyte = false;
    let mut i = 0;
    while i < sample.len() {
        let byte = sample[i];
        if byte < 0x80 {
            i += 1;
            continue;
        }

        let seq_len = match byte {
            0xC2..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF4 => 4,
            _ => return WINDOWS_1252,
        };

        if i + seq_len > sample.len() {
            // Sequence cut off by the sample boundary, not evidence either
            // way. Stop inspecting.
            break;
        }
        if sample[i + 1..i + seq_len]
            .iter()
            .all(|b| (0x80..=0xBF).contains(b))
        {
            saw_multibyte = true;
            i += seq_len;
        } else {
            return WINDOWS_1252;
        }
    }

    if saw_multibyte { UTF_8 } else { WINDOWS_1252 }
}

/// Validates one record and folds it into the entry map. Entry creation is
/// idempotent per code; every valid line appends one settlement.
fn process_line(line: &str, entries: &mut BTreeMap<String, CatalogEntry>) -> Result<(), String> {
    let columns: Vec<&str> = line.split(FIELD_DELIMITER).collect();

    if columns.len() < MIN_COLUMNS {
        return Err(format!("expected at least {MIN_COLUMNS} columns"));
    }

    let code = columns[COL_CODE].trim();
    if !CODE_PATTERN.is_match(code) {
        return Err("code is not 5 digits".to_string());
    }

    let region = columns[COL_REGION].trim();
    let subregion = columns[COL_SUBREGION].trim();
    if region.is_empty() {
        return Err("blank region".to_string());
    }
    if subregion.is_empty() {
        return Err("blank subregion".to_string());
    }

    // Source quirk kept from the upstream file format: narrow records carry
    // the zone type in the last column, wide ones second to last.
    let zone_type = if columns.len() < WIDE_RECORD_COLUMNS {
        columns[columns.len() - 1]
    } else {
        columns[columns.len() - 2]
    };

    let entry = entries
        .entry(code.to_string())
        .or_insert_with(|| CatalogEntry {
            code: code.to_string(),
            locality: columns[COL_LOCALITY].trim().to_string(),
            region: region.to_string(),
            subregion: subregion.to_string(),
            settlements: Vec::new(),
        });

    entry.settlements.push(Settlement {
        name: columns[COL_SETTLEMENT_NAME].trim().to_string(),
        settlement_type: columns[COL_SETTLEMENT_TYPE].trim().to_string(),
        zone_type: zone_type.trim().to_string(),
    });

    Ok(())
}
