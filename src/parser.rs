//! CSV ingestion for uploaded ratings files.
//!
//! Turns raw bytes into a [`ParsedTable`]: headers and cells are trimmed, a
//! leading UTF-8 byte-order mark is dropped and the subject column is located.

use std::collections::{BTreeMap, HashSet};

use csv::{ReaderBuilder, Trim};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analyzers::types::{ParsedRow, ParsedTable, canonical_label};
use crate::error::ImportError;

/// Canonical name of the column holding the problem order.
pub const SUBJECT_HEADER: &str = "problem";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Text encoding the uploaded bytes are assumed to be in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TextEncoding {
    #[default]
    Utf8,
    Latin1,
}

/// Decodes `bytes` and parses them as a headed CSV table.
///
/// # Errors
///
/// Returns [`ImportError::MalformedInput`] if the bytes are not valid in the
/// given encoding, the header row is missing, two columns share a header
/// (compared case-insensitively), or no `Problem` column exists.
pub fn parse_table(bytes: &[u8], encoding: TextEncoding) -> Result<ParsedTable, ImportError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let text = decode(bytes, encoding)?;

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| ImportError::malformed(format!("unreadable header row: {e}")))?
        .iter()
        .map(str::to_string)
        .collect();

    if headers.iter().all(String::is_empty) {
        return Err(ImportError::malformed("header row is missing"));
    }

    let mut seen = HashSet::new();
    if let Some(duplicate) = headers
        .iter()
        .filter(|h| !h.is_empty())
        .find(|h| !seen.insert(canonical_label(h)))
    {
        return Err(ImportError::malformed(format!(
            "column \"{duplicate}\" appears more than once in header row"
        )));
    }

    let subject_header = headers
        .iter()
        .find(|h| canonical_label(h) == SUBJECT_HEADER)
        .cloned()
        .ok_or_else(|| ImportError::malformed("no \"Problem\" column in header row"))?;

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| ImportError::malformed(format!("unreadable row: {e}")))?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        if record.iter().all(str::is_empty) {
            debug!(line, "Skipping blank row");
            continue;
        }

        let mut cells = BTreeMap::new();
        for (header, value) in headers.iter().zip(record.iter()) {
            if header.is_empty() {
                continue;
            }
            cells.insert(header.clone(), value.to_string());
        }

        rows.push(ParsedRow { line, cells });
    }

    debug!(
        columns = headers.len(),
        rows = rows.len(),
        subject = %subject_header,
        "Ratings table parsed"
    );

    Ok(ParsedTable {
        headers,
        subject_header,
        rows,
    })
}

fn decode(bytes: &[u8], encoding: TextEncoding) -> Result<String, ImportError> {
    match encoding {
        TextEncoding::Utf8 => String::from_utf8(bytes.to_vec())
            .map_err(|e| ImportError::malformed(format!("input is not valid UTF-8: {e}"))),
        TextEncoding::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
    }
}
