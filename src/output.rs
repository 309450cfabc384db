//! Output formatting and persistence for import and analytics results.
//!
//! Supports pretty-printed JSON on stdout and CSV files.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;

use csv::WriterBuilder;
use std::path::Path;
use tempfile::NamedTempFile;

/// Prints a value to stdout as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Writes `records` to a CSV file with a header row, replacing any existing file.
///
/// The records go to a temporary file in the same directory which is then
/// renamed over `path`, so a failed write leaves the previous file intact.
pub fn write_records<T: Serialize>(path: &str, records: &[T]) -> Result<()> {
    debug!(path, records = records.len(), "Writing CSV records");

    let dir = match Path::new(path).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temporary file next to '{path}'"))?;

    let mut writer = WriterBuilder::new().has_headers(true).from_writer(tmp);
    for record in records {
        writer.serialize(record)?;
    }
    let tmp = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("failed to flush records for '{path}': {}", e.error()))?;

    tmp.as_file().sync_all()?;
    tmp.persist(path).with_context(|| format!("failed to replace '{path}'"))?;

    Ok(())
}
