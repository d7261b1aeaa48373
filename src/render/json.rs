//! JSON rendering of reconstructed documents.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::model::{DocumentReport, Fragment, RegionRecord};

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Serialize any value in the given format.
pub fn to_json<T: Serialize + ?Sized>(value: &T, format: JsonFormat) -> Result<String> {
    let json = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(value)?,
        JsonFormat::Compact => serde_json::to_string(value)?,
    };
    Ok(json)
}

/// Render the attributed regions as an object keyed by page number.
pub fn records_to_json(report: &DocumentReport, format: JsonFormat) -> Result<String> {
    let by_page: BTreeMap<u32, &[RegionRecord]> = report
        .pages
        .iter()
        .map(|p| (p.page_no, p.regions.as_slice()))
        .collect();
    to_json(&by_page, format)
}

/// Render the merged, unattributed fragments as an object keyed by page number.
pub fn merged_to_json(report: &DocumentReport, format: JsonFormat) -> Result<String> {
    let by_page: BTreeMap<u32, &[Fragment]> = report
        .pages
        .iter()
        .map(|p| (p.page_no, p.merged.as_slice()))
        .collect();
    to_json(&by_page, format)
}

/// Write rendered JSON to a file, creating parent directories.
pub fn write_json<P: AsRef<Path>>(path: P, json: &str) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, json)?;
    Ok(())
}
