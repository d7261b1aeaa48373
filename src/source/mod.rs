//! Detector sources and their standardization.
//!
//! A document arrives as three independent JSON documents: table detections,
//! key-value detections and OCR lines. [`SourceSet`] loads and validates them;
//! [`standardize`] turns them into page-grouped fragments and lines.

mod raw;
mod standardize;

pub use raw::{PointArrays, RawCell, RawKvPair, RawLine, RawLinePage, RawTable};
pub use standardize::{
    coerce_page_no, serialize_grid, standardize, standardize_kv, standardize_line_page,
    standardize_table, StandardizedSource,
};

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde_json::Value;

use crate::detect::expect_source_kind;
use crate::error::{Error, Result};
use crate::model::{Rejection, SourceKind};

/// The three raw detector outputs of one document.
#[derive(Debug, Clone, Default)]
pub struct SourceSet {
    /// Table detections
    pub tables: Vec<RawTable>,

    /// Key-value detections
    pub kv_pairs: Vec<RawKvPair>,

    /// OCR lines grouped by page
    pub lines: Vec<RawLinePage>,

    /// Records that could not be read, indexed by position in their source
    pub rejections: Vec<Rejection>,
}

impl SourceSet {
    /// Create an empty source set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a source set from parsed JSON documents.
    ///
    /// The tables document may be `{"tables": [...]}` or a bare array. A
    /// record of the wrong shape is dropped and kept as a [`Rejection`];
    /// only a source that is not an array fails the whole set.
    pub fn from_values(tables: Value, kv_pairs: Value, lines: Value) -> Result<Self> {
        expect_source_kind(&tables, SourceKind::Tables)?;
        expect_source_kind(&kv_pairs, SourceKind::KeyValues)?;
        expect_source_kind(&lines, SourceKind::Lines)?;

        let tables = match tables {
            Value::Object(mut map) => map.remove("tables").unwrap_or(Value::Null),
            other => other,
        };

        let mut rejections = Vec::new();
        Ok(Self {
            tables: from_array(tables, SourceKind::Tables, &mut rejections)?,
            kv_pairs: from_array(kv_pairs, SourceKind::KeyValues, &mut rejections)?,
            lines: from_array(lines, SourceKind::Lines, &mut rejections)?,
            rejections,
        })
    }

    /// Build a source set from JSON text.
    pub fn from_strs(tables: &str, kv_pairs: &str, lines: &str) -> Result<Self> {
        Self::from_values(
            serde_json::from_str(tables)?,
            serde_json::from_str(kv_pairs)?,
            serde_json::from_str(lines)?,
        )
    }

    /// Load a source set from three JSON files.
    pub fn from_paths<P: AsRef<Path>>(tables: P, kv_pairs: P, lines: P) -> Result<Self> {
        Self::from_values(read_json(tables)?, read_json(kv_pairs)?, read_json(lines)?)
    }

    /// Add table detections.
    pub fn with_tables(mut self, tables: Vec<RawTable>) -> Self {
        self.tables = tables;
        self
    }

    /// Add key-value detections.
    pub fn with_kv_pairs(mut self, kv_pairs: Vec<RawKvPair>) -> Self {
        self.kv_pairs = kv_pairs;
        self
    }

    /// Add OCR lines.
    pub fn with_lines(mut self, lines: Vec<RawLinePage>) -> Self {
        self.lines = lines;
        self
    }

    /// Check if all three sources are empty.
    ///
    /// Load rejections do not count.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.kv_pairs.is_empty() && self.lines.is_empty()
    }
}

/// Read a JSON file into a value.
pub fn read_json<P: AsRef<Path>>(path: P) -> Result<Value> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

fn from_array<T: serde::de::DeserializeOwned>(
    value: Value,
    kind: SourceKind,
    rejections: &mut Vec<Rejection>,
) -> Result<Vec<T>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => {
            let mut records = Vec::with_capacity(items.len());
            for (index, item) in items.into_iter().enumerate() {
                let page_no = record_page(&item, kind);
                match serde_json::from_value(item) {
                    Ok(record) => records.push(record),
                    Err(err) => {
                        log::warn!("Dropping unreadable {} record #{}: {}", kind, index, err);
                        rejections.push(Rejection {
                            source: kind,
                            page_no,
                            index,
                            reason: Error::from(err).to_string(),
                        });
                    }
                }
            }
            Ok(records)
        }
        other => Err(Error::SourceShape(format!(
            "{} source must be an array, found {}",
            kind,
            json_type(&other)
        ))),
    }
}

fn record_page(item: &Value, kind: SourceKind) -> Option<u32> {
    let field = |name: &str| item.get(name).cloned();
    let (first, second) = match kind {
        SourceKind::KeyValues => (field("page_number"), field("page_no")),
        _ => (field("page_no"), field("page_number")),
    };
    coerce_page_no(raw::page_field(&first, &second)).ok()
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_values_wrapped_tables() {
        let set = SourceSet::from_values(
            json!({"tables": [{"page_no": 1, "cells": []}]}),
            json!([]),
            json!([]),
        )
        .unwrap();
        assert_eq!(set.tables.len(), 1);
        assert!(set.kv_pairs.is_empty());
    }

    #[test]
    fn test_from_values_bare_tables() {
        let set = SourceSet::from_values(
            json!([{"page_no": 1, "cells": [], "table_bounding_region": {}}]),
            json!([]),
            json!([{"page_no": 1, "content": []}]),
        )
        .unwrap();
        assert_eq!(set.tables.len(), 1);
        assert_eq!(set.lines.len(), 1);
    }

    #[test]
    fn test_from_values_swapped_sources() {
        let err = SourceSet::from_values(
            json!([]),
            json!([{"page_no": 1, "content": []}]),
            json!([]),
        )
        .unwrap_err();
        assert!(matches!(err, Error::SourceShape(_)));
    }

    #[test]
    fn test_tables_key_not_array() {
        let err = SourceSet::from_values(json!({"tables": 3}), json!([]), json!([])).unwrap_err();
        assert!(err.to_string().contains("must be an array"));
    }

    #[test]
    fn test_from_strs_invalid_json() {
        let err = SourceSet::from_strs("{", "[]", "[]").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_unreadable_record_is_rejected_alone() {
        let set = SourceSet::from_values(
            json!([
                {"page_no": 1, "cells": []},
                {"page_no": 2, "cells": "not a list"},
                7
            ]),
            json!([]),
            json!([]),
        )
        .unwrap();
        assert_eq!(set.tables.len(), 1);
        assert_eq!(set.rejections.len(), 2);
        assert_eq!(set.rejections[0].index, 1);
        assert_eq!(set.rejections[0].page_no, Some(2));
        assert_eq!(set.rejections[1].page_no, None);
    }

    #[test]
    fn test_null_coordinate_does_not_fail_source() {
        let set = SourceSet::from_values(
            json!([{
                "page_no": 2,
                "table_bounding_region": {"point.x": [0.0, null, 10.0, 0.0], "point.y": [0, 0, 5, 5]}
            }]),
            json!([]),
            json!([]),
        )
        .unwrap();
        assert_eq!(set.tables.len(), 1);
        assert!(set.rejections.is_empty());
    }

    #[test]
    fn test_builder() {
        let set = SourceSet::new().with_kv_pairs(vec![RawKvPair::default()]);
        assert!(!set.is_empty());
        assert!(SourceSet::new().is_empty());
    }
}
