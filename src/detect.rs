//! Detector output format detection and validation.

use crate::error::{Error, Result};
use crate::model::SourceKind;
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Detect which detector produced a JSON document.
///
/// Returns `None` when the shape is not recognised, including for an empty
/// array, which any source may legitimately produce.
///
/// # Example
/// ```
/// use docorder::detect::detect_source_kind;
/// use docorder::model::SourceKind;
///
/// let value = serde_json::json!({"tables": []});
/// assert_eq!(detect_source_kind(&value), Some(SourceKind::Tables));
/// ```
pub fn detect_source_kind(value: &Value) -> Option<SourceKind> {
    match value {
        Value::Object(map) if map.contains_key("tables") => Some(SourceKind::Tables),
        Value::Array(items) => items
            .iter()
            .find_map(|item| item.as_object())
            .and_then(|first| {
                if first.contains_key("cells") || first.contains_key("table_bounding_region") {
                    Some(SourceKind::Tables)
                } else if first.contains_key("key_bounding_box")
                    || first.contains_key("value_bounding_box")
                    || first.contains_key("key")
                {
                    Some(SourceKind::KeyValues)
                } else if first.get("content").is_some_and(Value::is_array)
                    || first.get("lines").is_some_and(Value::is_array)
                {
                    Some(SourceKind::Lines)
                } else {
                    None
                }
            }),
        _ => None,
    }
}

/// Detect the source kind of a JSON file.
pub fn detect_source_kind_from_path<P: AsRef<Path>>(path: P) -> Result<Option<SourceKind>> {
    let reader = BufReader::new(File::open(path)?);
    let value: Value = serde_json::from_reader(reader)?;
    Ok(detect_source_kind(&value))
}

/// Check that a JSON document can be read as the `expected` source.
///
/// Empty documents are accepted for every source.
pub fn expect_source_kind(value: &Value, expected: SourceKind) -> Result<()> {
    if is_empty_source(value) {
        return Ok(());
    }

    match detect_source_kind(value) {
        Some(kind) if kind == expected => Ok(()),
        Some(kind) => Err(Error::SourceShape(format!(
            "expected a {} source, found a {} source",
            expected, kind
        ))),
        None => Err(Error::SourceShape(format!(
            "unrecognised {} source",
            expected
        ))),
    }
}

/// Check whether a document holds no records at all (`null` or `[]`).
pub fn is_empty_source(value: &Value) -> bool {
    match value {
        Value::Array(items) => items.is_empty(),
        Value::Null => true,
        _ => false,
    }
}
