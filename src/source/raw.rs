//! Raw detector output shapes.
//!
//! These mirror the JSON the upstream detectors write. Every field is
//! optional at this level; the standardizer decides what is usable.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Polygon coordinates as parallel x and y arrays.
///
/// Coordinates that are not numbers are kept as NaN so the record fails
/// geometry validation on its own instead of failing the whole source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointArrays {
    /// X coordinates
    #[serde(rename = "point.x", alias = "x", default, deserialize_with = "coords")]
    pub xs: Vec<f64>,

    /// Y coordinates
    #[serde(rename = "point.y", alias = "y", default, deserialize_with = "coords")]
    pub ys: Vec<f64>,
}

fn coords<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let coord = |v: &Value| v.as_f64().unwrap_or(f64::NAN);
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => Vec::new(),
        Value::Array(items) => items.iter().map(coord).collect(),
        other => vec![coord(&other)],
    })
}

impl PointArrays {
    /// Create coordinate arrays from points.
    pub fn from_points(points: &[(f64, f64)]) -> Self {
        Self {
            xs: points.iter().map(|p| p.0).collect(),
            ys: points.iter().map(|p| p.1).collect(),
        }
    }

    /// Number of complete (x, y) pairs.
    pub fn len(&self) -> usize {
        self.xs.len().min(self.ys.len())
    }

    /// Check if no complete pair exists.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A detected table with its cells.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTable {
    /// Page identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_no: Option<Value>,

    /// Alternative page identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<Value>,

    /// Table polygon
    #[serde(default, alias = "bounding_region")]
    pub table_bounding_region: Option<PointArrays>,

    /// Cells in any order
    #[serde(default)]
    pub cells: Vec<RawCell>,
}

/// A single table cell.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCell {
    /// Row index (0-based)
    #[serde(default, alias = "rowIndex")]
    pub row_index: usize,

    /// Column index (0-based)
    #[serde(default, alias = "columnIndex", alias = "column_index")]
    pub col_index: usize,

    /// Cell text
    #[serde(default, alias = "content")]
    pub text: Option<String>,
}

/// A detected key-value pair.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawKvPair {
    /// Page identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<Value>,

    /// Alternative page identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_no: Option<Value>,

    /// Key polygon
    #[serde(default)]
    pub key_bounding_box: Option<PointArrays>,

    /// Value polygon
    #[serde(default)]
    pub value_bounding_box: Option<PointArrays>,

    /// Key text
    #[serde(default)]
    pub key: Option<String>,

    /// Value text
    #[serde(default)]
    pub value: Option<String>,
}

/// All OCR lines of one page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawLinePage {
    /// Page identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_no: Option<Value>,

    /// Alternative page identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<Value>,

    /// Lines in document order
    #[serde(default, alias = "lines")]
    pub content: Vec<RawLine>,
}

/// A single OCR line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawLine {
    /// Recognized text
    #[serde(default, alias = "content")]
    pub text: Option<String>,

    /// Line polygon
    #[serde(default, alias = "polygon")]
    pub bbox: Option<PointArrays>,
}

/// Pick the page identifier from the preferred and the alternative field.
///
/// A preferred value that is null, zero, false or empty falls through to the
/// alternative; when that is missing too the preferred value is returned so
/// the rejection names it.
pub(crate) fn page_field<'a>(first: &'a Option<Value>, second: &'a Option<Value>) -> Option<&'a Value> {
    let first = first.as_ref().filter(|v| !v.is_null());
    let second = second.as_ref().filter(|v| !v.is_null());
    match first {
        Some(v) if !is_blank(v) => Some(v),
        _ => second.or(first),
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}
