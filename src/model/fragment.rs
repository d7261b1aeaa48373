//! Fragment and line types.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::BoundingBox;

/// The kind of a structured fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentKind {
    /// A detected table
    Table,
    /// A detected key-value pair
    KvPair,
}

impl FragmentKind {
    /// Name used in serialized output.
    pub fn as_str(&self) -> &'static str {
        match self {
            FragmentKind::Table => "table",
            FragmentKind::KvPair => "kv_pair",
        }
    }
}

impl fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The detector output a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Table detections
    Tables,
    /// Key-value detections
    KeyValues,
    /// OCR line detections
    Lines,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SourceKind::Tables => "tables",
            SourceKind::KeyValues => "key-values",
            SourceKind::Lines => "lines",
        })
    }
}

/// A structured region on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    /// Page number (1-indexed)
    pub page_no: u32,

    /// Fragment kind
    pub kind: FragmentKind,

    /// Bounding polygon
    pub bbox: BoundingBox,

    /// Serialized text content
    pub content: String,
}

impl Fragment {
    /// Create a table fragment.
    pub fn table(page_no: u32, bbox: BoundingBox, content: impl Into<String>) -> Self {
        Self {
            page_no,
            kind: FragmentKind::Table,
            bbox,
            content: content.into(),
        }
    }

    /// Create a key-value fragment.
    pub fn kv_pair(page_no: u32, bbox: BoundingBox, content: impl Into<String>) -> Self {
        Self {
            page_no,
            kind: FragmentKind::KvPair,
            bbox,
            content: content.into(),
        }
    }

    /// Check if this fragment is a table.
    pub fn is_table(&self) -> bool {
        self.kind == FragmentKind::Table
    }

    /// Check if this fragment is a key-value pair.
    pub fn is_kv_pair(&self) -> bool {
        self.kind == FragmentKind::KvPair
    }
}

/// A raw OCR text line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    /// Page number (1-indexed)
    pub page_no: u32,

    /// Bounding polygon
    pub bbox: BoundingBox,

    /// Recognized text
    pub text: String,
}

impl Line {
    /// Create a new line.
    pub fn new(page_no: u32, bbox: BoundingBox, text: impl Into<String>) -> Self {
        Self {
            page_no,
            bbox,
            text: text.into(),
        }
    }
}
