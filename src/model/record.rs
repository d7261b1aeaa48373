//! Reconstructed page records.

use serde::{Deserialize, Serialize};

use super::{BoundingBox, Fragment, FragmentKind};

/// A structured fragment in reading order, with the text that precedes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionRecord {
    /// Page number (1-indexed)
    pub page_no: u32,

    /// Fragment kind
    pub kind: FragmentKind,

    /// Bounding polygon
    pub bbox: BoundingBox,

    /// Serialized fragment content
    pub content: String,

    /// Attributed context lines joined by newlines
    pub context_text: String,

    /// Field-value JSON produced by the normalization collaborator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized: Option<serde_json::Value>,

    /// Why normalization failed for this region
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalize_error: Option<String>,
}

impl RegionRecord {
    /// Create a record from a fragment and its context text.
    pub fn new(fragment: Fragment, context_text: impl Into<String>) -> Self {
        Self {
            page_no: fragment.page_no,
            kind: fragment.kind,
            bbox: fragment.bbox,
            content: fragment.content,
            context_text: context_text.into(),
            normalized: None,
            normalize_error: None,
        }
    }

    /// Check if any context text was attributed.
    pub fn has_context(&self) -> bool {
        !self.context_text.is_empty()
    }

    /// Context lines as a list.
    pub fn context_lines(&self) -> Vec<&str> {
        if self.context_text.is_empty() {
            Vec::new()
        } else {
            self.context_text.split('\n').collect()
        }
    }
}

/// The reconstructed content of one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    /// Page number (1-indexed)
    pub page_no: u32,

    /// Regions in reading order with their context
    pub regions: Vec<RegionRecord>,

    /// Ordered, de-duplicated fragments before attribution
    pub merged: Vec<Fragment>,
}

impl PageRecord {
    /// Number of regions on the page.
    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// Check if the page has no regions.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment() -> Fragment {
        let bbox = BoundingBox::from_rect(0.0, 0.0, 10.0, 10.0).unwrap();
        Fragment::kv_pair(1, bbox, "Name John")
    }

    #[test]
    fn test_region_record_from_fragment() {
        let record = RegionRecord::new(fragment(), "Header\nSub header");
        assert_eq!(record.page_no, 1);
        assert_eq!(record.kind, FragmentKind::KvPair);
        assert!(record.has_context());
        assert_eq!(record.context_lines(), vec!["Header", "Sub header"]);
    }

    #[test]
    fn test_empty_context() {
        let record = RegionRecord::new(fragment(), "");
        assert!(!record.has_context());
        assert!(record.context_lines().is_empty());
    }

    #[test]
    fn test_optional_fields_skipped() {
        let json = serde_json::to_value(RegionRecord::new(fragment(), "")).unwrap();
        assert!(json.get("normalized").is_none());
        assert!(json.get("normalize_error").is_none());
        assert_eq!(json["context_text"], "");
    }
}
