//! Document-level results, failures and statistics.

use serde::{Deserialize, Serialize};

use super::{PageRecord, RegionRecord, SourceKind};

/// A source record dropped during standardization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    /// Source the record came from
    pub source: SourceKind,

    /// Page number, when it could be determined
    pub page_no: Option<u32>,

    /// Position of the record within its source
    pub index: usize,

    /// Why the record was dropped
    pub reason: String,
}

/// A page that could not be reconstructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageFailure {
    /// Page number (1-indexed)
    pub page_no: u32,

    /// Error message
    pub error: String,
}

/// Counters collected while reconstructing documents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconstructionStats {
    /// Pages that produced a record
    pub pages: u32,

    /// Pages without any table or key-value fragment
    pub pages_skipped: u32,

    /// Pages that failed
    pub pages_failed: u32,

    /// Table fragments emitted
    pub tables: u32,

    /// Key-value fragments emitted
    pub kv_pairs: u32,

    /// Key-value fragments dropped because a table encloses them
    pub kv_pairs_deduplicated: u32,

    /// OCR lines considered on reconstructed pages
    pub lines: u32,

    /// Lines attributed as context
    pub lines_attributed: u32,

    /// Lines discarded because they sit on a region
    pub lines_discarded: u32,

    /// Context lines dropped because structured content repeats them
    pub lines_filtered: u32,

    /// Lines never reached by any region
    pub lines_unattributed: u32,

    /// Source records rejected during standardization
    pub rejected: u32,

    /// Regions whose normalization failed
    pub normalize_failures: u32,
}

impl ReconstructionStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add another set of counters to this one.
    pub fn merge(&mut self, other: &ReconstructionStats) {
        self.pages += other.pages;
        self.pages_skipped += other.pages_skipped;
        self.pages_failed += other.pages_failed;
        self.tables += other.tables;
        self.kv_pairs += other.kv_pairs;
        self.kv_pairs_deduplicated += other.kv_pairs_deduplicated;
        self.lines += other.lines;
        self.lines_attributed += other.lines_attributed;
        self.lines_discarded += other.lines_discarded;
        self.lines_filtered += other.lines_filtered;
        self.lines_unattributed += other.lines_unattributed;
        self.rejected += other.rejected;
        self.normalize_failures += other.normalize_failures;
    }

    /// Total regions emitted.
    pub fn regions(&self) -> u32 {
        self.tables + self.kv_pairs
    }
}

/// Everything produced for one document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentReport {
    /// Reconstructed pages sorted by page number
    pub pages: Vec<PageRecord>,

    /// Pages that failed
    pub failures: Vec<PageFailure>,

    /// Records dropped during standardization
    pub rejections: Vec<Rejection>,

    /// Counters
    pub stats: ReconstructionStats,
}

impl DocumentReport {
    /// Get a page by number.
    pub fn page(&self, page_no: u32) -> Option<&PageRecord> {
        self.pages.iter().find(|p| p.page_no == page_no)
    }

    /// Number of reconstructed pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Iterate over every region of every page in order.
    pub fn regions(&self) -> impl Iterator<Item = &RegionRecord> {
        self.pages.iter().flat_map(|p| p.regions.iter())
    }

    /// Whether no page failed and no record was rejected.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.rejections.is_empty()
    }
}
