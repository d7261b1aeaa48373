//! # docorder
//!
//! Spatial reconstruction of structured documents from detector output.
//!
//! A scanned document arrives as three independent detector outputs: tables,
//! key-value pairs and OCR lines, each carrying page numbers and bounding
//! polygons. This library fuses them into one reading-order sequence of
//! structured regions per page, each annotated with the free text that
//! precedes it.
//!
//! ## Quick Start
//!
//! ```no_run
//! use docorder::{reconstruct_files, render};
//!
//! fn main() -> docorder::Result<()> {
//!     let report = reconstruct_files("tables.json", "kv.json", "lines.json")?;
//!
//!     for region in report.regions() {
//!         println!("{}: {}", region.kind, region.context_text);
//!     }
//!
//!     let json = render::records_to_json(&report, render::JsonFormat::Pretty)?;
//!     std::fs::write("combined_structured_data.json", json)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! - **Standardize**: raw records become [`Fragment`]s and [`Line`]s grouped
//!   by page; malformed records are dropped and reported as [`Rejection`]s
//! - **Deduplicate**: key-values enclosed by a table are removed
//! - **Order**: tables and key-values merge into reading order
//! - **Attribute**: OCR lines above each region become its context text
//! - **Normalize** (optional): a [`Normalizer`] maps each region to JSON
//!
//! Pages are processed in parallel with Rayon; [`batch`] runs whole directory
//! trees on a bounded thread pool.

pub mod batch;
pub mod detect;
pub mod engine;
pub mod error;
pub mod model;
pub mod normalize;
pub mod render;
pub mod source;

// Re-export commonly used types
pub use batch::{run_batch, BatchEvent, BatchOptions, BatchReport, DocumentOutcome};
pub use detect::{detect_source_kind, detect_source_kind_from_path};
pub use engine::{
    ContextStrategy, EngineOptions, OverrunPolicy, PageSelection, Reconstructor,
};
pub use error::{Error, Result};
pub use model::{
    containment, overlaps, BoundingBox, DocumentReport, Fragment, FragmentKind, Line,
    PageFailure, PageRecord, Point, ReconstructionStats, RegionRecord, Rejection, SourceKind,
};
pub use normalize::{CommandNormalizer, Normalizer};
pub use render::JsonFormat;
pub use source::SourceSet;

use std::path::Path;
use std::sync::Arc;

/// Reconstruct a document from its three source files.
///
/// # Arguments
///
/// * `tables` - Path to the table detections
/// * `kv_pairs` - Path to the key-value detections
/// * `lines` - Path to the OCR lines
///
/// # Example
///
/// ```no_run
/// use docorder::reconstruct_files;
///
/// let report = reconstruct_files("tables.json", "kv.json", "lines.json").unwrap();
/// println!("Pages: {}", report.page_count());
/// ```
pub fn reconstruct_files<P: AsRef<Path>>(tables: P, kv_pairs: P, lines: P) -> Result<DocumentReport> {
    let source = SourceSet::from_paths(tables, kv_pairs, lines)?;
    Ok(Reconstructor::new().reconstruct(&source))
}

/// Reconstruct a document from its source files with custom options.
pub fn reconstruct_files_with_options<P: AsRef<Path>>(
    tables: P,
    kv_pairs: P,
    lines: P,
    options: EngineOptions,
) -> Result<DocumentReport> {
    let source = SourceSet::from_paths(tables, kv_pairs, lines)?;
    Ok(Reconstructor::with_options(options).reconstruct(&source))
}

/// Reconstruct a document from its three sources as JSON text.
///
/// # Example
///
/// ```
/// use docorder::reconstruct_str;
///
/// let tables = r#"{"tables": [{
///     "page_no": 1,
///     "table_bounding_region": {"point.x": [0, 100, 100, 0], "point.y": [50, 50, 90, 90]},
///     "cells": [{"rowIndex": 0, "columnIndex": 0, "content": "Total"}]
/// }]}"#;
/// let lines = r#"[{"page_no": 1, "content": [
///     {"text": "Invoice", "bbox": {"point.x": [0, 40, 40, 0], "point.y": [10, 10, 20, 20]}}
/// ]}]"#;
///
/// let report = reconstruct_str(tables, "[]", lines).unwrap();
/// assert_eq!(report.pages[0].regions[0].context_text, "Invoice");
/// ```
pub fn reconstruct_str(tables: &str, kv_pairs: &str, lines: &str) -> Result<DocumentReport> {
    let source = SourceSet::from_strs(tables, kv_pairs, lines)?;
    Ok(Reconstructor::new().reconstruct(&source))
}

/// Builder for reconstructing and rendering documents.
///
/// # Example
///
/// ```no_run
/// use docorder::{DocOrder, ContextStrategy};
///
/// let json = DocOrder::new()
///     .with_strategy(ContextStrategy::Sweep)
///     .lenient()
///     .reconstruct_files("tables.json", "kv.json", "lines.json")?
///     .to_json()?;
/// # Ok::<(), docorder::Error>(())
/// ```
#[derive(Clone, Default)]
pub struct DocOrder {
    options: EngineOptions,
    format: JsonFormat,
    normalizer: Option<Arc<dyn Normalizer>>,
}

impl std::fmt::Debug for DocOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocOrder")
            .field("options", &self.options)
            .field("format", &self.format)
            .field("normalizer", &self.normalizer.as_ref().map(|n| n.name()))
            .finish()
    }
}

impl DocOrder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept pages the lines source does not cover.
    pub fn lenient(mut self) -> Self {
        self.options = self.options.lenient();
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.options = self.options.sequential();
        self
    }

    /// Set the context strategy.
    pub fn with_strategy(mut self, strategy: ContextStrategy) -> Self {
        self.options = self.options.with_strategy(strategy);
        self
    }

    /// Set the overrun policy.
    pub fn with_overrun(mut self, overrun: OverrunPolicy) -> Self {
        self.options = self.options.with_overrun(overrun);
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.options = self.options.with_pages(pages);
        self
    }

    /// Set the JSON output format.
    pub fn with_format(mut self, format: JsonFormat) -> Self {
        self.format = format;
        self
    }

    /// Normalize every region.
    pub fn with_normalizer(mut self, normalizer: Arc<dyn Normalizer>) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    /// Build the configured reconstructor.
    pub fn reconstructor(&self) -> Reconstructor {
        let reconstructor = Reconstructor::with_options(self.options.clone());
        match &self.normalizer {
            Some(normalizer) => reconstructor.with_normalizer(Arc::clone(normalizer)),
            None => reconstructor,
        }
    }

    /// Reconstruct an already loaded source set.
    pub fn reconstruct(&self, source: &SourceSet) -> DocOrderResult {
        DocOrderResult {
            report: self.reconstructor().reconstruct(source),
            format: self.format,
        }
    }

    /// Load and reconstruct three source files.
    pub fn reconstruct_files<P: AsRef<Path>>(
        self,
        tables: P,
        kv_pairs: P,
        lines: P,
    ) -> Result<DocOrderResult> {
        let source = SourceSet::from_paths(tables, kv_pairs, lines)?;
        Ok(self.reconstruct(&source))
    }

    /// Parse and reconstruct three JSON strings.
    pub fn reconstruct_str(self, tables: &str, kv_pairs: &str, lines: &str) -> Result<DocOrderResult> {
        let source = SourceSet::from_strs(tables, kv_pairs, lines)?;
        Ok(self.reconstruct(&source))
    }
}

/// Result of reconstructing a document.
#[derive(Debug, Clone)]
pub struct DocOrderResult {
    /// The reconstructed document
    pub report: DocumentReport,
    /// Output format to use
    format: JsonFormat,
}

impl DocOrderResult {
    /// Render the attributed regions, keyed by page.
    pub fn to_json(&self) -> Result<String> {
        render::records_to_json(&self.report, self.format)
    }

    /// Render the merged fragments, keyed by page.
    pub fn merged_json(&self) -> Result<String> {
        render::merged_to_json(&self.report, self.format)
    }

    /// Render as plain text.
    pub fn to_text(&self) -> String {
        render::to_text(&self.report)
    }

    /// Get the report.
    pub fn report(&self) -> &DocumentReport {
        &self.report
    }
}
