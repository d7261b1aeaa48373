//! Page reconstruction engine.
//!
//! For every page carrying at least one table or key-value fragment the
//! engine removes key-values enclosed by tables, merges what remains into
//! reading order, and attributes the preceding OCR lines to each region.

mod attribute;
mod dedup;
mod options;
mod order;

pub use attribute::{attribute_context, structured_texts, Attribution, LineCursor, LineFate};
pub use dedup::dedup_kv_pairs;
pub use options::{ContextStrategy, EngineOptions, OverrunPolicy, PageSelection};
pub use order::order_regions;

use std::sync::Arc;

use rayon::prelude::*;

use crate::error::Error;
use crate::model::{
    DocumentReport, Fragment, Line, PageFailure, PageRecord, ReconstructionStats, RegionRecord,
};
use crate::normalize::{self, Normalizer};
use crate::source::{standardize, SourceSet, StandardizedSource};

/// Reconstructs documents from their detector sources.
#[derive(Clone, Default)]
pub struct Reconstructor {
    options: EngineOptions,
    normalizer: Option<Arc<dyn Normalizer>>,
}

impl std::fmt::Debug for Reconstructor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconstructor")
            .field("options", &self.options)
            .field("normalizer", &self.normalizer.as_ref().map(|n| n.name()))
            .finish()
    }
}

/// Inputs of a single page after standardization.
struct PageInput {
    page_no: u32,
    tables: Vec<Fragment>,
    kv_pairs: Vec<Fragment>,
    lines: Vec<Line>,
}

impl Reconstructor {
    /// Create a reconstructor with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a reconstructor with the given options.
    pub fn with_options(options: EngineOptions) -> Self {
        Self {
            options,
            normalizer: None,
        }
    }

    /// Normalize every region with `normalizer`.
    pub fn with_normalizer(mut self, normalizer: Arc<dyn Normalizer>) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    /// Get the options.
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Reconstruct a whole document.
    pub fn reconstruct(&self, source: &SourceSet) -> DocumentReport {
        let standardized = standardize(source);
        self.reconstruct_standardized(standardized)
    }

    /// Reconstruct a document whose sources are already standardized.
    pub fn reconstruct_standardized(&self, mut source: StandardizedSource) -> DocumentReport {
        let mut stats = ReconstructionStats {
            rejected: source.rejections.len() as u32,
            ..Default::default()
        };
        let mut failures = Vec::new();
        let mut inputs = Vec::new();

        let structured = source.structured_pages();
        stats.pages_skipped = source
            .all_pages()
            .iter()
            .filter(|page| !structured.contains(page) && self.options.pages.includes(**page))
            .count() as u32;

        for page_no in structured {
            if !self.options.pages.includes(page_no) {
                continue;
            }

            if self.options.require_lines && !source.line_pages.contains(&page_no) {
                let err = Error::MissingLines(page_no);
                log::warn!("Page {} failed: {}", page_no, err);
                failures.push(PageFailure {
                    page_no,
                    error: err.to_string(),
                });
                stats.pages_failed += 1;
                continue;
            }

            inputs.push(PageInput {
                page_no,
                tables: source.tables.remove(&page_no).unwrap_or_default(),
                kv_pairs: source.kv_pairs.remove(&page_no).unwrap_or_default(),
                lines: source.lines.remove(&page_no).unwrap_or_default(),
            });
        }

        let results: Vec<(PageRecord, ReconstructionStats)> = if self.options.parallel {
            inputs
                .into_par_iter()
                .map(|input| self.reconstruct_page(input))
                .collect()
        } else {
            inputs
                .into_iter()
                .map(|input| self.reconstruct_page(input))
                .collect()
        };

        let mut pages = Vec::with_capacity(results.len());
        for (page, page_stats) in results {
            stats.merge(&page_stats);
            pages.push(page);
        }
        pages.sort_by_key(|p| p.page_no);

        log::debug!(
            "Reconstructed {} pages ({} skipped, {} failed, {} regions)",
            stats.pages,
            stats.pages_skipped,
            stats.pages_failed,
            stats.regions()
        );

        DocumentReport {
            pages,
            failures,
            rejections: source.rejections,
            stats,
        }
    }

    fn reconstruct_page(&self, input: PageInput) -> (PageRecord, ReconstructionStats) {
        let PageInput {
            page_no,
            tables,
            kv_pairs,
            lines,
        } = input;
        let mut stats = ReconstructionStats {
            pages: 1,
            lines: lines.len() as u32,
            ..Default::default()
        };

        let structured = structured_texts(tables.iter().chain(&kv_pairs));
        let (kv_pairs, removed) = dedup_kv_pairs(&tables, kv_pairs);
        stats.kv_pairs_deduplicated = removed as u32;
        stats.tables = tables.len() as u32;
        stats.kv_pairs = kv_pairs.len() as u32;

        let merged = order_regions(tables, kv_pairs);
        let attribution = attribute_context(
            &merged,
            &lines,
            &structured,
            self.options.strategy,
            self.options.overrun,
        );
        stats.lines_attributed = attribution.attributed() as u32;
        stats.lines_discarded = attribution.discarded() as u32;
        stats.lines_filtered = attribution.filtered() as u32;
        stats.lines_unattributed = attribution.unattributed() as u32;

        let mut regions: Vec<RegionRecord> = merged
            .iter()
            .cloned()
            .zip(attribution.contexts)
            .map(|(fragment, context)| RegionRecord::new(fragment, context))
            .collect();

        if let Some(normalizer) = &self.normalizer {
            for region in &mut regions {
                if !normalize::apply(normalizer.as_ref(), region) {
                    stats.normalize_failures += 1;
                }
            }
        }

        log::debug!(
            "Page {}: {} regions, {} of {} lines attributed",
            page_no,
            regions.len(),
            stats.lines_attributed,
            stats.lines
        );

        (
            PageRecord {
                page_no,
                regions,
                merged,
            },
            stats,
        )
    }
}
