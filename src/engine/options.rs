//! Reconstruction options and configuration.

use std::ops::RangeInclusive;

use crate::error::{Error, Result};

/// Options for reconstructing a document.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// How context lines are collected for each region
    pub strategy: ContextStrategy,

    /// What happens to a line found at or below a region
    pub overrun: OverrunPolicy,

    /// Fail pages the lines source never mentions
    pub require_lines: bool,

    /// Whether to process pages in parallel
    pub parallel: bool,

    /// Which pages to reconstruct
    pub pages: PageSelection,
}

impl EngineOptions {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the context strategy.
    pub fn with_strategy(mut self, strategy: ContextStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the overrun policy.
    pub fn with_overrun(mut self, overrun: OverrunPolicy) -> Self {
        self.overrun = overrun;
        self
    }

    /// Require (or not) that every reconstructed page has a lines entry.
    pub fn with_require_lines(mut self, require: bool) -> Self {
        self.require_lines = require;
        self
    }

    /// Accept pages the lines source does not cover.
    pub fn lenient(mut self) -> Self {
        self.require_lines = false;
        self
    }

    /// Enable or disable parallel processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.pages = pages;
        self
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            strategy: ContextStrategy::Sequential,
            overrun: OverrunPolicy::Retain,
            require_lines: true,
            parallel: true,
            pages: PageSelection::All,
        }
    }
}

/// How lines are attributed to regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContextStrategy {
    /// Walk lines in order and stop at the first line that is not above the
    /// region.
    #[default]
    Sequential,
    /// Take every remaining line above the region, wherever it sits in the
    /// line order.
    Sweep,
}

/// What happens to a line that sits at or below the current region without
/// overlapping it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverrunPolicy {
    /// Leave the line for the next region
    #[default]
    Retain,
    /// Drop the line
    Discard,
}

/// Page selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageSelection {
    /// All pages
    #[default]
    All,
    /// A range of pages (inclusive, 1-indexed)
    Range(RangeInclusive<u32>),
    /// Specific pages (1-indexed)
    Pages(Vec<u32>),
    /// Several disjoint ranges, sorted
    Ranges(Vec<RangeInclusive<u32>>),
}

impl PageSelection {
    /// Check if a page number should be included.
    pub fn includes(&self, page: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page),
            PageSelection::Pages(pages) => pages.contains(&page),
            PageSelection::Ranges(ranges) => ranges.iter().any(|r| r.contains(&page)),
        }
    }

    /// Parse a page selection string (e.g., "1-10", "1,3,5,7-10").
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        if s.is_empty() || s == "all" {
            return Ok(PageSelection::All);
        }

        if let Some((start, end)) = s.split_once('-') {
            if !start.contains(',') && !end.contains(',') {
                let (start, end) = (parse_page(start)?, parse_page(end)?);
                if start > end {
                    return Err(Error::InvalidPageRange(s.to_string()));
                }
                return Ok(PageSelection::Range(start..=end));
            }
        }

        let mut ranges = Vec::new();
        for part in s.split(',') {
            let part = part.trim();
            if let Some((start, end)) = part.split_once('-') {
                let (start, end) = (parse_page(start)?, parse_page(end)?);
                if start > end {
                    return Err(Error::InvalidPageRange(part.to_string()));
                }
                ranges.push(start..=end);
            } else {
                let page = parse_page(part)?;
                ranges.push(page..=page);
            }
        }

        Ok(PageSelection::Ranges(merge_ranges(ranges)))
    }
}

/// Sort ranges and merge the ones that overlap or touch.
fn merge_ranges(mut ranges: Vec<RangeInclusive<u32>>) -> Vec<RangeInclusive<u32>> {
    ranges.sort_by_key(|r| *r.start());
    let mut merged: Vec<RangeInclusive<u32>> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if *range.start() <= last.end().saturating_add(1) => {
                if range.end() > last.end() {
                    *last = *last.start()..=*range.end();
                }
            }
            _ => merged.push(range),
        }
    }
    merged
}

fn parse_page(s: &str) -> Result<u32> {
    match s.trim().parse::<u32>() {
        Ok(p) if p >= 1 => Ok(p),
        _ => Err(Error::InvalidPageRange(format!(
            "invalid page number '{}'",
            s.trim()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_options_builder() {
        let options = EngineOptions::new()
            .with_strategy(ContextStrategy::Sweep)
            .with_overrun(OverrunPolicy::Discard)
            .lenient()
            .sequential();

        assert_eq!(options.strategy, ContextStrategy::Sweep);
        assert_eq!(options.overrun, OverrunPolicy::Discard);
        assert!(!options.require_lines);
        assert!(!options.parallel);
    }

    #[test]
    fn test_default_options() {
        let options = EngineOptions::default();
        assert_eq!(options.strategy, ContextStrategy::Sequential);
        assert_eq!(options.overrun, OverrunPolicy::Retain);
        assert!(options.require_lines);
        assert!(options.parallel);
    }

    #[test]
    fn test_page_selection_includes() {
        let range = PageSelection::Range(5..=10);
        assert!(!range.includes(4));
        assert!(range.includes(5));
        assert!(range.includes(10));
        assert!(!range.includes(11));

        let pages = PageSelection::Pages(vec![1, 3]);
        assert!(pages.includes(3));
        assert!(!pages.includes(2));
        assert!(PageSelection::All.includes(100));
    }

    #[test]
    fn test_page_selection_parse() {
        assert_eq!(PageSelection::parse("all").unwrap(), PageSelection::All);
        assert_eq!(
            PageSelection::parse("2-4").unwrap(),
            PageSelection::Range(2..=4)
        );
        assert_eq!(
            PageSelection::parse("5, 1,3-4,3").unwrap(),
            PageSelection::Ranges(vec![1..=1, 3..=5])
        );
    }

    #[test]
    fn test_page_selection_huge_range_stays_a_range() {
        let pages = PageSelection::parse("1,1-4000000000").unwrap();
        assert_eq!(pages, PageSelection::Ranges(vec![1..=4_000_000_000]));
        assert!(pages.includes(3_999_999_999));
        assert!(!pages.includes(4_000_000_001));

        let gaps = PageSelection::parse("10-12,2,4-5").unwrap();
        assert!(gaps.includes(2) && gaps.includes(11));
        assert!(!gaps.includes(3) && !gaps.includes(13));
    }

    #[test]
    fn test_page_selection_parse_errors() {
        assert!(PageSelection::parse("x").is_err());
        assert!(PageSelection::parse("4-2").is_err());
        assert!(PageSelection::parse("0").is_err());
        assert!(matches!(
            PageSelection::parse("1,,2"),
            Err(Error::InvalidPageRange(_))
        ));
    }
}
