//! Attribution of OCR lines to the region they precede.
//!
//! Lines are visited through a forward-only [`LineCursor`]; a line that has
//! been attributed or discarded is never looked at again, so every line ends
//! up in at most one region's context. The fate of every line is recorded in
//! [`Attribution::fates`].

use crate::model::{BoundingBox, Fragment, Line};

use super::options::{ContextStrategy, OverrunPolicy};

/// What happened to a line during attribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineFate {
    /// Added to the context of the region at this index
    Attributed(usize),
    /// Taken by the region at this index but dropped because structured
    /// content already holds its text
    Filtered(usize),
    /// Discarded while attributing the region at this index
    Discarded(usize),
    /// Never consumed by any region
    Unattributed,
}

/// Result of attributing a page's lines.
#[derive(Debug, Clone, Default)]
pub struct Attribution {
    /// Context text per region, aligned with the region order
    pub contexts: Vec<String>,

    /// Fate of every line, aligned with the line order
    pub fates: Vec<LineFate>,
}

impl Attribution {
    fn count(&self, pred: impl Fn(&LineFate) -> bool) -> usize {
        self.fates.iter().filter(|f| pred(f)).count()
    }

    /// Lines that made it into a context.
    pub fn attributed(&self) -> usize {
        self.count(|f| matches!(f, LineFate::Attributed(_)))
    }

    /// Lines dropped as duplicates of structured content.
    pub fn filtered(&self) -> usize {
        self.count(|f| matches!(f, LineFate::Filtered(_)))
    }

    /// Lines discarded as sitting on a region.
    pub fn discarded(&self) -> usize {
        self.count(|f| matches!(f, LineFate::Discarded(_)))
    }

    /// Lines no region consumed.
    pub fn unattributed(&self) -> usize {
        self.count(|f| matches!(f, LineFate::Unattributed))
    }
}

/// A forward-only cursor over a page's lines.
#[derive(Debug, Clone)]
pub struct LineCursor<'a> {
    lines: &'a [Line],
    pos: usize,
}

impl<'a> LineCursor<'a> {
    /// Create a cursor positioned at the first line.
    pub fn new(lines: &'a [Line]) -> Self {
        Self { lines, pos: 0 }
    }

    /// The current line, if any remain.
    pub fn peek(&self) -> Option<&'a Line> {
        self.lines.get(self.pos)
    }

    /// Move past the current line and return its index.
    pub fn advance(&mut self) -> usize {
        let index = self.pos;
        self.pos = (self.pos + 1).min(self.lines.len());
        index
    }

    /// Index of the current line.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Lines not consumed yet.
    pub fn remaining(&self) -> &'a [Line] {
        &self.lines[self.pos..]
    }

    /// Check if every line has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.lines.len()
    }
}

/// Trimmed contents of every structured fragment on a page.
///
/// Taken before deduplication, so key-values dropped for sitting inside a
/// table still filter the lines that repeat them.
pub fn structured_texts<'a, I>(fragments: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Fragment>,
{
    fragments
        .into_iter()
        .map(|f| f.content.trim().to_string())
        .collect()
}

/// Attribute lines to the ordered regions of one page.
///
/// A taken line whose text occurs in any of `structured` is filtered out of
/// the context.
pub fn attribute_context(
    regions: &[Fragment],
    lines: &[Line],
    structured: &[String],
    strategy: ContextStrategy,
    overrun: OverrunPolicy,
) -> Attribution {
    let mut attribution = Attribution {
        contexts: Vec::with_capacity(regions.len()),
        fates: vec![LineFate::Unattributed; lines.len()],
    };
    let restricted: Vec<&BoundingBox> = regions.iter().map(|r| &r.bbox).collect();

    match strategy {
        ContextStrategy::Sequential => {
            sequential(regions, lines, &restricted, overrun, &mut attribution)
        }
        ContextStrategy::Sweep => sweep(regions, lines, &restricted, &mut attribution),
    }

    // Turn the taken lines of each region into its context text.
    for region_index in 0..regions.len() {
        let mut context = Vec::new();
        for (line_index, fate) in attribution.fates.iter_mut().enumerate() {
            if *fate != LineFate::Attributed(region_index) {
                continue;
            }
            let text = lines[line_index].text.trim();
            if is_repeated(text, structured) {
                *fate = LineFate::Filtered(region_index);
            } else {
                context.push(text);
            }
        }
        attribution.contexts.push(context.join("\n"));
    }

    attribution
}

fn sequential(
    regions: &[Fragment],
    lines: &[Line],
    restricted: &[&BoundingBox],
    overrun: OverrunPolicy,
    attribution: &mut Attribution,
) {
    let mut cursor = LineCursor::new(lines);

    for (region_index, region) in regions.iter().enumerate() {
        let top = region.bbox.top();

        while let Some(line) = cursor.peek() {
            if sits_on_region(line, region, restricted) {
                let index = cursor.advance();
                attribution.fates[index] = LineFate::Discarded(region_index);
                break;
            }

            if line.bbox.bottom() < top {
                let index = cursor.advance();
                attribution.fates[index] = LineFate::Attributed(region_index);
                continue;
            }

            if overrun == OverrunPolicy::Discard {
                let index = cursor.advance();
                attribution.fates[index] = LineFate::Discarded(region_index);
            }
            break;
        }

        if cursor.is_exhausted() {
            break;
        }
    }

    log::trace!(
        "Sequential attribution stopped at line {} of {}",
        cursor.position(),
        lines.len()
    );
}

fn sweep(
    regions: &[Fragment],
    lines: &[Line],
    restricted: &[&BoundingBox],
    attribution: &mut Attribution,
) {
    for (region_index, region) in regions.iter().enumerate() {
        let top = region.bbox.top();

        for (index, line) in lines.iter().enumerate() {
            if attribution.fates[index] != LineFate::Unattributed {
                continue;
            }
            if sits_on_region(line, region, restricted) {
                attribution.fates[index] = LineFate::Discarded(region_index);
            } else if line.bbox.bottom() < top {
                attribution.fates[index] = LineFate::Attributed(region_index);
            }
        }
    }
}

/// A line that coincides with any region box, or overlaps the current one,
/// is part of structured content rather than context for it.
fn sits_on_region(line: &Line, region: &Fragment, restricted: &[&BoundingBox]) -> bool {
    restricted.iter().any(|bbox| **bbox == line.bbox) || line.bbox.overlaps(&region.bbox)
}

fn is_repeated(text: &str, structured: &[String]) -> bool {
    !text.is_empty() && structured.iter().any(|content| content.contains(text))
}
