//! Conversion of raw detector records into uniform fragments and lines.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use crate::error::{Error, Result};
use crate::model::{BoundingBox, Fragment, Line, Point, Rejection, SourceKind, MIN_POINTS};

use super::raw::{page_field, PointArrays, RawCell, RawKvPair, RawLinePage, RawTable};
use super::SourceSet;

/// Fragments and lines of one document, grouped by page number.
#[derive(Debug, Clone, Default)]
pub struct StandardizedSource {
    /// Table fragments per page, in source order
    pub tables: BTreeMap<u32, Vec<Fragment>>,

    /// Key-value fragments per page, in source order
    pub kv_pairs: BTreeMap<u32, Vec<Fragment>>,

    /// OCR lines per page, in source order
    pub lines: BTreeMap<u32, Vec<Line>>,

    /// Pages the lines source mentions, even without any usable line
    pub line_pages: BTreeSet<u32>,

    /// Records that were dropped
    pub rejections: Vec<Rejection>,
}

impl StandardizedSource {
    /// Pages holding at least one table or key-value fragment.
    pub fn structured_pages(&self) -> BTreeSet<u32> {
        self.tables
            .iter()
            .chain(self.kv_pairs.iter())
            .filter(|(_, fragments)| !fragments.is_empty())
            .map(|(page, _)| *page)
            .collect()
    }

    /// Every page any source mentions.
    pub fn all_pages(&self) -> BTreeSet<u32> {
        self.tables
            .keys()
            .chain(self.kv_pairs.keys())
            .chain(self.lines.keys())
            .chain(self.line_pages.iter())
            .copied()
            .collect()
    }

    fn reject(&mut self, source: SourceKind, page_no: Option<u32>, index: usize, err: &Error) {
        log::warn!(
            "Dropping {} record #{} (page {:?}): {}",
            source,
            index,
            page_no,
            err
        );
        self.rejections.push(Rejection {
            source,
            page_no,
            index,
            reason: err.to_string(),
        });
    }
}

/// Standardize all three sources of a document.
///
/// Records already rejected while loading come first in the result.
pub fn standardize(source: &SourceSet) -> StandardizedSource {
    let mut out = StandardizedSource {
        rejections: source.rejections.clone(),
        ..Default::default()
    };

    for (index, raw) in source.tables.iter().enumerate() {
        match standardize_table(raw) {
            Ok(fragment) => out.tables.entry(fragment.page_no).or_default().push(fragment),
            Err(err) => {
                let page = coerce_page_no(page_field(&raw.page_no, &raw.page_number)).ok();
                out.reject(SourceKind::Tables, page, index, &err);
            }
        }
    }

    for (index, raw) in source.kv_pairs.iter().enumerate() {
        match standardize_kv(raw) {
            Ok(fragment) => out
                .kv_pairs
                .entry(fragment.page_no)
                .or_default()
                .push(fragment),
            Err(err) => {
                let page = coerce_page_no(page_field(&raw.page_number, &raw.page_no)).ok();
                out.reject(SourceKind::KeyValues, page, index, &err);
            }
        }
    }

    let mut line_index = 0;
    for raw_page in &source.lines {
        let page_no = match coerce_page_no(page_field(&raw_page.page_no, &raw_page.page_number)) {
            Ok(page_no) => page_no,
            Err(err) => {
                // Every line of the page goes with it.
                for _ in &raw_page.content {
                    out.reject(SourceKind::Lines, None, line_index, &err);
                    line_index += 1;
                }
                continue;
            }
        };

        out.line_pages.insert(page_no);
        for line in standardize_line_page(page_no, raw_page) {
            match line {
                Ok(line) => out.lines.entry(page_no).or_default().push(line),
                Err(err) => out.reject(SourceKind::Lines, Some(page_no), line_index, &err),
            }
            line_index += 1;
        }
    }

    log::debug!(
        "Standardized {} table pages, {} key-value pages, {} line pages ({} rejected)",
        out.tables.len(),
        out.kv_pairs.len(),
        out.line_pages.len(),
        out.rejections.len()
    );

    out
}

/// Coerce a page identifier to a 1-indexed page number.
///
/// Integers, integral floats and integer strings are accepted.
pub fn coerce_page_no(value: Option<&Value>) -> Result<u32> {
    let value = value.ok_or_else(|| Error::InvalidPageNumber("missing".into()))?;

    let page = match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u32::MAX as f64)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };

    match page {
        Some(p) if p >= 1 && p <= u32::MAX as u64 => Ok(p as u32),
        _ => Err(Error::InvalidPageNumber(value.to_string())),
    }
}

/// Standardize a table record.
pub fn standardize_table(raw: &RawTable) -> Result<Fragment> {
    let page_no = coerce_page_no(page_field(&raw.page_no, &raw.page_number))?;
    let bbox = to_bbox(raw.table_bounding_region.as_ref())?;
    Ok(Fragment::table(page_no, bbox, serialize_grid(&raw.cells)))
}

/// Serialize table cells row-major: cells joined by tabs, rows by newlines.
///
/// Missing cells within a row become empty strings; the column count is
/// taken from the widest row of the table.
pub fn serialize_grid(cells: &[RawCell]) -> String {
    let mut grid: BTreeMap<usize, BTreeMap<usize, &str>> = BTreeMap::new();
    for cell in cells {
        grid.entry(cell.row_index)
            .or_default()
            .insert(cell.col_index, cell.text.as_deref().unwrap_or(""));
    }

    let columns = grid
        .values()
        .filter_map(|row| row.keys().next_back())
        .max()
        .map(|c| c + 1)
        .unwrap_or(0);

    grid.values()
        .map(|row| {
            (0..columns)
                .map(|c| row.get(&c).copied().unwrap_or(""))
                .collect::<Vec<_>>()
                .join("\t")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Standardize a key-value record.
///
/// With both boxes present the geometry spans from the key's left corners to
/// the value's right corners; otherwise whichever box is usable is taken.
pub fn standardize_kv(raw: &RawKvPair) -> Result<Fragment> {
    let page_no = coerce_page_no(page_field(&raw.page_number, &raw.page_no))?;

    let key = points_of(raw.key_bounding_box.as_ref());
    let value = points_of(raw.value_bounding_box.as_ref());

    let points = if key.len() >= MIN_POINTS && value.len() >= MIN_POINTS {
        vec![key[0], value[1], value[2], key[3]]
    } else if key.len() >= MIN_POINTS || value.len() < MIN_POINTS {
        key
    } else {
        value
    };
    let bbox = BoundingBox::new(points)?;

    let key_text = raw.key.as_deref().unwrap_or("");
    let content = match raw.value.as_deref() {
        Some(value) if !value.is_empty() => format!("{} {}", key_text, value),
        _ => key_text.to_string(),
    };

    Ok(Fragment::kv_pair(page_no, bbox, content))
}

/// Standardize the lines of one page, keeping per-line failures.
pub fn standardize_line_page(page_no: u32, raw: &RawLinePage) -> Vec<Result<Line>> {
    raw.content
        .iter()
        .map(|line| {
            let bbox = to_bbox(line.bbox.as_ref())?;
            Ok(Line::new(page_no, bbox, line.text.as_deref().unwrap_or("")))
        })
        .collect()
}

fn points_of(arrays: Option<&PointArrays>) -> Vec<Point> {
    arrays
        .map(|a| {
            a.xs.iter()
                .zip(a.ys.iter())
                .map(|(&x, &y)| Point::new(x, y))
                .collect()
        })
        .unwrap_or_default()
}

fn to_bbox(arrays: Option<&PointArrays>) -> Result<BoundingBox> {
    match arrays {
        Some(a) if !a.is_empty() => BoundingBox::from_coords(&a.xs, &a.ys),
        _ => Err(Error::InvalidGeometry("missing bounding box".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FragmentKind;
    use crate::source::raw::RawLine;
    use serde_json::json;

    fn square(l: f64, t: f64, r: f64, b: f64) -> PointArrays {
        PointArrays::from_points(&[(l, t), (r, t), (r, b), (l, b)])
    }

    fn cell(row: usize, col: usize, text: &str) -> RawCell {
        RawCell {
            row_index: row,
            col_index: col,
            text: Some(text.to_string()),
        }
    }

    #[test]
    fn test_coerce_page_no() {
        assert_eq!(coerce_page_no(Some(&json!(3))).unwrap(), 3);
        assert_eq!(coerce_page_no(Some(&json!(" 12 "))).unwrap(), 12);
        assert_eq!(coerce_page_no(Some(&json!(2.0))).unwrap(), 2);

        assert!(coerce_page_no(None).is_err());
        assert!(coerce_page_no(Some(&json!("N/A"))).is_err());
        assert!(coerce_page_no(Some(&json!("2.0"))).is_err());
        assert!(coerce_page_no(Some(&json!(2.5))).is_err());
        assert!(coerce_page_no(Some(&json!(0))).is_err());
        assert!(coerce_page_no(Some(&json!(-1))).is_err());
        assert!(coerce_page_no(Some(&json!(true))).is_err());
    }

    #[test]
    fn test_serialize_grid_fills_missing_cells() {
        let cells = vec![
            cell(0, 0, "Name"),
            cell(0, 1, "Age"),
            cell(1, 0, "Alice"),
            cell(2, 1, "25"),
        ];
        assert_eq!(serialize_grid(&cells), "Name\tAge\nAlice\t\n\t25");
    }

    #[test]
    fn test_serialize_grid_orders_cells() {
        let cells = vec![cell(1, 1, "d"), cell(0, 1, "b"), cell(1, 0, "c"), cell(0, 0, "a")];
        assert_eq!(serialize_grid(&cells), "a\tb\nc\td");
        assert_eq!(serialize_grid(&[]), "");
    }

    #[test]
    fn test_standardize_table() {
        let raw = RawTable {
            page_no: Some(json!("2")),
            page_number: None,
            table_bounding_region: Some(square(0.0, 10.0, 100.0, 50.0)),
            cells: vec![cell(0, 0, "x")],
        };
        let fragment = standardize_table(&raw).unwrap();
        assert_eq!(fragment.page_no, 2);
        assert_eq!(fragment.kind, FragmentKind::Table);
        assert_eq!(fragment.bbox.top(), 10.0);
        assert_eq!(fragment.content, "x");
    }

    #[test]
    fn test_standardize_table_without_region() {
        let raw = RawTable {
            page_number: Some(json!(1)),
            ..Default::default()
        };
        assert!(matches!(
            standardize_table(&raw),
            Err(Error::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_standardize_kv_combined_box() {
        let raw = RawKvPair {
            page_number: Some(json!(1)),
            key_bounding_box: Some(square(10.0, 20.0, 40.0, 30.0)),
            value_bounding_box: Some(square(50.0, 22.0, 90.0, 32.0)),
            key: Some("Name:".into()),
            value: Some("John".into()),
            ..Default::default()
        };
        let fragment = standardize_kv(&raw).unwrap();
        let points: Vec<(f64, f64)> = fragment.bbox.points().iter().map(|&p| p.into()).collect();
        assert_eq!(
            points,
            vec![(10.0, 20.0), (90.0, 22.0), (90.0, 32.0), (10.0, 30.0)]
        );
        assert_eq!(fragment.content, "Name: John");
    }

    #[test]
    fn test_standardize_kv_key_only() {
        let raw = RawKvPair {
            page_number: Some(json!(4)),
            key_bounding_box: Some(square(10.0, 20.0, 40.0, 30.0)),
            value_bounding_box: Some(PointArrays::default()),
            key: Some("Signature".into()),
            value: Some(String::new()),
            ..Default::default()
        };
        let fragment = standardize_kv(&raw).unwrap();
        assert_eq!(fragment.bbox.left(), 10.0);
        assert_eq!(fragment.bbox.right(), 40.0);
        assert_eq!(fragment.content, "Signature");
    }

    #[test]
    fn test_standardize_kv_value_only() {
        let raw = RawKvPair {
            page_no: Some(json!(1)),
            value_bounding_box: Some(square(50.0, 22.0, 90.0, 32.0)),
            value: Some("orphan".into()),
            ..Default::default()
        };
        let fragment = standardize_kv(&raw).unwrap();
        assert_eq!(fragment.bbox.left(), 50.0);
        assert_eq!(fragment.content, " orphan");
    }

    #[test]
    fn test_standardize_rejects_and_groups() {
        let source = SourceSet {
            tables: vec![
                RawTable {
                    page_no: Some(json!(1)),
                    table_bounding_region: Some(square(0.0, 0.0, 10.0, 10.0)),
                    ..Default::default()
                },
                RawTable {
                    page_no: Some(json!("N/A")),
                    table_bounding_region: Some(square(0.0, 0.0, 10.0, 10.0)),
                    ..Default::default()
                },
            ],
            kv_pairs: vec![RawKvPair {
                page_number: Some(json!(2)),
                key_bounding_box: Some(PointArrays::from_points(&[(0.0, 0.0), (1.0, 0.0)])),
                key: Some("short".into()),
                ..Default::default()
            }],
            lines: vec![
                RawLinePage {
                    page_no: Some(json!(1)),
                    page_number: None,
                    content: vec![
                        RawLine {
                            text: Some("ok".into()),
                            bbox: Some(square(0.0, 0.0, 5.0, 1.0)),
                        },
                        RawLine {
                            text: Some("flat".into()),
                            bbox: Some(square(0.0, 3.0, 5.0, 3.0)),
                        },
                    ],
                },
                RawLinePage {
                    page_no: Some(json!(3)),
                    page_number: None,
                    content: vec![],
                },
            ],
            ..Default::default()
        };

        let out = standardize(&source);
        assert_eq!(out.tables.get(&1).map(Vec::len), Some(1));
        assert!(out.kv_pairs.is_empty());
        assert_eq!(out.lines.get(&1).map(Vec::len), Some(1));
        assert!(out.line_pages.contains(&3));
        assert_eq!(out.structured_pages().into_iter().collect::<Vec<_>>(), vec![1]);
        assert_eq!(out.all_pages().into_iter().collect::<Vec<_>>(), vec![1, 3]);

        assert_eq!(out.rejections.len(), 3);
        let sources: Vec<SourceKind> = out.rejections.iter().map(|r| r.source).collect();
        assert_eq!(
            sources,
            vec![SourceKind::Tables, SourceKind::KeyValues, SourceKind::Lines]
        );
        assert_eq!(out.rejections[0].page_no, None);
        assert_eq!(out.rejections[1].page_no, Some(2));
        assert_eq!(out.rejections[2].index, 1);
    }
}
