//! Reading-order merge of table and key-value fragments.

use crate::model::Fragment;

/// Merge tables and key-value fragments into one reading-order sequence.
///
/// Sorted by top edge, then by the x of the topmost point. The sort is
/// stable, so identical positions keep tables before key-values and source
/// order within each kind.
pub fn order_regions(tables: Vec<Fragment>, kv_pairs: Vec<Fragment>) -> Vec<Fragment> {
    let mut regions = tables;
    regions.extend(kv_pairs);
    regions.sort_by(|a, b| a.bbox.reading_cmp(&b.bbox));
    regions
}
