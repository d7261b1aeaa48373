//! Removal of key-value fragments that a table already covers.

use crate::model::Fragment;

/// Drop every key-value fragment fully enclosed by one of `tables`.
///
/// Returns the surviving fragments in their original order and the number
/// removed. Partial overlap does not remove a fragment.
pub fn dedup_kv_pairs(tables: &[Fragment], kv_pairs: Vec<Fragment>) -> (Vec<Fragment>, usize) {
    let before = kv_pairs.len();
    let kept: Vec<Fragment> = kv_pairs
        .into_iter()
        .filter(|kv| {
            let enclosing = tables.iter().find(|table| table.bbox.contains(&kv.bbox));
            if let Some(table) = enclosing {
                log::debug!(
                    "Page {}: dropping key-value '{}' inside table at {}",
                    kv.page_no,
                    kv.content,
                    table.bbox
                );
            }
            enclosing.is_none()
        })
        .collect();

    let removed = before - kept.len();
    (kept, removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BoundingBox;

    fn table(l: f64, t: f64, r: f64, b: f64) -> Fragment {
        Fragment::table(1, BoundingBox::from_rect(l, t, r, b).unwrap(), "t")
    }

    fn kv(l: f64, t: f64, r: f64, b: f64, content: &str) -> Fragment {
        Fragment::kv_pair(1, BoundingBox::from_rect(l, t, r, b).unwrap(), content)
    }

    #[test]
    fn test_drops_enclosed_kv() {
        let tables = vec![table(0.0, 100.0, 500.0, 300.0)];
        let kvs = vec![
            kv(10.0, 110.0, 200.0, 130.0, "inside"),
            kv(10.0, 400.0, 200.0, 420.0, "outside"),
        ];

        let (kept, removed) = dedup_kv_pairs(&tables, kvs);
        assert_eq!(removed, 1);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].content, "outside");
    }

    #[test]
    fn test_keeps_partial_overlap() {
        let tables = vec![table(0.0, 100.0, 500.0, 300.0)];
        let kvs = vec![kv(400.0, 280.0, 600.0, 320.0, "straddling")];

        let (kept, removed) = dedup_kv_pairs(&tables, kvs);
        assert_eq!(removed, 0);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_any_table_encloses() {
        let tables = vec![table(0.0, 0.0, 50.0, 50.0), table(0.0, 100.0, 500.0, 300.0)];
        let kvs = vec![kv(10.0, 150.0, 20.0, 160.0, "second table")];

        let (kept, removed) = dedup_kv_pairs(&tables, kvs);
        assert!(kept.is_empty());
        assert_eq!(removed, 1);
    }

    #[test]
    fn test_idempotent() {
        let tables = vec![table(0.0, 100.0, 500.0, 300.0)];
        let kvs = vec![
            kv(10.0, 110.0, 200.0, 130.0, "inside"),
            kv(10.0, 400.0, 200.0, 420.0, "outside"),
            kv(450.0, 250.0, 600.0, 320.0, "straddling"),
        ];

        let (once, _) = dedup_kv_pairs(&tables, kvs);
        let (twice, removed) = dedup_kv_pairs(&tables, once.clone());
        assert_eq!(once, twice);
        assert_eq!(removed, 0);
    }

    #[test]
    fn test_no_tables() {
        let kvs = vec![kv(10.0, 110.0, 200.0, 130.0, "alone")];
        let (kept, removed) = dedup_kv_pairs(&[], kvs);
        assert_eq!(kept.len(), 1);
        assert_eq!(removed, 0);
    }
}
