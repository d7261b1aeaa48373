//! Integration tests for batch reconstruction over directory trees.

use std::fs;
use std::path::Path;

use serde_json::{json, Value};
use tempfile::TempDir;

use docorder::batch::{discover_sources, COMBINED_FILE, MERGED_FILE};
use docorder::{run_batch, BatchEvent, BatchOptions, EngineOptions, JsonFormat, Reconstructor};

fn rect(l: f64, t: f64, r: f64, b: f64) -> Value {
    json!({"point.x": [l, r, r, l], "point.y": [t, t, b, b]})
}

fn write(root: &Path, relative: &str, value: &Value) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

struct Tree {
    _dir: TempDir,
    options: BatchOptions,
}

/// Two documents with all sources, plus one with its lines file missing.
fn tree() -> Tree {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let options = BatchOptions::new(
        root.join("tables"),
        root.join("kv"),
        root.join("lines"),
        root.join("out"),
    );

    let tables = json!({"tables": [{
        "page_no": 1,
        "table_bounding_region": rect(0.0, 200.0, 500.0, 300.0),
        "cells": [{"rowIndex": 0, "columnIndex": 0, "content": "Total"}]
    }]});
    let kv = json!([{
        "page_number": 1,
        "key_bounding_box": rect(0.0, 400.0, 80.0, 420.0),
        "value_bounding_box": rect(90.0, 400.0, 200.0, 420.0),
        "key": "Signed",
        "value": "Yes"
    }]);
    let lines = json!([{"page_no": 1, "content": [
        {"text": "Statement", "bbox": rect(0.0, 100.0, 200.0, 120.0)}
    ]}]);

    for doc in ["alpha.json", "nested/beta.json", "nested/gamma.json"] {
        write(&options.tables_dir, doc, &tables);
        write(&options.kv_dir, doc, &kv);
        if doc != "nested/gamma.json" {
            write(&options.lines_dir, doc, &lines);
        }
    }
    fs::write(options.tables_dir.join("README.txt"), "not a source").unwrap();

    Tree { _dir: dir, options }
}

#[test]
fn test_discovers_json_sources() {
    let tree = tree();
    let found = discover_sources(&tree.options.tables_dir).unwrap();
    let found: Vec<String> = found
        .iter()
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .collect();
    assert_eq!(
        found,
        vec!["alpha.json", "nested/beta.json", "nested/gamma.json"]
    );
}

#[test]
fn test_batch_writes_mirrored_outputs() {
    let tree = tree();
    let report = run_batch(&tree.options, &Reconstructor::new(), None).unwrap();

    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 1);

    let out = &tree.options.output_dir;
    for doc in ["alpha", "nested/beta"] {
        let combined: Value =
            serde_json::from_str(&fs::read_to_string(out.join(doc).join(COMBINED_FILE)).unwrap())
                .unwrap();
        let regions = combined["1"].as_array().unwrap();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0]["context_text"], "Statement");
        assert_eq!(regions[1]["content"], "Signed Yes");

        assert!(out.join(doc).join(MERGED_FILE).exists());
    }
    assert!(!out.join("nested/gamma").join(COMBINED_FILE).exists());
}

#[test]
fn test_failed_document_keeps_error() {
    let tree = tree();
    let report = run_batch(&tree.options, &Reconstructor::new(), None).unwrap();

    let failed: Vec<_> = report.outcomes.iter().filter(|o| !o.is_ok()).collect();
    assert_eq!(failed.len(), 1);
    assert!(failed[0].relative_path.ends_with("gamma.json"));
    assert!(failed[0].error.as_deref().unwrap().contains("gamma.json"));
    assert!(failed[0].stats.is_none());

    assert_eq!(report.stats().pages, 2);
    assert_eq!(report.stats().kv_pairs, 2);
}

#[test]
fn test_batch_publishes_events() {
    let tree = tree();
    let (tx, rx) = crossbeam_channel::unbounded();
    let options = tree.options.clone().with_jobs(2);

    let reconstructor = Reconstructor::with_options(EngineOptions::new().sequential());
    run_batch(&options, &reconstructor, Some(tx)).unwrap();

    let events: Vec<BatchEvent> = rx.iter().collect();
    assert!(matches!(events[0], BatchEvent::Discovered(3)));
    let started = events
        .iter()
        .filter(|e| matches!(e, BatchEvent::Started(_)))
        .count();
    let finished = events
        .iter()
        .filter(|e| matches!(e, BatchEvent::Finished(_)))
        .count();
    assert_eq!(started, 3);
    assert_eq!(finished, 3);
}

#[test]
fn test_compact_output() {
    let tree = tree();
    let options = tree.options.clone().with_format(JsonFormat::Compact);
    run_batch(&options, &Reconstructor::new(), None).unwrap();

    let text = fs::read_to_string(options.output_dir.join("alpha").join(COMBINED_FILE)).unwrap();
    assert!(!text.contains('\n'));
}

#[test]
fn test_missing_tables_dir() {
    let dir = tempfile::tempdir().unwrap();
    let options = BatchOptions::new(
        dir.path().join("missing"),
        dir.path().join("kv"),
        dir.path().join("lines"),
        dir.path().join("out"),
    );
    assert!(run_batch(&options, &Reconstructor::new(), None).is_err());
}
