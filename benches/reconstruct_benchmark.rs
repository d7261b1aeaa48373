//! Benchmarks for docorder reconstruction performance.
//!
//! Run with: cargo bench
//!
//! These benchmarks reconstruct synthetic documents of growing size.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::{json, Value};

use docorder::{BoundingBox, EngineOptions, Reconstructor, SourceSet};

fn rect(l: f64, t: f64, r: f64, b: f64) -> Value {
    json!({"point.x": [l, r, r, l], "point.y": [t, t, b, b]})
}

/// Creates a synthetic document: per page two tables, a column of key-values
/// and a line above every region.
fn create_sources(page_count: u32) -> SourceSet {
    let mut tables = Vec::new();
    let mut kv_pairs = Vec::new();
    let mut lines = Vec::new();

    for page in 1..=page_count {
        let mut page_lines = Vec::new();

        for (i, top) in [300.0, 900.0].iter().enumerate() {
            let cells: Vec<Value> = (0..20)
                .map(|c| json!({"rowIndex": c / 4, "columnIndex": c % 4, "content": format!("cell {}", c)}))
                .collect();
            tables.push(json!({
                "page_no": page,
                "table_bounding_region": rect(50.0, *top, 550.0, top + 200.0),
                "cells": cells
            }));
            page_lines.push(json!({
                "text": format!("Table {} heading", i),
                "bbox": rect(50.0, top - 30.0, 300.0, top - 10.0)
            }));
        }

        for k in 0..15 {
            let top = 40.0 + k as f64 * 80.0;
            kv_pairs.push(json!({
                "page_number": page,
                "key_bounding_box": rect(600.0, top, 680.0, top + 20.0),
                "value_bounding_box": rect(690.0, top, 780.0, top + 20.0),
                "key": format!("Field {}", k),
                "value": format!("Value {}", k)
            }));
            page_lines.push(json!({
                "text": format!("Note {}", k),
                "bbox": rect(600.0, top - 25.0, 700.0, top - 5.0)
            }));
        }

        lines.push(json!({"page_no": page, "content": page_lines}));
    }

    SourceSet::from_values(json!({ "tables": tables }), json!(kv_pairs), json!(lines))
        .unwrap_or_default()
}

/// Benchmark the geometry predicates.
fn bench_geometry(c: &mut Criterion) {
    let outer = BoundingBox::from_rect(0.0, 0.0, 500.0, 500.0).unwrap();
    let inner = BoundingBox::from_rect(10.0, 10.0, 100.0, 100.0).unwrap();
    let apart = BoundingBox::from_rect(600.0, 600.0, 700.0, 700.0).unwrap();

    c.bench_function("contains", |b| {
        b.iter(|| black_box(&outer).contains(black_box(&inner)));
    });

    c.bench_function("overlaps_disjoint", |b| {
        b.iter(|| black_box(&outer).overlaps(black_box(&apart)));
    });
}

/// Benchmark full reconstruction at various sizes.
fn bench_reconstruction(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconstruction");

    for page_count in [1, 10, 50].iter() {
        let sources = create_sources(*page_count);

        group.bench_function(format!("{}_pages_parallel", page_count), |b| {
            let reconstructor = Reconstructor::new();
            b.iter(|| reconstructor.reconstruct(black_box(&sources)));
        });

        group.bench_function(format!("{}_pages_sequential", page_count), |b| {
            let reconstructor = Reconstructor::with_options(EngineOptions::new().sequential());
            b.iter(|| reconstructor.reconstruct(black_box(&sources)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_geometry, bench_reconstruction);
criterion_main!(benches);
