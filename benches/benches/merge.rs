// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for `understory_value` deep merge.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use serde_json::{Value, json};

use understory_value::{PropertyTree, merge, merge_all};

fn layer(fields: usize) -> PropertyTree {
    let mut object = serde_json::Map::new();
    for i in 0..fields {
        object.insert(
            format!("field{i}"),
            json!({
                "color": "#ff0000",
                "size": i,
                "offset": { "x": 0, "y": 1, "z": 2 },
                "stops": [{ "at": 0, "value": 1 }, { "at": 1, "value": 2 }]
            }),
        );
    }
    PropertyTree::from_json(&Value::Object(object)).unwrap()
}

fn overrides(fields: usize) -> PropertyTree {
    let mut object = serde_json::Map::new();
    for i in (0..fields).step_by(3) {
        object.insert(
            format!("field{i}"),
            json!({ "offset": { "y": 5 }, "stops": [{ "value": 9 }] }),
        );
    }
    PropertyTree::from_json(&Value::Object(object)).unwrap()
}

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("value/merge");
    for fields in [8_usize, 64, 512] {
        let base = layer(fields);
        let over = overrides(fields);
        group.bench_function(BenchmarkId::new("layer_over_base", fields), |b| {
            b.iter(|| black_box(merge(&base, &over)));
        });
    }

    let base = layer(64);
    let stack: Vec<PropertyTree> = (0..4).map(|_| overrides(64)).collect();
    let mut trees = vec![base];
    trees.extend(stack);
    group.bench_function("merge_all/5x64", |b| {
        b.iter(|| black_box(merge_all(&trees)));
    });
    group.finish();
}

criterion_group!(benches, bench_merge);
criterion_main!(benches);
