// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for `understory_resolve` and `understory_binding`.

use std::sync::Arc;

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::json;

use understory_binding::{DynamicPropertyBinder, KeyConfig};
use understory_resolve::{PipelineConfig, ResolutionPipeline, StaticSampleSource};
use understory_value::{Feature, FeatureId, PropertyTree, PropertyValue};

fn layer() -> PropertyTree {
    PropertyTree::from_json(&json!({
        "size": 2,
        "outline": { "width": 1, "color": "#000000" },
        "color": { "expression": { "conditions": [
            ["${feature.property.height} > 50", "#ff0000"],
            ["${feature.property.height} > 10", "#ffaa00"],
            ["true", "#cccccc"]
        ] } },
        "label": { "expression": { "conditions": [
            ["${feature.property.name} != ''", "${feature.property.name}"]
        ] } },
        "position": { "timeDependent": true, "x": 0, "y": 0 }
    }))
    .unwrap()
}

fn features(count: usize) -> Vec<Feature> {
    (0..count)
        .map(|i| {
            Feature::new(format!("f{i}"))
                .with_attribute("height", PropertyValue::from((i % 100) as f64))
                .with_attribute("name", format!("feature {i}"))
        })
        .collect()
}

fn binder() -> Arc<DynamicPropertyBinder> {
    Arc::new(DynamicPropertyBinder::with_source(
        KeyConfig::default(),
        StdRng::seed_from_u64(3),
    ))
}

fn bench_resolve(c: &mut Criterion) {
    let layer = layer();
    let mut group = c.benchmark_group("resolve");

    for count in [100_usize, 1000] {
        let features = features(count);

        group.bench_function(BenchmarkId::new("cold", count), |b| {
            let config = PipelineConfig::builder().cache_capacity(0).build();
            let mut pipeline =
                ResolutionPipeline::with_config(config, binder(), Arc::new(StaticSampleSource));
            b.iter(|| black_box(pipeline.resolve(&layer, None, &features)));
        });

        group.bench_function(BenchmarkId::new("cached", count), |b| {
            let mut pipeline = ResolutionPipeline::new(binder(), Arc::new(StaticSampleSource));
            pipeline.resolve(&layer, None, &features);
            b.iter(|| black_box(pipeline.resolve(&layer, None, &features)));
        });
    }
    group.finish();

    let mut group = c.benchmark_group("binding");
    group.bench_function("bind_unbind", |b| {
        let binder = binder();
        let feature = FeatureId::new("f");
        b.iter(|| {
            let binding = binder.bind(feature.clone(), "position", || PropertyValue::Null);
            black_box(binder.unbind(binding.key()))
        });
    });
    group.bench_function("sample", |b| {
        let binder = binder();
        let binding = binder.bind(FeatureId::new("f"), "position", || PropertyValue::from(1.0));
        b.iter(|| black_box(binder.sample(binding.key())));
    });
    group.bench_function("bind_10k", |b| {
        b.iter_batched(
            binder,
            |binder| {
                for i in 0..10_000 {
                    binder.bind(FeatureId::new(format!("f{i}")), "v", || PropertyValue::Null);
                }
                binder
            },
            BatchSize::LargeInput,
        );
    });
    group.finish();
}

criterion_group!(benches, bench_resolve);
criterion_main!(benches);
