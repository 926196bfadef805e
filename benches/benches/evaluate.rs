// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for `understory_expr`.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use understory_expr::{CompiledConditions, evaluate, parse_condition};
use understory_value::{ConditionsExpression, Expression, Feature};

fn ladder(branches: usize) -> ConditionsExpression {
    let mut conditions = ConditionsExpression::new();
    for i in (0..branches).rev() {
        conditions.push(
            format!(
                "${{feature.property.height}} > {} && ${{feature.property.kind}} == 'building'",
                i * 10
            ),
            format!("#{i:06x}"),
        );
    }
    conditions.push("true", "${feature.property.fallback}");
    conditions
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("expr");

    group.bench_function("parse_condition", |b| {
        b.iter(|| {
            black_box(parse_condition(
                "(${feature.property.height} >= 10 || !${feature.property.flat}) && ${feature.property.name} != 'shed'",
            ))
        });
    });

    let feature = Feature::new("f")
        .with_attribute("height", 55.0)
        .with_attribute("kind", "building")
        .with_attribute("fallback", "#cccccc");
    for branches in [2_usize, 8, 32] {
        let conditions = ladder(branches);
        let compiled = CompiledConditions::compile(&conditions);
        group.bench_function(BenchmarkId::new("compiled", branches), |b| {
            b.iter(|| black_box(compiled.evaluate(&feature)));
        });
        let expression = Expression::Conditions(conditions);
        group.bench_function(BenchmarkId::new("uncompiled", branches), |b| {
            b.iter(|| black_box(evaluate(&expression, &feature)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_evaluate);
criterion_main!(benches);
