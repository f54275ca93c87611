//! Criterion benchmarks for world mutation and cached queries.

use std::hint::black_box;

use burrow_bench::{churn, reference_world};
use burrow_test_utils::{Enemy, Health, Position, Velocity};
use burrow_world::QueryContext;
use criterion::{criterion_group, criterion_main, Criterion};

fn bench_build_reference(c: &mut Criterion) {
    c.bench_function("world_build_reference_10k", |b| {
        b.iter(|| black_box(reference_world().0.entity_count()));
    });
}

fn bench_query_scan(c: &mut Criterion) {
    let (mut world, _) = reference_world();
    let query = world.query().with::<Position>().with::<Velocity>().build();
    c.bench_function("query_scan_position_velocity", |b| {
        b.iter(|| {
            let mut ctx = QueryContext::new();
            black_box(ctx.run(&world, &query).len())
        });
    });
}

fn bench_query_exact(c: &mut Criterion) {
    let (mut world, _) = reference_world();
    let query = world.query().with::<Position>().with::<Velocity>().build();
    let mut ctx = QueryContext::new();
    ctx.run(&world, &query);
    c.bench_function("query_exact_hit", |b| {
        b.iter(|| black_box(ctx.run(&world, &query).len()));
    });
}

fn bench_query_refine(c: &mut Criterion) {
    let (mut world, _) = reference_world();
    let enemies = world.query().with::<Health>().with_tag::<Enemy>().build();
    let wide = world
        .query()
        .with::<Health>()
        .with::<Position>()
        .with_tag::<Enemy>()
        .build();
    c.bench_function("query_refine_from_enemies", |b| {
        b.iter(|| {
            let mut ctx = QueryContext::new();
            ctx.run(&world, &enemies);
            black_box(ctx.run(&world, &wide).len())
        });
    });
}

fn bench_entity_churn(c: &mut Criterion) {
    let (mut world, mut ids) = reference_world();
    c.bench_function("entity_churn_every_7th", |b| {
        b.iter(|| churn(&mut world, &mut ids, 7));
    });
}

criterion_group!(
    benches,
    bench_build_reference,
    bench_query_scan,
    bench_query_exact,
    bench_query_refine,
    bench_entity_churn
);
criterion_main!(benches);
