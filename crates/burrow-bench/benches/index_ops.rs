//! Criterion micro-benchmarks for the index structures.

use std::hint::black_box;

use burrow_arena::Arena;
use burrow_index::{HiBitSet, PagedSparseSet, SparseSet};
use criterion::{criterion_group, criterion_main, Criterion};

fn bench_sparse_set_churn(c: &mut Criterion) {
    c.bench_function("sparse_set_insert_remove_10k", |b| {
        b.iter(|| {
            let mut arena = Arena::default();
            let mut set = SparseSet::new();
            for k in 0..10_000u32 {
                set.set(&mut arena, k, k as u64);
            }
            for k in (0..10_000u32).step_by(2) {
                set.remove(&mut arena, k);
            }
            black_box(set.len())
        });
    });
}

fn bench_paged_sparse_keys(c: &mut Criterion) {
    c.bench_function("paged_sparse_set_spread_keys", |b| {
        b.iter(|| {
            let mut arena = Arena::default();
            let mut set = PagedSparseSet::integer(|v: &u32| *v);
            for page in 0..8u32 {
                let base = if page == 0 { 0 } else { 1 << (4 * page) };
                for k in base..base + 256 {
                    set.set(&mut arena, k, k);
                }
            }
            black_box(set.len())
        });
    });
}

fn bench_hibitset_iter_sparse(c: &mut Criterion) {
    let set: HiBitSet = (0..1_000_000u32).step_by(997).collect();
    c.bench_function("hibitset_iter_sparse_1m", |b| {
        b.iter(|| black_box(set.iter().count()));
    });
}

fn bench_hibitset_intersection(c: &mut Criterion) {
    let a: HiBitSet = (0..100_000u32).step_by(2).collect();
    let b_set: HiBitSet = (0..100_000u32).step_by(3).collect();
    let c_set: HiBitSet = (0..100_000u32).step_by(5).collect();
    c.bench_function("hibitset_intersection_of_3", |b| {
        b.iter(|| black_box(HiBitSet::intersection_of(&[&a, &b_set, &c_set]).count_ones()));
    });
}

criterion_group!(
    benches,
    bench_sparse_set_churn,
    bench_paged_sparse_keys,
    bench_hibitset_iter_sparse,
    bench_hibitset_intersection
);
criterion_main!(benches);
