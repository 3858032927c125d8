use balanced_maps::harness::{riffle_shuffle, sequential_keys};
use balanced_maps::{BasicRedBlackTree, KeyValueRef, LeftLeaningRedBlackTree, OrderedMap, TwoThreeExternalTree};
use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::collections::BTreeMap;
use std::hint::black_box;

const N: u32 = 10_000;

// ─── Key sequences ──────────────────────────────────────────────────────────

fn ordered_keys(n: u32) -> Vec<u32> {
    sequential_keys(n)
}

fn reverse_ordered_keys(n: u32) -> Vec<u32> {
    sequential_keys(n).into_iter().rev().collect()
}

fn random_keys(n: u32) -> Vec<u32> {
    let mut keys = sequential_keys(n);
    riffle_shuffle(&mut keys, 8, &mut SmallRng::seed_from_u64(12345));
    keys
}

fn key_orders() -> [(&'static str, Vec<u32>); 3] {
    [("ordered", ordered_keys(N)), ("reverse", reverse_ordered_keys(N)), ("random", random_keys(N))]
}

fn filled<T: OrderedMap<u32> + Default>(keys: &[u32]) -> T {
    let mut tree = T::default();
    for &k in keys {
        tree.insert(KeyValueRef::new(k, k));
    }
    tree
}

fn filled_btree(keys: &[u32]) -> BTreeMap<u32, u32> {
    keys.iter().map(|&k| (k, k)).collect()
}

// ─── Generic tree benchmarks ────────────────────────────────────────────────

fn bench_tree_insert<T: OrderedMap<u32> + Default>(c: &mut Criterion) {
    for (order, keys) in key_orders() {
        let mut group = c.benchmark_group(format!("insert_{order}"));
        group.bench_function(BenchmarkId::new(T::NAME, N), |b| {
            b.iter(|| filled::<T>(&keys));
        });
        group.finish();
    }
}

fn bench_tree_lookup<T: OrderedMap<u32> + Default>(c: &mut Criterion) {
    for (order, keys) in key_orders() {
        let tree = filled::<T>(&keys);
        let mut group = c.benchmark_group(format!("lookup_{order}"));
        group.bench_function(BenchmarkId::new(T::NAME, N), |b| {
            b.iter(|| {
                let mut sum = 0u64;
                for &k in &keys {
                    if let Some(v) = tree.lookup(black_box(k)) {
                        sum += u64::from(v);
                    }
                }
                sum
            });
        });
        group.finish();
    }
}

fn bench_tree_delete<T: OrderedMap<u32> + Default>(c: &mut Criterion) {
    for (order, keys) in key_orders() {
        let mut group = c.benchmark_group(format!("delete_{order}"));
        group.bench_function(BenchmarkId::new(T::NAME, N), |b| {
            b.iter_batched(
                || filled::<T>(&keys),
                |mut tree| {
                    for &k in &keys {
                        tree.delete(black_box(k));
                    }
                    tree
                },
                BatchSize::LargeInput,
            );
        });
        group.finish();
    }
}

// ─── BTreeMap baseline ──────────────────────────────────────────────────────

fn bench_btree(c: &mut Criterion) {
    for (order, keys) in key_orders() {
        c.benchmark_group(format!("insert_{order}")).bench_function(BenchmarkId::new("BTreeMap", N), |b| {
            b.iter(|| filled_btree(&keys));
        });

        let map = filled_btree(&keys);
        c.benchmark_group(format!("lookup_{order}")).bench_function(BenchmarkId::new("BTreeMap", N), |b| {
            b.iter(|| {
                let mut sum = 0u64;
                for &k in &keys {
                    if let Some(&v) = map.get(&black_box(k)) {
                        sum += u64::from(v);
                    }
                }
                sum
            });
        });

        c.benchmark_group(format!("delete_{order}")).bench_function(BenchmarkId::new("BTreeMap", N), |b| {
            b.iter_batched(
                || filled_btree(&keys),
                |mut map| {
                    for &k in &keys {
                        map.remove(&black_box(k));
                    }
                    map
                },
                BatchSize::LargeInput,
            );
        });
    }
}

fn bench_llrb(c: &mut Criterion) {
    bench_tree_insert::<LeftLeaningRedBlackTree<u32>>(c);
    bench_tree_lookup::<LeftLeaningRedBlackTree<u32>>(c);
    bench_tree_delete::<LeftLeaningRedBlackTree<u32>>(c);
}

fn bench_basic_rb(c: &mut Criterion) {
    bench_tree_insert::<BasicRedBlackTree<u32>>(c);
    bench_tree_lookup::<BasicRedBlackTree<u32>>(c);
    bench_tree_delete::<BasicRedBlackTree<u32>>(c);
}

fn bench_two_three(c: &mut Criterion) {
    bench_tree_insert::<TwoThreeExternalTree<u32>>(c);
    bench_tree_lookup::<TwoThreeExternalTree<u32>>(c);
    bench_tree_delete::<TwoThreeExternalTree<u32>>(c);
}

criterion_group!(tree_benches, bench_llrb, bench_basic_rb, bench_two_three, bench_btree);

criterion_main!(tree_benches);
