use std::collections::BTreeMap;
use std::hint::black_box;

use avl_tree::AvlTreeMap;
use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};

const N: usize = 10_000;

// ─── Key sequences ──────────────────────────────────────────────────────────

fn ordered_keys(n: usize) -> Vec<i64> {
    (0..n as i64).collect()
}

fn reverse_ordered_keys(n: usize) -> Vec<i64> {
    (0..n as i64).rev().collect()
}

fn random_keys(n: usize) -> Vec<i64> {
    // Use a simple LCG for deterministic pseudo-random sequence
    let mut keys = Vec::with_capacity(n);
    let mut x: u64 = 12345;
    for _ in 0..n {
        x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
        keys.push((x >> 33) as i64);
    }
    keys
}

fn patterns() -> [(&'static str, Vec<i64>); 3] {
    [
        ("ordered", ordered_keys(N)),
        ("reverse", reverse_ordered_keys(N)),
        ("random", random_keys(N)),
    ]
}

// ─── CRUD ───────────────────────────────────────────────────────────────────

fn bench_insert(c: &mut Criterion) {
    for (pattern, keys) in patterns() {
        let mut group = c.benchmark_group(format!("map_insert_{pattern}"));

        group.bench_function(BenchmarkId::new("AvlTreeMap", N), |b| {
            b.iter(|| {
                let mut map = AvlTreeMap::new();
                for &k in &keys {
                    map.insert(k, k);
                }
                map
            });
        });

        group.bench_function(BenchmarkId::new("BTreeMap", N), |b| {
            b.iter(|| {
                let mut map = BTreeMap::new();
                for &k in &keys {
                    map.insert(k, k);
                }
                map
            });
        });

        group.finish();
    }
}

fn bench_get(c: &mut Criterion) {
    for (pattern, keys) in patterns() {
        let avl_map: AvlTreeMap<i64, i64> = keys.iter().map(|&k| (k, k)).collect();
        let bt_map: BTreeMap<i64, i64> = keys.iter().map(|&k| (k, k)).collect();
        let mut group = c.benchmark_group(format!("map_get_{pattern}"));

        group.bench_function(BenchmarkId::new("AvlTreeMap", N), |b| {
            b.iter(|| keys.iter().filter_map(|k| avl_map.get(k)).fold(0i64, |sum, &v| sum.wrapping_add(v)));
        });

        group.bench_function(BenchmarkId::new("BTreeMap", N), |b| {
            b.iter(|| keys.iter().filter_map(|k| bt_map.get(k)).fold(0i64, |sum, &v| sum.wrapping_add(v)));
        });

        group.finish();
    }
}

fn bench_remove(c: &mut Criterion) {
    for (pattern, keys) in patterns() {
        let avl_map: AvlTreeMap<i64, i64> = keys.iter().map(|&k| (k, k)).collect();
        let bt_map: BTreeMap<i64, i64> = keys.iter().map(|&k| (k, k)).collect();
        let mut group = c.benchmark_group(format!("map_remove_{pattern}"));

        group.bench_function(BenchmarkId::new("AvlTreeMap", N), |b| {
            b.iter_batched(
                || avl_map.clone(),
                |mut map| {
                    for k in &keys {
                        map.remove(k);
                    }
                    map
                },
                BatchSize::SmallInput,
            );
        });

        group.bench_function(BenchmarkId::new("BTreeMap", N), |b| {
            b.iter_batched(
                || bt_map.clone(),
                |mut map| {
                    for k in &keys {
                        map.remove(k);
                    }
                    map
                },
                BatchSize::SmallInput,
            );
        });

        group.finish();
    }
}

// ─── Order statistics ───────────────────────────────────────────────────────

fn bench_neighbor_and_rank(c: &mut Criterion) {
    // Even keys only, so every odd probe misses and exercises the neighbor walk.
    let avl_map: AvlTreeMap<i64, i64> = (0..N as i64).map(|k| (k * 2, k)).collect();
    let bt_map: BTreeMap<i64, i64> = (0..N as i64).map(|k| (k * 2, k)).collect();
    let probes: Vec<i64> = random_keys(N).into_iter().map(|k| k.rem_euclid(2 * N as i64)).collect();

    let mut group = c.benchmark_group("map_ceiling_random");
    group.bench_function(BenchmarkId::new("AvlTreeMap", N), |b| {
        b.iter(|| probes.iter().filter_map(|p| avl_map.ceiling(p)).count());
    });
    group.bench_function(BenchmarkId::new("BTreeMap", N), |b| {
        b.iter(|| probes.iter().filter_map(|p| bt_map.range(p..).next()).count());
    });
    group.finish();

    let mut group = c.benchmark_group("map_count_lesser_random");
    group.bench_function(BenchmarkId::new("AvlTreeMap", N), |b| {
        b.iter(|| probes.iter().map(|p| avl_map.count_lesser(p)).sum::<usize>());
    });
    // BTreeMap has no cached counts; counting is a linear walk of the range.
    group.bench_function(BenchmarkId::new("BTreeMap", N), |b| {
        b.iter(|| probes.iter().take(100).map(|p| bt_map.range(..p).count()).sum::<usize>());
    });
    group.finish();

    let mut group = c.benchmark_group("map_get_by_rank");
    group.bench_function(BenchmarkId::new("AvlTreeMap", N), |b| {
        b.iter(|| (0..N).filter_map(|rank| avl_map.get_by_rank(black_box(rank))).count());
    });
    group.finish();
}

// ─── Criterion Groups ───────────────────────────────────────────────────────

criterion_group!(map_crud_benches, bench_insert, bench_get, bench_remove);

criterion_group!(map_order_statistic_benches, bench_neighbor_and_rank);

criterion_main!(map_crud_benches, map_order_statistic_benches);
