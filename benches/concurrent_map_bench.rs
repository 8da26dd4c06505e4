use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use guarded_map::{ConcurrentHashMap, ConcurrentMap};
use std::collections::hash_map::RandomState;
use std::thread;
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

fn bench_insert(c: &mut Criterion) {
    c.bench_function("concurrent_map_insert_10k", |b| {
        b.iter_batched(
            ConcurrentMap::<String, u64>::new,
            |m| {
                for (i, x) in lcg(1).take(10_000).enumerate() {
                    m.insert(key(x), i as u64);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
    c.bench_function("concurrent_hash_map_insert_10k", |b| {
        b.iter_batched(
            || ConcurrentHashMap::<String, u64>::with_hasher(RandomState::new()),
            |m| {
                for (i, x) in lcg(1).take(10_000).enumerate() {
                    m.insert(key(x), i as u64);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_find_copy_hit(c: &mut Criterion) {
    c.bench_function("concurrent_map_find_copy_hit", |b| {
        let m = ConcurrentMap::new();
        let keys: Vec<_> = lcg(7).take(20_000).map(key).collect();
        for (i, k) in keys.iter().cloned().enumerate() {
            m.insert(k, i as u64);
        }
        let mut it = keys.iter().cycle();
        b.iter(|| {
            let k = it.next().unwrap();
            black_box(m.find_copy(k));
        })
    });
}

fn bench_find_copy_miss(c: &mut Criterion) {
    c.bench_function("concurrent_map_find_copy_miss", |b| {
        let m = ConcurrentMap::new();
        for (i, x) in lcg(11).take(10_000).enumerate() {
            m.insert(key(x), i as u64);
        }
        let mut miss = lcg(0xdead_beef);
        b.iter(|| {
            // generate keys unlikely in map
            let k = key(miss.next().unwrap());
            black_box(m.find_copy(&k));
        })
    });
}

fn bench_find_and_increment(c: &mut Criterion) {
    c.bench_function("concurrent_map_find_and_increment", |b| {
        let m = ConcurrentMap::new();
        m.insert(1u64, 0u64);
        b.iter(|| {
            m.find_and(&1, |v| *v = v.wrapping_add(1));
        })
    });
}

// Four threads hammering disjoint keys; measures lock contention.
fn bench_contended_insert_remove(c: &mut Criterion) {
    c.bench_function("concurrent_map_contended_4x1k", |b| {
        let m = ConcurrentMap::new();
        b.iter(|| {
            thread::scope(|s| {
                for t in 0..4u64 {
                    let m = &m;
                    s.spawn(move || {
                        for i in 0..1_000u64 {
                            let k = t << 32 | i;
                            m.insert(k, i);
                            black_box(m.remove(&k));
                        }
                    });
                }
            });
        })
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(50)
        .measurement_time(Duration::from_secs(8))
        .warm_up_time(Duration::from_secs(2))
}

criterion_group! {
    name = benches;
    config = bench_config();
    targets = bench_insert, bench_find_copy_hit, bench_find_copy_miss,
        bench_find_and_increment, bench_contended_insert_remove
}
criterion_main!(benches);
