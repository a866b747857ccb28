//! Performance benchmarks for the cache engine.
//!
//! Measures `access` throughput under a streaming (cold, mostly-miss)
//! pattern and a looping (hot, mostly-hit) pattern, and `undo` throughput
//! unwinding a full trace stack.

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use ripes_cache::{Cache, CacheConfig, AccessType, ReplacementPolicy, WriteAllocPolicy, WritePolicy};

fn lru_writeback_config() -> CacheConfig {
    CacheConfig {
        blocks_log2: 2,
        lines_log2: 6,
        ways_log2: 2,
        write_policy: WritePolicy::WriteBack,
        write_alloc: WriteAllocPolicy::WriteAllocate,
        repl_policy: ReplacementPolicy::Lru,
    }
}

fn bench_streaming_access(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache_access");
    group.throughput(Throughput::Elements(4096));
    group.bench_function("streaming_mostly_miss", |b| {
        b.iter(|| {
            let mut cache = Cache::new(lru_writeback_config(), 1024);
            for i in 0..4096u64 {
                cache.access(black_box(i * 64), AccessType::Read);
            }
            black_box(cache.counters());
        });
    });
    group.finish();
}

fn bench_looping_access(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache_access");
    group.throughput(Throughput::Elements(4096));
    group.bench_function("looping_mostly_hit", |b| {
        let addresses: Vec<u64> = (0..16).map(|i| i * 64).collect();
        b.iter(|| {
            let mut cache = Cache::new(lru_writeback_config(), 1024);
            for i in 0..4096usize {
                cache.access(black_box(addresses[i % addresses.len()]), AccessType::Write);
            }
            black_box(cache.counters());
        });
    });
    group.finish();
}

fn bench_undo(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache_undo");
    group.throughput(Throughput::Elements(1024));
    group.bench_function("unwind_full_stack", |b| {
        b.iter_batched(
            || {
                let mut cache = Cache::new(lru_writeback_config(), 1024);
                for i in 0..1024u64 {
                    cache.access(i * 64, AccessType::Write);
                }
                cache
            },
            |mut cache| {
                while cache.undo() {
                    black_box(());
                }
            },
            criterion::BatchSize::SmallInput,
        );
    });
    group.finish();
}

criterion_group!(benches, bench_streaming_access, bench_looping_access, bench_undo);
criterion_main!(benches);
