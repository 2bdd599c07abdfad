//! RandomX Criterion Benchmark
//!
//! Measures each stage a hash depends on, from program generation up to the
//! full light-mode hash.

#![allow(clippy::pedantic, clippy::nursery)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use rand::prelude::*;
use randomx::superscalar::SuperscalarProgram;
use randomx::{Blake2Generator, Cache, Mode, RandomX};
use rayon::prelude::*;
use std::hint::black_box;
use std::sync::OnceLock;

const KEY: &[u8] = b"benchmark key";

fn cache() -> &'static Cache {
    static CACHE: OnceLock<Cache> = OnceLock::new();
    CACHE.get_or_init(|| Cache::new(KEY).expect("cache"))
}

fn handle() -> &'static RandomX {
    static HANDLE: OnceLock<RandomX> = OnceLock::new();
    HANDLE.get_or_init(|| RandomX::new(KEY, Mode::Light).expect("handle"))
}

fn random_templates(count: usize) -> Vec<Vec<u8>> {
    let mut rng = rand::rng();
    (0..count)
        .map(|_| {
            let mut blob = vec![0u8; 76];
            rng.fill(&mut blob[..]);
            blob
        })
        .collect()
}

// =============================================================================
// BENCHMARK 1: KEY SETUP
// =============================================================================

/// Superscalar program generation (eight per key).
fn bench_superscalar(c: &mut Criterion) {
    let mut group = c.benchmark_group("1-Superscalar");
    let mut nonce = 0u32;

    group.bench_function("generate", |b| {
        b.iter(|| {
            nonce = nonce.wrapping_add(1);
            let mut gen = Blake2Generator::new(black_box(KEY), nonce);
            SuperscalarProgram::generate(&mut gen)
        });
    });

    let program = &cache().programs()[0];
    let reciprocals = cache().reciprocals();
    group.bench_function("execute", |b| {
        let mut r = [1u64; 8];
        b.iter(|| program.execute(black_box(&mut r), reciprocals));
    });
    group.finish();
}

/// Argon2d fill of the 256 MiB cache.
fn bench_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("2-Cache");
    group.sample_size(10);
    group.throughput(Throughput::Bytes(256 * 1024 * 1024));
    group.bench_function("init 256 MiB", |b| {
        b.iter(|| Cache::new(black_box(KEY)).expect("cache"));
    });
    group.finish();
}

// =============================================================================
// BENCHMARK 2: DATASET
// =============================================================================

/// One dataset item, as computed per VM iteration in light mode.
fn bench_dataset_item(c: &mut Criterion) {
    let mut group = c.benchmark_group("3-Dataset");
    let cache = cache();
    let mut index = 0u64;

    group.throughput(Throughput::Bytes(64));
    group.bench_function("item", |b| {
        b.iter(|| {
            index = (index + 7919) % 34_078_719;
            cache.dataset_item(black_box(index))
        });
    });
    group.finish();
}

// =============================================================================
// BENCHMARK 3: HASHING
// =============================================================================

/// Full light-mode hash, serial and across all cores.
fn bench_hash(c: &mut Criterion) {
    let mut group = c.benchmark_group("4-Hash");
    group.sample_size(10);
    let rx = handle();

    let templates = random_templates(1);
    group.throughput(Throughput::Elements(1));
    group.bench_function("light - single", |b| {
        b.iter(|| rx.hash(black_box(&templates[0])));
    });

    let batch = random_templates(rayon::current_num_threads() * 2);
    group.throughput(Throughput::Elements(batch.len() as u64));
    group.bench_function("light - all cores", |b| {
        b.iter(|| {
            batch
                .par_iter()
                .map(|blob| rx.hash(blob))
                .collect::<Vec<_>>()
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_superscalar,
    bench_cache,
    bench_dataset_item,
    bench_hash
);
criterion_main!(benches);
