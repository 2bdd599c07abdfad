//! Backend Comparison Benchmark
//!
//! Compares the AES-NI and portable kernels for the three AES generators a
//! hash runs: scratchpad fill, program generation and the fingerprint.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]
use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use randomx::{get_best_kernels, portable_kernels, AesKernels};
use std::hint::black_box;

const SCRATCHPAD: usize = 2 * 1024 * 1024;
const PROGRAM: usize = 2176;

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_kernels(c: &mut Criterion, name: &str, kernels: AesKernels) {
    let mut group = c.benchmark_group(format!("AES Generators ({name})"));
    let seed = [0x5Au8; 64];

    // 1. Scratchpad initialization, once per hash
    let mut scratchpad = vec![0u8; SCRATCHPAD];
    group.throughput(Throughput::Bytes(SCRATCHPAD as u64));
    group.bench_function("fill_1r - 2 MiB", |b| {
        b.iter(|| {
            let mut state = seed;
            (kernels.fill_1r)(&mut state, black_box(&mut scratchpad));
        });
    });

    // 2. Program generation, eight times per hash
    let mut program = vec![0u8; PROGRAM];
    group.throughput(Throughput::Bytes(PROGRAM as u64));
    group.bench_function("fill_4r - program", |b| {
        b.iter(|| (kernels.fill_4r)(black_box(&seed), &mut program));
    });

    // 3. Scratchpad fingerprint, once per hash
    group.throughput(Throughput::Bytes(SCRATCHPAD as u64));
    group.bench_function("hash_1r - 2 MiB", |b| {
        b.iter(|| (kernels.hash_1r)(black_box(&scratchpad)));
    });

    group.finish();
}

fn bench_backends(c: &mut Criterion) {
    // Hybrid (Production Path)
    bench_kernels(c, randomx::active_backend(), get_best_kernels());

    // Portable baseline, to quantify the hardware speedup
    if randomx::active_backend() != "Portable" {
        bench_kernels(c, "Portable", portable_kernels());
    }
}

criterion_group!(benches, bench_backends);
criterion_main!(benches);
