//! Performance benchmarks for the hex codec.
//!
//! Dumping a 4K card renders 256 blocks, so the codec sits on the hot path
//! of every full read.
//!
//! Run benchmarks with:
//! ```sh
//! cargo bench --bench hex_bench
//! ```

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use tapdump_core::{bytes_to_hex_with, bytes_to_printable_ascii, hex_to_bytes};

/// Benchmark encoding blocks of increasing size.
fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("hex_encode");

    for size in [16usize, 1024, 4096] {
        let data: Vec<u8> = (0..size).map(|i| i as u8).collect();
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| bytes_to_hex_with(black_box(data), " "));
        });
    }

    group.finish();
}

/// Benchmark decoding a colon separated UID and a spaced block dump.
fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("hex_decode");

    group.bench_function("uid_7_bytes", |b| {
        b.iter(|| hex_to_bytes(black_box("04:A2:5F:11:22:33:44")).unwrap());
    });

    let block = "00 11 22 33 44 55 66 77 88 99 AA BB CC DD EE FF";
    group.bench_function("block_16_bytes", |b| {
        b.iter(|| hex_to_bytes(black_box(block)).unwrap());
    });

    group.finish();
}

/// Benchmark the printable ASCII column.
fn bench_ascii(c: &mut Criterion) {
    let data: Vec<u8> = (0..=255u8).collect();
    c.bench_function("printable_ascii_256", |b| {
        b.iter(|| bytes_to_printable_ascii(black_box(&data)));
    });
}

criterion_group!(benches, bench_encode, bench_decode, bench_ascii);
criterion_main!(benches);
