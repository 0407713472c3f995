//! Benchmarks for the HandleMap data structure

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use starling_core::alloc::handle_map::{Handle, HandleMap};

#[derive(Clone, Copy, Debug, Default)]
struct PrimitiveRecord {
    offset: u32,
    len: u32,
    mode: u32,
}

fn bench_handle_map_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("handle_map_insert");

    for size in [10, 100, 1000, 10000] {
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let mut map = HandleMap::new();
                for _ in 0..size {
                    map.insert(black_box(PrimitiveRecord::default()));
                }
                map
            });
        });
    }

    group.finish();
}

fn bench_handle_map_access(c: &mut Criterion) {
    let mut group = c.benchmark_group("handle_map_access");

    for size in [100, 1000, 10000] {
        group.throughput(Throughput::Elements(size as u64));

        let mut map = HandleMap::new();
        let handles: Vec<Handle> = (0..size)
            .map(|i| {
                map.insert(PrimitiveRecord {
                    offset: i,
                    len: 4,
                    mode: 0,
                })
            })
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let mut sum = 0u64;
                for &handle in &handles {
                    let record = map.get(handle).unwrap();
                    sum += (record.offset + record.len + record.mode) as u64;
                }
                black_box(sum)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_handle_map_insert, bench_handle_map_access);
criterion_main!(benches);
