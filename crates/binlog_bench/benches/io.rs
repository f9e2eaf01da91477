//! Upload and download benchmarks against the in-memory store.

use binlog_bench::{bench_meta, random_insert_data};
use binlog_io::{
    make_key, Allocator, BinlogDownloader, BinlogIo, BinlogUploader, CancelSignal,
    LocalAllocator, LogType, TaskPool,
};
use binlog_storage::{InMemoryObjectStore, ObjectStore};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use tokio::runtime::Runtime;

const DIM: usize = 32;

fn service(pool_size: usize) -> BinlogIo {
    BinlogIo::new(
        Arc::new(InMemoryObjectStore::new("bench")) as Arc<dyn ObjectStore>,
        Arc::new(LocalAllocator::default()) as Arc<dyn Allocator>,
        TaskPool::new(pool_size),
    )
}

/// Benchmark insert log uploads for different pool sizes.
fn bench_upload_insert(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("upload_insert");
    let meta = bench_meta(DIM);
    let data = random_insert_data(2_000, DIM);
    let cancel = CancelSignal::new();

    for pool_size in [1, 4, 16].iter() {
        group.throughput(Throughput::Elements(2_000));
        group.bench_with_input(
            BenchmarkId::from_parameter(pool_size),
            pool_size,
            |b, &pool_size| {
                let io = service(pool_size);
                let mut segment = 0;

                b.iter(|| {
                    segment += 1;
                    let upload = io.upload_insert_log(&cancel, segment, 1, black_box(&data), &meta);
                    let logs = rt.block_on(upload).unwrap();
                    black_box(logs);
                });
            },
        );
    }

    group.finish();
}

/// Benchmark downloading a segment's insert logs.
fn bench_download(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("download");
    let meta = bench_meta(DIM);
    let cancel = CancelSignal::new();

    for pool_size in [1, 4, 16].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(pool_size),
            pool_size,
            |b, &pool_size| {
                let io = service(pool_size);
                let logs = rt
                    .block_on(io.upload_insert_log(
                        &cancel,
                        1,
                        1,
                        &random_insert_data(2_000, DIM),
                        &meta,
                    ))
                    .unwrap()
                    .unwrap();
                let paths: Vec<String> = logs
                    .values()
                    .map(|f| f.binlogs[0].log_path.clone())
                    .collect();

                b.iter(|| {
                    let blobs = rt.block_on(io.download(&cancel, black_box(&paths))).unwrap();
                    black_box(blobs);
                });
            },
        );
    }

    group.finish();
}

/// Benchmark key construction.
fn bench_make_key(c: &mut Criterion) {
    c.bench_function("make_key", |b| {
        let mut log_id = 0;
        b.iter(|| {
            log_id += 1;
            black_box(make_key(
                black_box("bench"),
                LogType::Insert,
                1,
                2,
                3,
                100,
                log_id,
            ))
        });
    });
}

criterion_group!(benches, bench_upload_insert, bench_download, bench_make_key);
criterion_main!(benches);
