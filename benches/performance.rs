use chunkdeque::ChunkedDeque;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn bench_push_back(c: &mut Criterion) {
    let mut group = c.benchmark_group("push_back");

    for size in [100, 1000, 10000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("u64", size), size, |b, &size| {
            b.iter(|| {
                let mut deque: ChunkedDeque<u64> = ChunkedDeque::new();
                for i in 0..size {
                    deque.push_back(i as u64);
                }
                black_box(deque.len())
            });
        });
    }
    group.finish();
}

fn bench_push_front(c: &mut Criterion) {
    let mut group = c.benchmark_group("push_front");

    for size in [100, 1000, 10000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("u64", size), size, |b, &size| {
            b.iter(|| {
                let mut deque: ChunkedDeque<u64> = ChunkedDeque::new();
                for i in 0..size {
                    deque.push_front(i as u64);
                }
                black_box(deque.len())
            });
        });
    }
    group.finish();
}

fn bench_chunk_capacity(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunk_capacity");
    let size = 10000;
    group.throughput(Throughput::Elements(size as u64));

    group.bench_function("k_4", |b| {
        b.iter(|| {
            let deque: ChunkedDeque<u64, 4> = (0..size).collect();
            black_box(deque.chunk_count())
        });
    });
    group.bench_function("k_16", |b| {
        b.iter(|| {
            let deque: ChunkedDeque<u64, 16> = (0..size).collect();
            black_box(deque.chunk_count())
        });
    });
    group.bench_function("k_256", |b| {
        b.iter(|| {
            let deque: ChunkedDeque<u64, 256> = (0..size).collect();
            black_box(deque.chunk_count())
        });
    });
    group.finish();
}

fn bench_random_access(c: &mut Criterion) {
    let mut group = c.benchmark_group("random_access");

    for size in [100, 1000, 10000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("index", size), size, |b, &size| {
            // Pre-populate from both ends so the head chunk is partial
            let mut deque: ChunkedDeque<u64> = ChunkedDeque::new();
            for i in 0..size {
                if i % 2 == 0 {
                    deque.push_back(i as u64);
                } else {
                    deque.push_front(i as u64);
                }
            }

            b.iter(|| {
                let mut index = 0;
                for _ in 0..size {
                    // Stride through the deque to defeat sequential prefetch
                    index = (index + 7919) % size;
                    black_box(deque[index]);
                }
            });
        });
    }
    group.finish();
}

fn bench_iterator_performance(c: &mut Criterion) {
    let mut group = c.benchmark_group("iterator");

    for size in [100, 1000, 10000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(
            BenchmarkId::new("full_iteration", size),
            size,
            |b, &size| {
                let deque: ChunkedDeque<u64> = (0..size as u64).collect();

                b.iter(|| {
                    for value in black_box(&deque) {
                        black_box(value);
                    }
                });
            },
        );
        group.bench_with_input(
            BenchmarkId::new("offset_walk", size),
            size,
            |b, &size| {
                let deque: ChunkedDeque<u64> = (0..size as u64).collect();

                b.iter(|| {
                    let end = deque.end();
                    let mut it = deque.begin();
                    while it < end {
                        black_box(it.get());
                        it += (end - it).min(3);
                    }
                });
            },
        );
    }
    group.finish();
}

fn bench_mixed_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixed_operations");

    for size in [1000, 10000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("queue", size), size, |b, &size| {
            b.iter(|| {
                let mut deque: ChunkedDeque<u64> = ChunkedDeque::new();
                let mut total = 0u64;
                for i in 0..size {
                    deque.push_back(i as u64);
                    if i % 3 == 0 {
                        deque.push_front(i as u64);
                    }
                    if i % 2 == 0 {
                        total += deque.pop_front().unwrap_or_default();
                    }
                }
                while let Some(value) = deque.pop_back() {
                    total += value;
                }
                black_box(total)
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_push_back,
    bench_push_front,
    bench_chunk_capacity,
    bench_random_access,
    bench_iterator_performance,
    bench_mixed_operations
);
criterion_main!(benches);
