use chash::IntLongHashMap;

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
};

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

fn num_threads() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

fn bench_single_thread_insertion(c: &mut Criterion) {
    let mut group = c.benchmark_group("chash: single threaded insertion");

    for &numel in [8, 64, 512, 4096, 32768].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(numel), &numel, |b, &numel| {
            let map = IntLongHashMap::new();

            for i in 0..numel {
                map.insert(i, i64::from(i));
            }

            b.iter(|| map.insert(criterion::black_box(numel + 1), i64::from(numel) + 1))
        });
    }

    group.finish();
}

fn bench_single_thread_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("chash: single threaded lookup");

    for &numel in [8, 64, 512, 4096, 32768].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(numel), &numel, |b, &numel| {
            let map: IntLongHashMap = (0..numel).map(|i| (i, i64::from(i))).collect();

            b.iter(|| map.get(criterion::black_box(numel / 2)))
        });
    }

    group.finish();
}

fn bench_multi_thread_insertion(c: &mut Criterion) {
    let num_threads = num_threads();

    let map = Arc::new(IntLongHashMap::new());
    let keep_going = Arc::new(AtomicBool::new(true));

    let threads: Vec<_> = (0..num_threads - 1)
        .map(|i| {
            let map = map.clone();
            let keep_going = keep_going.clone();

            thread::spawn(move || {
                while keep_going.load(Ordering::SeqCst) {
                    map.insert(criterion::black_box(i as i32), i as i64);
                }
            })
        })
        .collect();

    let key = num_threads as i32 + 1;

    c.bench_function("chash: multithreaded insertion", |b| {
        b.iter(|| map.insert(criterion::black_box(key), i64::from(key)))
    });

    keep_going.store(false, Ordering::SeqCst);

    let _: Vec<_> = threads.into_iter().map(|t| t.join()).collect();
}

fn bench_multi_thread_contended_insertion(c: &mut Criterion) {
    let num_threads = num_threads();

    let map = Arc::new(IntLongHashMap::new());
    let keep_going = Arc::new(AtomicBool::new(true));

    let threads: Vec<_> = (0..num_threads - 1)
        .map(|_| {
            let map = map.clone();
            let keep_going = keep_going.clone();

            thread::spawn(move || {
                while keep_going.load(Ordering::SeqCst) {
                    map.insert(criterion::black_box(0), 0);
                }
            })
        })
        .collect();

    c.bench_function("chash: contended multithreaded insertion", |b| {
        b.iter(|| map.insert(criterion::black_box(0), 0))
    });

    keep_going.store(false, Ordering::SeqCst);

    let _: Vec<_> = threads.into_iter().map(|t| t.join()).collect();
}

fn bench_read_mostly(c: &mut Criterion) {
    const NUM_KEYS: i32 = 4096;

    let num_threads = num_threads();

    let map: Arc<IntLongHashMap> = Arc::new((0..NUM_KEYS).map(|i| (i, i64::from(i))).collect());
    let keep_going = Arc::new(AtomicBool::new(true));

    // a single writer keeps one segment busy while the benchmark reads
    let writer = {
        let map = map.clone();
        let keep_going = keep_going.clone();

        thread::spawn(move || {
            while keep_going.load(Ordering::SeqCst) {
                map.insert(criterion::black_box(NUM_KEYS), 0);
                map.remove(criterion::black_box(NUM_KEYS));
            }
        })
    };

    let readers: Vec<_> = (0..num_threads.saturating_sub(2))
        .map(|i| {
            let map = map.clone();
            let keep_going = keep_going.clone();

            thread::spawn(move || {
                let mut key = i as i32;

                while keep_going.load(Ordering::SeqCst) {
                    criterion::black_box(map.get(key % NUM_KEYS));
                    key = key.wrapping_add(7);
                }
            })
        })
        .collect();

    c.bench_function("chash: read-mostly lookup", |b| {
        b.iter(|| map.get(criterion::black_box(NUM_KEYS / 2)))
    });

    keep_going.store(false, Ordering::SeqCst);

    let _ = writer.join();
    let _: Vec<_> = readers.into_iter().map(|t| t.join()).collect();
}

criterion_group!(
    benches,
    bench_single_thread_insertion,
    bench_single_thread_lookup,
    bench_multi_thread_insertion,
    bench_multi_thread_contended_insertion,
    bench_read_mostly,
);
criterion_main!(benches);
