//! Benchmarks for ripple-core
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ripple_core::{ComputedSignal, ComputedValue, Listenable, Signal};

// =============================================================================
// SIGNAL BENCHMARKS
// =============================================================================

fn bench_signal_get(c: &mut Criterion) {
    let s = Signal::new(42i32);
    c.bench_function("signal_get", |b| b.iter(|| black_box(s.get())));
}

fn bench_signal_set(c: &mut Criterion) {
    let s = Signal::new(0i32);
    let mut next = 0i32;
    c.bench_function("signal_set", |b| {
        b.iter(|| {
            next = next.wrapping_add(1);
            s.set(black_box(next))
        })
    });
}

fn bench_signal_set_same_value(c: &mut Criterion) {
    let s = Signal::new(42i32);
    c.bench_function("signal_set_same_value", |b| b.iter(|| s.set(black_box(42))));
}

fn bench_signal_set_from_value(c: &mut Criterion) {
    let s = Signal::new(0i32);
    c.bench_function("signal_set_from_value", |b| {
        b.iter(|| s.set_from_value(|v| black_box(v.wrapping_add(1))))
    });
}

// =============================================================================
// COMPUTED BENCHMARKS
// =============================================================================

fn bench_computed_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("computed_chain");

    for depth in [1usize, 10, 50] {
        let root = Signal::new(0i32);
        let mut tail = {
            let r = root.clone();
            ComputedSignal::new(move || r.get() + 1, &[&root]).unwrap()
        };
        for _ in 1..depth {
            let prev = tail.clone();
            tail = ComputedSignal::new(move || prev.get() + 1, &[&tail]).unwrap();
        }

        let mut next = 0i32;
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.iter(|| {
                next = next.wrapping_add(1);
                root.set(next);
                black_box(tail.get())
            })
        });
    }

    group.finish();
}

fn bench_computed_value_read(c: &mut Criterion) {
    let root = Signal::new(0i32);
    let r = root.clone();
    let lazy = ComputedValue::new(move || r.get() * 2, &[&root]).unwrap();

    c.bench_function("computed_value_read_clean", |b| b.iter(|| black_box(lazy.get())));
}

// =============================================================================
// DISPATCH BENCHMARKS
// =============================================================================

fn bench_sync_listeners(c: &mut Criterion) {
    let mut group = c.benchmark_group("sync_listeners");

    for count in [1usize, 10, 100] {
        let s = Signal::new(0i32);
        for _ in 0..count {
            s.listen(|v, _| {
                black_box(v);
            });
        }

        let mut next = 0i32;
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                next = next.wrapping_add(1);
                s.set(next)
            })
        });
    }

    group.finish();
}

fn bench_async_listeners(c: &mut Criterion) {
    let mut group = c.benchmark_group("async_listeners");

    for count in [1usize, 4, 16] {
        let s = Signal::new(0i32);
        for _ in 0..count {
            s.listen_async(|v, _| {
                black_box(v);
            });
        }

        let mut next = 0i32;
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                next = next.wrapping_add(1);
                s.set(next)
            })
        });
    }

    group.finish();
}

criterion_group!(
    signal_benches,
    bench_signal_get,
    bench_signal_set,
    bench_signal_set_same_value,
    bench_signal_set_from_value,
);

criterion_group!(computed_benches, bench_computed_chain, bench_computed_value_read);

criterion_group!(dispatch_benches, bench_sync_listeners, bench_async_listeners);

criterion_main!(signal_benches, computed_benches, dispatch_benches);
